//! Stowage planner CLI

use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use stowage::core::MemoryLog;
use stowage::lifecycle::UsageManifest;
use stowage::Item;
use stowage_cli::commands::{self, Horizon, Outcome, Session};
use stowage_cli::{load_config, logger, parse_file, CliError, SnapshotFile};

#[derive(Parser)]
#[command(name = "stowctl")]
#[command(about = "Plan placement, retrieval and disposal of stowed cargo")]
#[command(version)]
struct Cli {
    /// Snapshot file (JSON)
    #[arg(short, long, global = true, default_value = "snapshot.json")]
    snapshot: PathBuf,

    /// Planner configuration (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Current date; defaults to the snapshot's date, then today
    #[arg(long, global = true)]
    date: Option<NaiveDate>,

    /// Commit the result back to the snapshot file
    #[arg(short, long, global = true)]
    write: bool,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan positions for new items
    Place {
        /// JSON file holding an array of items
        items: PathBuf,
    },

    /// Plan the retrieval of an item
    Retrieve {
        /// Item id or name
        query: String,
    },

    /// Locate an item by id or name
    Search {
        /// Item id or name
        query: String,
    },

    /// Move lower-priority items to make room for an item
    Rearrange(RearrangeArgs),

    /// Waste classification, return and undocking
    #[command(subcommand)]
    Waste(WasteCommands),

    /// Simulate days of usage and expiry
    Simulate {
        /// Number of days
        #[arg(short, long, conflicts_with = "until")]
        days: Option<u32>,

        /// Simulate up to this date
        #[arg(short, long)]
        until: Option<NaiveDate>,

        /// JSON usage manifest
        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RearrangeArgs {
    /// Id of an item already in the snapshot
    #[arg(required_unless_present = "item_file")]
    item_id: Option<String>,

    /// JSON file holding a new item
    #[arg(long, conflicts_with = "item_id")]
    item_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum WasteCommands {
    /// Classify expired and depleted items
    Identify,

    /// Select waste items for return within capacity bounds
    ReturnPlan {
        /// Maximum total volume
        #[arg(long)]
        max_volume: f64,

        /// Maximum total mass
        #[arg(long)]
        max_mass: f64,

        /// Items that must be returned
        #[arg(long = "force", value_name = "ITEM_ID")]
        forced: Vec<String>,
    },

    /// Plan and complete the undocking of a container
    Undock {
        /// Container leaving the station
        #[arg(long)]
        container: String,

        /// Maximum total mass
        #[arg(long)]
        max_mass: f64,
    },
}

fn run(cli: &Cli, session: &Session) -> Result<Outcome, CliError> {
    let now = Utc::now();
    match &cli.command {
        Commands::Place { items } => {
            let items: Vec<Item> = parse_file(items)?;
            commands::place(session, &items, now)
        }
        Commands::Retrieve { query } => commands::retrieve(session, query, now),
        Commands::Search { query } => commands::search(session, query),
        Commands::Rearrange(args) => {
            let item = match (&args.item_id, &args.item_file) {
                (_, Some(path)) => parse_file::<Item>(path)?,
                (Some(id), None) => session.snapshot.require_item(id)?.clone(),
                (None, None) => {
                    return Err(CliError::InvalidArgs(
                        "either an item id or --item-file is required".into(),
                    ))
                }
            };
            commands::rearrange(session, &item, now)
        }
        Commands::Waste(WasteCommands::Identify) => commands::identify_waste(session),
        Commands::Waste(WasteCommands::ReturnPlan {
            max_volume,
            max_mass,
            forced,
        }) => commands::return_plan(session, *max_volume, *max_mass, forced),
        Commands::Waste(WasteCommands::Undock {
            container,
            max_mass,
        }) => commands::undock(session, container, *max_mass, now),
        Commands::Simulate {
            days,
            until,
            manifest,
        } => {
            let horizon = match (days, until) {
                (_, Some(date)) => Horizon::Until(*date),
                (Some(days), None) => Horizon::Days(*days),
                (None, None) => Horizon::Days(1),
            };
            let manifest: UsageManifest = match manifest {
                Some(path) => parse_file(path)?,
                None => UsageManifest::new(),
            };
            commands::simulate(session, horizon, &manifest)
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let file = SnapshotFile::load(&cli.snapshot)?;
    let session = Session::new(&file, config, cli.date)?;
    tracing::debug!(
        "loaded {} containers and {} items from {}",
        file.containers.len(),
        file.items.len(),
        cli.snapshot.display()
    );

    let outcome = run(&cli, &session)?;

    if cli.write {
        let audit = MemoryLog::new();
        commands::commit(&session, &outcome, &cli.snapshot, &audit)?;
        tracing::info!("{} audit entries recorded", audit.len());
    } else if !outcome.mutations.is_empty() {
        tracing::info!(
            "{} pending mutations; rerun with --write to commit",
            outcome.mutations.len()
        );
    }

    println!("{}", serde_json::to_string_pretty(&outcome.into_report())?);
    Ok(())
}
