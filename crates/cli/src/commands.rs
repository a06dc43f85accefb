//! Subcommand implementations.
//!
//! Each command runs one planner against the session snapshot and returns
//! an [`Outcome`]: a JSON report for stdout, the mutations that would
//! commit the result, and the audit entries describing it.

use crate::parser::{CliError, SnapshotFile};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};
use std::path::Path;
use stowage::core::{
    Auditable, Clock, CommitBatch, CommitSink, FixedClock, ItemStore, LogEntry, LogSink,
    MemoryLog, MemoryStore,
};
use stowage::lifecycle::{record_use, UsageManifest};
use stowage::planner::{placement_mutations, PlacementBatch};
use stowage::{
    Config, DaySimulator, Item, ItemStatus, Mutation, PlacementPlanner, RearrangementPlanner,
    RetrievalPlanner, Snapshot, WasteManager,
};

/// Loaded state shared by every command.
pub struct Session {
    /// Planner configuration.
    pub config: Config,
    /// Validated snapshot.
    pub snapshot: Snapshot,
    /// Source of the simulated date.
    pub clock: FixedClock,
}

impl Session {
    /// Builds a session from parsed inputs. The date comes from `date`, then
    /// the file, then the system clock.
    pub fn new(file: &SnapshotFile, config: Config, date: Option<NaiveDate>) -> Result<Self, CliError> {
        let today = date
            .or(file.current_date)
            .unwrap_or_else(|| Utc::now().date_naive());
        Ok(Self {
            config,
            snapshot: file.to_snapshot()?,
            clock: FixedClock(today),
        })
    }

    fn user_id(&self) -> Option<&str> {
        self.config.user_id.as_deref()
    }
}

/// Result of one command.
#[derive(Debug)]
pub struct Outcome {
    /// JSON report printed to stdout.
    pub report: Value,
    /// Mutations committed with `--write`.
    pub mutations: Vec<Mutation>,
    /// Audit entries for the action.
    pub log: Vec<LogEntry>,
    /// Date to store with the snapshot.
    pub current_date: NaiveDate,
}

impl Outcome {
    fn new(session: &Session, report: Value) -> Self {
        Self {
            report,
            mutations: Vec::new(),
            log: Vec::new(),
            current_date: session.clock.today(),
        }
    }

    fn with_mutations(mut self, mutations: Vec<Mutation>) -> Self {
        self.mutations = mutations;
        self
    }

    fn with_log(mut self, log: Vec<LogEntry>) -> Self {
        self.log = log;
        self
    }

    /// Report with the audit entries attached.
    pub fn into_report(self) -> Value {
        let mut report = self.report;
        if let Value::Object(map) = &mut report {
            map.insert("log".into(), json!(self.log));
        }
        report
    }
}

/// Plans placements for new or existing items.
pub fn place(session: &Session, items: &[Item], now: DateTime<Utc>) -> Result<Outcome, CliError> {
    let planner = PlacementPlanner::new(session.config.clone());
    let results = planner.plan_snapshot(items, &session.snapshot)?;

    let mut mutations = Vec::new();
    for (item, result) in items.iter().zip(&results) {
        if session.snapshot.item(item.id()).is_none() {
            let mut new_item = item.clone();
            if let Some(placement) = result.placement() {
                new_item = new_item.with_placement(placement.clone());
            }
            mutations.push(Mutation::Insert { item: new_item });
        }
    }
    mutations.extend(
        placement_mutations(&results)
            .into_iter()
            .filter(|m| session.snapshot.item(m.item_id()).is_some()),
    );

    let log = PlacementBatch(&results).log_entries(now, session.user_id());
    Ok(Outcome::new(session, json!({ "placements": results }))
        .with_mutations(mutations)
        .with_log(log))
}

/// Plans a retrieval. Committing it also records one use of a stowed target.
pub fn retrieve(session: &Session, query: &str, now: DateTime<Utc>) -> Result<Outcome, CliError> {
    let planner = RetrievalPlanner::new(session.config.clone());
    let plan = planner.find(query, &session.snapshot)?;
    let target = session.snapshot.require_item(&plan.item_id)?;

    let mut mutations = plan.mutations();
    let mut usage = None;
    if target.status() == ItemStatus::Stowed {
        let outcome = record_use(target, 1, session.clock.today())?;
        mutations.extend(outcome.mutations());
        usage = Some(outcome);
    }

    let log = plan.log_entries(now, session.user_id());
    Ok(
        Outcome::new(session, json!({ "retrieval": plan, "usage": usage }))
            .with_mutations(mutations)
            .with_log(log),
    )
}

/// Finds an item by id or name and reports where it is and what blocks it.
pub fn search(session: &Session, query: &str) -> Result<Outcome, CliError> {
    let planner = RetrievalPlanner::new(session.config.clone());
    let plan = planner.find(query, &session.snapshot)?;
    let item = session.snapshot.require_item(&plan.item_id)?;
    Ok(Outcome::new(
        session,
        json!({ "item": item, "retrieval_steps": plan.steps }),
    ))
}

/// Plans room for an item, moving lower-priority items if needed.
pub fn rearrange(session: &Session, item: &Item, now: DateTime<Utc>) -> Result<Outcome, CliError> {
    let planner = RearrangementPlanner::new(session.config.clone());
    match planner.plan(item, &session.snapshot)? {
        Some(plan) => {
            let mutations = plan.mutations(item, &session.snapshot);
            let log = plan.log_entries(now, session.user_id());
            Ok(Outcome::new(session, json!({ "rearrangement": plan }))
                .with_mutations(mutations)
                .with_log(log))
        }
        None => Ok(Outcome::new(
            session,
            json!({ "rearrangement": null, "item_id": item.id() }),
        )),
    }
}

/// Classifies waste as of the session date.
pub fn identify_waste(session: &Session) -> Result<Outcome, CliError> {
    let manager = WasteManager::new(session.config.clone());
    let today = session.clock.today();
    let classification = manager.classify(session.snapshot.items(), today);
    let transitions = manager.apply(&classification, &session.snapshot)?;
    let mutations = transitions.iter().map(|t| t.mutation()).collect();

    let waste: Vec<&Item> = session
        .snapshot
        .items()
        .filter(|i| {
            i.status().is_waste()
                || classification.expired.contains(i.id())
                || classification.depleted.contains(i.id())
        })
        .collect();

    Ok(Outcome::new(
        session,
        json!({ "classification": classification, "transitions": transitions, "waste": waste }),
    )
    .with_mutations(mutations))
}

/// Selects waste items for return within the bounds.
pub fn return_plan(
    session: &Session,
    max_volume: f64,
    max_mass: f64,
    forced: &[String],
) -> Result<Outcome, CliError> {
    let manager = WasteManager::new(session.config.clone());
    let waste: Vec<Item> = session
        .snapshot
        .items()
        .filter(|i| i.status().is_waste())
        .cloned()
        .collect();
    let plan = manager.build_return_plan_with(&waste, max_volume, max_mass, forced)?;
    Ok(Outcome::new(session, json!({ "return_plan": plan })))
}

/// Plans an undocking. Committing it disposes the selected items.
pub fn undock(
    session: &Session,
    container_id: &str,
    max_mass: f64,
    now: DateTime<Utc>,
) -> Result<Outcome, CliError> {
    let manager = WasteManager::new(session.config.clone());
    let plan = manager.plan_undocking(&session.snapshot, container_id, max_mass)?;
    let completion = manager.complete_undocking(&plan.return_plan.selected, &session.snapshot)?;

    let mut log: Vec<LogEntry> = plan
        .retrievals
        .iter()
        .flat_map(|r| r.log_entries(now, session.user_id()))
        .collect();
    log.extend(completion.log_entries(now, session.user_id()));

    Ok(Outcome::new(session, json!({ "undocking": plan }))
        .with_mutations(completion.mutations())
        .with_log(log))
}

/// How far to simulate.
#[derive(Debug, Clone, Copy)]
pub enum Horizon {
    /// A number of days.
    Days(u32),
    /// Up to a date.
    Until(NaiveDate),
}

/// Simulates days of usage and expiry.
pub fn simulate(
    session: &Session,
    horizon: Horizon,
    manifest: &UsageManifest,
) -> Result<Outcome, CliError> {
    let simulator = DaySimulator::new(session.config.clone());
    let today = session.clock.today();
    let result = match horizon {
        Horizon::Days(days) => simulator.advance(days, manifest, &session.snapshot, today)?,
        Horizon::Until(date) => simulator.advance_until(date, manifest, &session.snapshot, today)?,
    };

    let mut outcome = Outcome::new(session, json!({ "simulation": &result }))
        .with_mutations(result.mutations.clone())
        .with_log(result.log.clone());
    outcome.current_date = result.final_date;
    Ok(outcome)
}

/// Commits an outcome through an in-memory store and writes the new state
/// back to `path`. Audit entries are appended to `audit`.
pub fn commit(
    session: &Session,
    outcome: &Outcome,
    path: &Path,
    audit: &MemoryLog,
) -> Result<(), CliError> {
    let store = MemoryStore::new(session.snapshot.clone());
    store.commit(CommitBatch::against(&session.snapshot, outcome.mutations.clone()))?;
    audit.append(outcome.log.clone());

    let snapshot = store.snapshot()?;
    SnapshotFile::from_snapshot(&snapshot, Some(outcome.current_date)).save(path)?;
    tracing::info!(
        "committed {} mutations to {}",
        outcome.mutations.len(),
        path.display()
    );
    Ok(())
}
