use crate::identifier::Identifier;
use crate::outcome::{ActionKind, Outcome};
use crate::report::{ReportEntry, RunReport, RunState};
use chrono::Utc;
use std::collections::HashSet;
use tokio::sync::watch;
use tracing::warn;

/// Single-writer accumulator for one run.
///
/// Every mutation republishes a value copy of the report on a watch channel,
/// so observers on other tasks only ever see snapshots and never the live
/// state.
pub struct Aggregator {
    report: RunReport,
    seen: HashSet<String>,
    tx: watch::Sender<RunReport>,
}

impl Aggregator {
    pub fn new(action: ActionKind, total: usize) -> Self {
        let report = RunReport::new(action, total);
        let (tx, _) = watch::channel(report.clone());
        Self {
            report,
            seen: HashSet::new(),
            tx,
        }
    }

    /// Observer handle. Receivers may be created at any point of the run.
    pub fn subscribe(&self) -> watch::Receiver<RunReport> {
        self.tx.subscribe()
    }

    /// Append an outcome. Returns `false` and leaves the report untouched if
    /// the identifier was already recorded in this run.
    pub fn record(&mut self, identifier: &Identifier, outcome: Outcome) -> bool {
        if !self.seen.insert(identifier.folded().to_string()) {
            warn!(identifier = %identifier, "outcome already recorded; ignoring duplicate");
            return false;
        }
        self.report.entries.push(ReportEntry {
            identifier: identifier.as_str().to_string(),
            outcome,
            recorded_at: Utc::now(),
        });
        self.publish();
        true
    }

    pub fn set_state(&mut self, state: RunState) {
        self.report.state = state;
        self.publish();
    }

    pub fn set_diagnostic(&mut self, diagnostic: impl Into<String>) {
        self.report.diagnostic = Some(diagnostic.into());
        self.publish();
    }

    /// Value copy of the report as recorded so far.
    pub fn snapshot(&self) -> RunReport {
        self.report.clone()
    }

    /// Seal the report with its terminal state.
    pub fn finish(&mut self, state: RunState) -> RunReport {
        self.report.state = state;
        self.report.finished_at = Some(Utc::now());
        self.publish();
        self.report.clone()
    }

    fn publish(&self) {
        self.tx.send_replace(self.report.clone());
    }
}
