//! Run reports: the reconciled result of one executor run, plus CSV export.

use crate::error::Result;
use crate::outcome::{ActionKind, Outcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunState
// ---------------------------------------------------------------------------

/// Lifecycle of a run.
///
/// Transitions: `Idle → Connecting → Running → Completed | TimedOut | Cancelled`.
/// A failed connect goes straight from `Connecting` to `Completed` with a
/// diagnostic and no outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Connecting,
    Running,
    Completed,
    TimedOut,
    Cancelled,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::TimedOut | RunState::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Connecting => "connecting",
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::TimedOut => "timed_out",
            RunState::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ReportEntry / RunReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// The identifier as supplied by the caller.
    pub identifier: String,
    pub outcome: Outcome,
    pub recorded_at: DateTime<Utc>,
}

impl ReportEntry {
    /// `alice#1` for a removal, `carol (User not found)` for a failure.
    pub fn display(&self) -> String {
        match &self.outcome {
            Outcome::Removed(handle) => handle.clone(),
            other => format!(
                "{} ({})",
                self.identifier,
                other.reason().unwrap_or_default()
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub id: Uuid,
    pub action: ActionKind,
    pub state: RunState,
    /// Number of deduplicated identifiers handed to the run.
    pub total: usize,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    /// Top-level failure that stopped the run before any identifier was
    /// processed (e.g. could not connect).
    #[serde(default)]
    pub diagnostic: Option<String>,
    pub entries: Vec<ReportEntry>,
}

impl RunReport {
    pub fn new(action: ActionKind, total: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            state: RunState::Idle,
            total,
            started_at: Utc::now(),
            finished_at: None,
            diagnostic: None,
            entries: Vec::new(),
        }
    }

    /// Removed handles, in processing order.
    pub fn removed(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.outcome.is_success())
            .map(ReportEntry::display)
            .collect()
    }

    /// `identifier (reason)` strings, in processing order.
    pub fn failed(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| !e.outcome.is_success())
            .map(ReportEntry::display)
            .collect()
    }

    pub fn removed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.processed() - self.removed_count()
    }

    pub fn processed(&self) -> usize {
        self.entries.len()
    }

    pub fn summary(&self) -> String {
        if let Some(diag) = &self.diagnostic {
            return diag.clone();
        }
        let prefix = match self.state {
            RunState::Cancelled => "Process cancelled",
            RunState::TimedOut => "Process timed out",
            _ => "Process completed",
        };
        format!(
            "{prefix}. Removed: {}, Failed: {}",
            self.removed_count(),
            self.failed_count()
        )
    }

    /// Export as CSV with columns `Timestamp, Username, Status`, one row per
    /// processed identifier.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(["Timestamp", "Username", "Status"])?;
        for entry in &self.entries {
            let status = if entry.outcome.is_success() {
                "Success"
            } else {
                "Failed"
            };
            let ts = entry.recorded_at.format("%Y-%m-%d %H:%M:%S").to_string();
            wtr.write_record([ts.as_str(), entry.display().as_str(), status])?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(identifier: &str, outcome: Outcome) -> ReportEntry {
        ReportEntry {
            identifier: identifier.to_string(),
            outcome,
            recorded_at: Utc.with_ymd_and_hms(2025, 7, 14, 9, 30, 0).unwrap(),
        }
    }

    fn sample() -> RunReport {
        let mut report = RunReport::new(ActionKind::Kick, 3);
        report.state = RunState::Completed;
        report.entries = vec![
            entry("alice", Outcome::Removed("alice#1".into())),
            entry("BOB", Outcome::Removed("bob#2".into())),
            entry("carol", Outcome::NotFound),
        ];
        report
    }

    #[test]
    fn lists_and_counts() {
        let report = sample();
        assert_eq!(report.removed(), vec!["alice#1", "bob#2"]);
        assert_eq!(report.failed(), vec!["carol (User not found)"]);
        assert_eq!(report.removed_count(), 2);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.summary(), "Process completed. Removed: 2, Failed: 1");
    }

    #[test]
    fn diagnostic_overrides_summary() {
        let mut report = RunReport::new(ActionKind::Ban, 4);
        report.state = RunState::Completed;
        report.diagnostic = Some("could not connect: authentication rejected".into());
        assert!(report.summary().starts_with("could not connect"));
        assert_eq!(report.processed(), 0);
    }

    #[test]
    fn csv_export_has_one_row_per_entry() {
        let csv = sample().to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Timestamp,Username,Status");
        assert_eq!(lines[1], "2025-07-14 09:30:00,alice#1,Success");
        assert_eq!(lines[3], "2025-07-14 09:30:00,carol (User not found),Failed");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn csv_export_of_empty_report_is_header_only() {
        let csv = RunReport::new(ActionKind::Kick, 0).to_csv().unwrap();
        assert_eq!(csv.trim_end(), "Timestamp,Username,Status");
    }

    #[test]
    fn terminal_states() {
        assert!(RunState::Cancelled.is_terminal());
        assert!(RunState::TimedOut.is_terminal());
        assert!(!RunState::Running.is_terminal());
    }
}
