// =============================================================================
// Run reporting — per-instrument status and final summary
// =============================================================================

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::market_data::LoadReport;

/// Terminal state of one instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InstrumentStatus {
    /// Structured table written to `path`.
    Written { rows: usize, path: PathBuf },
    /// Not enough usable data; nothing written.
    Skipped { reason: String },
    /// Unexpected failure for this instrument only; nothing written.
    Failed { reason: String },
}

impl std::fmt::Display for InstrumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Written { rows, path } => write!(f, "written ({rows} rows) -> {}", path.display()),
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// Outcome for one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstrumentOutcome {
    pub asset: String,
    pub source: PathBuf,
    #[serde(flatten)]
    pub status: InstrumentStatus,
    /// Row accounting from the loader, when loading got that far.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<LoadReport>,
}

/// All outcomes of a run, in input-file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub outcomes: Vec<InstrumentOutcome>,
}

impl RunReport {
    pub fn push(&mut self, outcome: InstrumentOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn written(&self) -> usize {
        self.count(|s| matches!(s, InstrumentStatus::Written { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, InstrumentStatus::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, InstrumentStatus::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&InstrumentStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }

    /// Emit the final summary line.
    pub fn log_summary(&self) {
        info!(
            total = self.outcomes.len(),
            written = self.written(),
            skipped = self.skipped(),
            failed = self.failed(),
            "run complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(asset: &str, status: InstrumentStatus) -> InstrumentOutcome {
        InstrumentOutcome {
            asset: asset.to_string(),
            source: PathBuf::from(format!("data/{asset}.csv")),
            status,
            load: None,
        }
    }

    #[test]
    fn counts_by_status() {
        let mut report = RunReport::default();
        report.push(outcome(
            "A",
            InstrumentStatus::Written {
                rows: 10,
                path: PathBuf::from("out/A.csv"),
            },
        ));
        report.push(outcome("B", InstrumentStatus::Skipped { reason: "empty".into() }));
        report.push(outcome("C", InstrumentStatus::Skipped { reason: "short".into() }));
        report.push(outcome("D", InstrumentStatus::Failed { reason: "io".into() }));
        assert_eq!(report.written(), 1);
        assert_eq!(report.skipped(), 2);
        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn status_display() {
        let status = InstrumentStatus::Skipped {
            reason: "no usable rows".into(),
        };
        assert_eq!(status.to_string(), "skipped: no usable rows");
    }

    #[test]
    fn serialises_with_status_tag() {
        let json = serde_json::to_value(outcome("X", InstrumentStatus::Failed { reason: "boom".into() })).unwrap();
        assert_eq!(json["asset"], "X");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "boom");
        assert!(json.get("load").is_none());
    }

    #[test]
    fn serialises_load_accounting_when_present() {
        let mut written = outcome(
            "Y",
            InstrumentStatus::Written {
                rows: 3,
                path: PathBuf::from("out/Y.csv"),
            },
        );
        written.load = Some(LoadReport {
            rows_read: 10,
            malformed: 2,
            duplicates: 1,
        });
        let json = serde_json::to_value(&written).unwrap();
        assert_eq!(json["status"], "written");
        assert_eq!(json["rows"], 3);
        assert_eq!(json["load"]["rows_read"], 10);
        assert_eq!(json["load"]["malformed"], 2);
    }
}
