//! Schedule coordination analyses over a [`TaskSet`].
//!
//! Every function here is a pure computation over the snapshot it is given:
//! no I/O, no shared state, and an unchanged snapshot always produces the same
//! findings in the same order.

pub mod conflict;
pub mod missing;
pub mod overlap;
pub mod report;

use tracing::debug;

use crate::models::{Findings, TaskSet};

pub use conflict::{detect_schedule_conflicts, downstream_impact};
pub use missing::{infer_missing_dependencies, DEFAULT_LOOKBACK_DAYS};
pub use overlap::{detect_trade_overlaps, overlap_window};
pub use report::assemble_report;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub lookback_days: i64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }
}

/// Run the three detectors over one project's snapshot.
pub fn analyze(set: &TaskSet, options: &AnalysisOptions) -> Findings {
    let findings = Findings {
        overlaps: detect_trade_overlaps(set),
        conflicts: detect_schedule_conflicts(set),
        missing_dependencies: infer_missing_dependencies(set, options.lookback_days),
    };
    debug!(
        project = set.project_name(),
        tasks = set.len(),
        skipped = set.ingest_report().skipped_count(),
        overlaps = findings.overlaps.len(),
        conflicts = findings.conflicts.len(),
        candidates = findings.missing_dependencies.len(),
        "analysis complete"
    );
    findings
}
