use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Two tasks of different trades scheduled over intersecting windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapFinding {
    pub task1_id: String,
    pub task2_id: String,
    pub trade1_name: String,
    pub trade2_name: String,
    pub overlap_start: NaiveDate,
    pub overlap_end: NaiveDate,
    pub overlap_days: i64,
}

/// A task planned to start before one of its declared prerequisites ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyConflict {
    pub task_id: String,
    pub dependency_id: String,
    pub conflict_days: i64,
}

/// Heuristic suggestion: tasks ending shortly before `task_id` starts that
/// might be unstated prerequisites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingDependencyCandidate {
    pub task_id: String,
    pub candidate_predecessor_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConfirmedFinding {
    Overlap(OverlapFinding),
    DependencyConflict(DependencyConflict),
}

/// Every finding is either a validated problem or an advisory suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "finding", rename_all = "snake_case")]
pub enum Finding {
    Confirmed(ConfirmedFinding),
    Candidate(MissingDependencyCandidate),
}

impl Finding {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }
}

/// Output of one analysis run over a task set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Findings {
    pub overlaps: Vec<OverlapFinding>,
    pub conflicts: Vec<DependencyConflict>,
    pub missing_dependencies: Vec<MissingDependencyCandidate>,
}

impl Findings {
    pub fn confirmed_count(&self) -> usize {
        self.overlaps.len() + self.conflicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.confirmed_count() == 0 && self.missing_dependencies.is_empty()
    }

    /// Flattens the three lists into tagged findings, confirmed first.
    pub fn tagged(&self) -> Vec<Finding> {
        let overlaps = self
            .overlaps
            .iter()
            .cloned()
            .map(|o| Finding::Confirmed(ConfirmedFinding::Overlap(o)));
        let conflicts = self
            .conflicts
            .iter()
            .cloned()
            .map(|c| Finding::Confirmed(ConfirmedFinding::DependencyConflict(c)));
        let candidates = self
            .missing_dependencies
            .iter()
            .cloned()
            .map(Finding::Candidate);
        overlaps.chain(conflicts).chain(candidates).collect()
    }
}
