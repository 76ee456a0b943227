use std::collections::BTreeMap;

use tracing::debug;

use crate::models::{DateRange, OverlapFinding, Task, TaskSet};

/// Intersection of two tasks' planned ranges, if both are fully scheduled and
/// the ranges share at least one day. Symmetric in its arguments.
pub fn overlap_window(a: &Task, b: &Task) -> Option<DateRange> {
    a.planned_range()?.intersection(&b.planned_range()?)
}

/// Every pair of tasks from two different trades whose planned ranges
/// intersect.
///
/// Only tasks with a resolvable trade and both planned dates take part. Trade
/// pairs are visited in ascending trade-id order (the lower id is always
/// `trade1`), tasks within a trade in chronological order.
pub fn detect_trade_overlaps(set: &TaskSet) -> Vec<OverlapFinding> {
    let mut by_trade: BTreeMap<&str, Vec<&Task>> = BTreeMap::new();
    for task in set.tasks() {
        let Some(trade_id) = task.trade_id.as_deref() else {
            continue;
        };
        if set.trade(trade_id).is_none() {
            debug!(task = %task.id, trade = trade_id, "unknown trade, left out of overlap check");
            continue;
        }
        if task.planned_range().is_none() {
            continue;
        }
        by_trade.entry(trade_id).or_default().push(task);
    }

    let groups: Vec<(&str, Vec<&Task>)> = by_trade.into_iter().collect();
    let mut findings = Vec::new();

    for (i, (trade1, tasks1)) in groups.iter().enumerate() {
        for (trade2, tasks2) in &groups[i + 1..] {
            let trade1_name = trade_name(set, trade1);
            let trade2_name = trade_name(set, trade2);
            for a in tasks1 {
                for b in tasks2 {
                    if let Some(window) = overlap_window(a, b) {
                        findings.push(OverlapFinding {
                            task1_id: a.id.clone(),
                            task2_id: b.id.clone(),
                            trade1_name: trade1_name.clone(),
                            trade2_name: trade2_name.clone(),
                            overlap_start: window.start,
                            overlap_end: window.end,
                            overlap_days: window.inclusive_days(),
                        });
                    }
                }
            }
        }
    }

    debug!(count = findings.len(), trades = groups.len(), "trade overlap check done");
    findings
}

fn trade_name(set: &TaskSet, id: &str) -> String {
    set.trade(id).map(|t| t.name.clone()).unwrap_or_else(|| id.to_string())
}
