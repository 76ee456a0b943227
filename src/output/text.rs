use std::collections::BTreeMap;

use crate::analysis::report::DISPLAY_DATE_FORMAT;
use crate::models::{
    ConfirmedFinding, CoordinationReport, Finding, Findings, IngestReport, Project, Task, Trade,
};

fn short(id: &str) -> &str {
    id.char_indices().nth(8).map_or(id, |(i, _)| &id[..i])
}

fn fmt_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.format(DISPLAY_DATE_FORMAT).to_string())
        .unwrap_or_else(|| "?".to_string())
}

pub fn print_project(p: &Project) {
    println!("Project: {} ({})", p.name, p.id);
    if let Some(ref desc) = p.description {
        println!("  Description: {desc}");
    }
    println!("  Created: {}", p.created_at);
}

pub fn print_project_list(projects: &[Project], active_id: Option<&str>) {
    if projects.is_empty() {
        println!("No projects found.");
        return;
    }
    for p in projects {
        let marker = if Some(p.id.as_str()) == active_id { " *" } else { "" };
        println!("  {} ({}){}", p.name, short(&p.id), marker);
    }
}

pub fn print_trade_list(trades: &[Trade]) {
    if trades.is_empty() {
        println!("No trades found.");
        return;
    }
    for t in trades {
        println!("  {} ({})", t.name, short(&t.id));
    }
}

pub fn print_task(t: &Task, trade: Option<&Trade>) {
    println!("Task: {} ({})", t.display_name(), t.id);
    if let Some(trade) = trade {
        println!("  Trade: {}", trade.name);
    }
    println!("  Status: {}", t.status.as_str());
    println!(
        "  Planned: {} → {}",
        fmt_date(t.planned_start),
        fmt_date(t.planned_end)
    );
    if t.actual_start.is_some() || t.actual_end.is_some() {
        println!(
            "  Actual: {} → {}",
            fmt_date(t.actual_start),
            fmt_date(t.actual_end)
        );
    }
}

pub fn print_task_list(tasks: &[Task], trade_names: &BTreeMap<String, String>) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }
    for t in tasks {
        let trade = t
            .trade_id
            .as_ref()
            .and_then(|id| trade_names.get(id))
            .map(|n| format!(" @{n}"))
            .unwrap_or_default();
        println!(
            "  [{}] {} ({}) {} → {}{}",
            t.status.as_str(),
            t.display_name(),
            short(&t.id),
            fmt_date(t.planned_start),
            fmt_date(t.planned_end),
            trade
        );
    }
}

pub fn print_skipped(report: &IngestReport) {
    if report.skipped.is_empty() {
        return;
    }
    println!(
        "Skipped {} record(s), {} of them tasks:",
        report.skipped_count(),
        report.skipped_tasks()
    );
    for s in &report.skipped {
        println!(
            "  {:?} #{} {}: {}",
            s.kind,
            s.position,
            s.id.as_deref().unwrap_or("-"),
            s.reason
        );
    }
}

pub fn print_findings(findings: &Findings, impact: &BTreeMap<String, Vec<String>>) {
    if findings.is_empty() {
        println!("No coordination issues found.");
        return;
    }
    for finding in findings.tagged() {
        match finding {
            Finding::Confirmed(ConfirmedFinding::Overlap(o)) => println!(
                "  [OVERLAP] {} ({}) / {} ({}): {} → {}, {} day(s)",
                o.task1_id,
                o.trade1_name,
                o.task2_id,
                o.trade2_name,
                o.overlap_start.format(DISPLAY_DATE_FORMAT),
                o.overlap_end.format(DISPLAY_DATE_FORMAT),
                o.overlap_days
            ),
            Finding::Confirmed(ConfirmedFinding::DependencyConflict(c)) => {
                println!(
                    "  [CONFLICT] {} starts {} day(s) before {} ends",
                    c.task_id, c.conflict_days, c.dependency_id
                );
                if let Some(downstream) = impact.get(&c.task_id).filter(|d| !d.is_empty()) {
                    println!("             also affects: {}", downstream.join(", "));
                }
            }
            Finding::Candidate(m) => println!(
                "  [SUGGESTION] {} may depend on: {}",
                m.task_id,
                m.candidate_predecessor_ids.join(", ")
            ),
        }
    }
}

pub fn print_report(report: &CoordinationReport) {
    println!(
        "Coordination report: {} ({})",
        report.project_name,
        report.generated_date.format(DISPLAY_DATE_FORMAT)
    );
    println!(
        "  total={} completed={} in_progress={} planned={} delayed={}",
        report.total_tasks,
        report.completed_tasks,
        report.in_progress_tasks,
        report.planned_tasks,
        report.delayed_tasks
    );
    if report.skipped_records > 0 {
        println!("  skipped records: {}", report.skipped_records);
    }
    for (trade, tasks) in &report.tasks_by_trade {
        println!("\n{trade}:");
        for t in tasks {
            println!(
                "  [{}] {} ({}) {} → {}",
                t.status,
                t.name,
                t.id,
                t.planned_start.as_deref().unwrap_or("?"),
                t.planned_end.as_deref().unwrap_or("?")
            );
        }
    }
    if let Some(ref findings) = report.findings {
        println!("\nFindings:");
        print_findings(findings, &BTreeMap::new());
    }
}
