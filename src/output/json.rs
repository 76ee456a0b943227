use serde::Serialize;
use serde_json::{json, Value};

use crate::error::CoordError;
use crate::models::{IngestReport, Project, Task, Trade};

pub fn success(data: Value) -> Value {
    json!({
        "success": true,
        "data": data
    })
}

pub fn error(err: &CoordError) -> Value {
    json!({
        "success": false,
        "error": {
            "code": err.code.as_str(),
            "message": err.message
        }
    })
}

/// Serialize a model; our models only hold strings, numbers and dates.
pub fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

pub fn project_json(p: &Project) -> Value {
    json!({
        "id": p.id,
        "name": p.name,
        "description": p.description,
        "created_at": p.created_at,
        "updated_at": p.updated_at
    })
}

pub fn trade_json(t: &Trade) -> Value {
    json!({
        "id": t.id,
        "name": t.name
    })
}

pub fn task_summary(t: &Task, trade_name: Option<&str>) -> Value {
    let mut v = json!({
        "id": t.id,
        "name": t.display_name(),
        "status": t.status.as_str(),
        "planned_start": t.planned_start,
        "planned_end": t.planned_end
    });
    if let Some(name) = trade_name {
        v["trade"] = json!(name);
    }
    v
}

pub fn task_detail(t: &Task, trade: Option<&Trade>) -> Value {
    json!({
        "id": t.id,
        "name": t.name,
        "trade": trade.map(trade_json),
        "status": t.status.as_str(),
        "planned_start": t.planned_start,
        "planned_end": t.planned_end,
        "actual_start": t.actual_start,
        "actual_end": t.actual_end,
        "depends_on": t.depends_on
    })
}

pub fn skipped_json(report: &IngestReport) -> Value {
    json!({
        "count": report.skipped_count(),
        "records": to_value(&report.skipped)
    })
}
