use serde::{Deserialize, Serialize};

/// A declared edge: `task_id` must not start before `dependency_id` finishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDependency {
    pub task_id: String,
    pub dependency_id: String,
}
