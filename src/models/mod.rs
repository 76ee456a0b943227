pub mod project;
pub mod task;
pub mod trade;
pub mod dependency;
pub mod finding;
pub mod report;
pub mod task_set;

pub use project::*;
pub use task::*;
pub use trade::*;
pub use dependency::*;
pub use finding::*;
pub use report::*;
pub use task_set::*;
