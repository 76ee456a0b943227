pub mod dependents;

pub use dependents::{build_dependents, transitive_dependents, DependentsMap};
