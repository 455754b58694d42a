pub mod item;

pub use item::{Dependency, DependencyKind, ParseEnumError, Status, WorkItem};
