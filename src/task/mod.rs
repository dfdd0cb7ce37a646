// src/task/mod.rs

//! Task records and the registry that owns them.
//!
//! - [`record`] defines the `Task` record, its command and the guarded
//!   state transitions the worker applies.
//! - [`registry`] is the single lock-protected store mapping task ids to
//!   records. Readers always receive owned clones (snapshots).

pub mod record;
pub mod registry;

pub use crate::types::{TaskId, TaskStatus};
pub use record::{Task, TaskCommand};
pub use registry::TaskRegistry;
