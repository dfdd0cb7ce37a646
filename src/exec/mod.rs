// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running task commands, using
//! `tokio::process::Command`, and reflecting what happens into the shared
//! task registry.
//!
//! - [`task_runner`] is the per-task worker: spawn, stream stdout into the
//!   record and the log, wait, finalize.
//! - [`progress`] holds the line-count progress heuristic.
//! - [`observer`] provides the optional push notification path alongside
//!   polling.

pub mod observer;
pub mod progress;
pub mod task_runner;

pub use observer::{Observer, TaskUpdate, channel_observer, observer_fn};
pub use progress::ProgressPolicy;
pub use task_runner::{WorkerContext, run_task};
