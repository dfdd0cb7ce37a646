// src/task/record.rs

//! Task record and its state transitions.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{TaskId, TaskStatus};

/// Highest progress value a task can report before it reaches a terminal
/// state. 100 is reserved for completion.
pub const MAX_RUNNING_PROGRESS: u8 = 99;

/// Executable plus ordered argument list. Immutable once a task exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCommand {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
}

impl TaskCommand {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl fmt::Display for TaskCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// One script execution request and its tracked state.
///
/// Values handed out by the registry are owned clones, so a `Task` held by a
/// caller never changes underneath it. Mutation happens only through the
/// crate-private transition methods below, applied under the registry lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub owner: String,
    pub command: TaskCommand,
    pub status: TaskStatus,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub output: String,
    pub error: String,
    pub exit_code: Option<i32>,
    pub log_path: PathBuf,
}

impl Task {
    pub(crate) fn new(id: TaskId, owner: String, command: TaskCommand, log_path: PathBuf) -> Self {
        Self {
            id,
            owner,
            command,
            status: TaskStatus::Pending,
            progress: 0,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            output: String::new(),
            error: String::new(),
            exit_code: None,
            log_path,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Wall-clock run time: start to completion, or start to now while the
    /// task is still running. `None` until the task has started.
    pub fn duration(&self) -> Option<Duration> {
        let started = self.started_at?;
        let end = self.completed_at.unwrap_or_else(Utc::now);
        Some(end - started)
    }

    /// `Pending -> Running`. Returns false if the task was already started.
    pub(crate) fn mark_running(&mut self) -> bool {
        if !self.status.can_transition_to(TaskStatus::Running) {
            return false;
        }
        self.status = TaskStatus::Running;
        self.started_at = Some(Utc::now());
        true
    }

    /// Append one captured stdout line and raise progress.
    ///
    /// Progress never decreases and stays below 100 until completion.
    pub(crate) fn record_output(&mut self, line: &str, progress: u8) {
        if self.is_terminal() {
            return;
        }
        self.output.push_str(line);
        self.progress = self.progress.max(progress.min(MAX_RUNNING_PROGRESS));
    }

    /// Finalize from a process exit code. Zero means success; anything else
    /// fails the task with `stderr` as its error text.
    pub(crate) fn complete(&mut self, exit_code: i32, stderr: String) -> bool {
        let next = if exit_code == 0 {
            TaskStatus::Success
        } else {
            TaskStatus::Failed
        };
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.exit_code = Some(exit_code);
        if next == TaskStatus::Failed {
            self.error = stderr;
        }
        self.finish();
        true
    }

    /// Fail the task for a reason other than a process exit code.
    pub(crate) fn fail(&mut self, message: String) -> bool {
        if !self.status.can_transition_to(TaskStatus::Failed) {
            return false;
        }
        self.status = TaskStatus::Failed;
        self.error = message;
        self.finish();
        true
    }

    fn finish(&mut self) {
        self.progress = 100;
        self.completed_at = Some(Utc::now());
    }
}
