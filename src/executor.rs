// src/executor.rs

//! The task engine as one component instance.
//!
//! `TaskExecutor` owns the registry and the log store and exposes the five
//! engine operations: create, start, get one, get all, get logs. It is built
//! from injected options rather than living in a global, and is meant to be
//! shared behind an `Arc` by whatever front end drives it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::config::ConfigSection;
use crate::errors::{Result, ScriptexecError};
use crate::exec::{Observer, ProgressPolicy, WorkerContext, run_task};
use crate::logstore::{FileLogStore, LogStore};
use crate::task::{Task, TaskCommand, TaskRegistry};
use crate::types::TaskId;

/// Construction options for [`TaskExecutor`].
#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    pub logs_dir: PathBuf,
    /// Retention cap for finished tasks. `None` keeps everything.
    pub max_tasks: Option<usize>,
    pub progress: ProgressPolicy,
}

impl ExecutorOptions {
    pub fn new(logs_dir: impl Into<PathBuf>) -> Self {
        Self {
            logs_dir: logs_dir.into(),
            max_tasks: None,
            progress: ProgressPolicy::default(),
        }
    }

    pub fn from_config(config: &ConfigSection) -> Self {
        Self {
            logs_dir: config.logs_dir.clone(),
            max_tasks: Some(config.max_tasks),
            progress: ProgressPolicy::new(config.progress_step, config.progress_cap),
        }
    }
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self::new("logs")
    }
}

#[derive(Debug)]
pub struct TaskExecutor {
    registry: Arc<TaskRegistry>,
    logs: Arc<dyn LogStore>,
    progress: ProgressPolicy,
}

impl TaskExecutor {
    /// Executor writing logs to the local filesystem. Creates the logs
    /// directory if needed.
    pub fn new(options: ExecutorOptions) -> Result<Self> {
        Self::with_log_store(options, Arc::new(FileLogStore))
    }

    pub fn with_log_store(options: ExecutorOptions, logs: Arc<dyn LogStore>) -> Result<Self> {
        logs.prepare(&options.logs_dir)?;
        info!(logs_dir = ?options.logs_dir, max_tasks = ?options.max_tasks, "task executor ready");

        Ok(Self {
            registry: Arc::new(TaskRegistry::new(options.logs_dir, options.max_tasks)),
            logs,
            progress: options.progress,
        })
    }

    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    pub fn logs_dir(&self) -> &Path {
        self.registry.logs_dir()
    }

    pub fn progress_policy(&self) -> ProgressPolicy {
        self.progress
    }

    /// Record a new `pending` task. Nothing runs until [`start_task`].
    ///
    /// [`start_task`]: TaskExecutor::start_task
    pub fn create_task(
        &self,
        owner: &str,
        program: impl Into<PathBuf>,
        args: Vec<String>,
    ) -> TaskId {
        self.registry.create(owner, TaskCommand::new(program, args))
    }

    /// Move the task to `running` and hand it to a background worker.
    ///
    /// Returns as soon as the worker is spawned. Errors only for an unknown
    /// id or a task that was already started; everything that goes wrong
    /// during execution ends up in the task record instead.
    ///
    /// Must be called from within a Tokio runtime; outside one it returns
    /// `Launch` and the task stays `pending`.
    pub fn start_task(&self, task_id: &str, observer: Option<Observer>) -> Result<()> {
        let runtime = Handle::try_current()
            .map_err(|e| ScriptexecError::Launch(format!("cannot start task '{task_id}': {e}")))?;

        let started = self
            .registry
            .mutate(task_id, |task| task.mark_running())
            .ok_or_else(|| ScriptexecError::TaskNotFound(task_id.to_string()))?;

        if !started {
            return Err(ScriptexecError::AlreadyStarted(task_id.to_string()));
        }

        debug!(task_id = %task_id, "spawning task worker");

        let ctx = WorkerContext {
            registry: Arc::clone(&self.registry),
            logs: Arc::clone(&self.logs),
            progress: self.progress,
        };
        runtime.spawn(run_task(ctx, task_id.to_string(), observer));
        Ok(())
    }

    pub fn get_task(&self, task_id: &str) -> Option<Task> {
        self.registry.get(task_id)
    }

    pub fn get_all_tasks(&self) -> Vec<Task> {
        self.registry.get_all()
    }

    /// Full durable log of a task; empty if nothing has been written yet.
    pub fn get_task_logs(&self, task_id: &str) -> Result<String> {
        let task = self
            .registry
            .get(task_id)
            .ok_or_else(|| ScriptexecError::TaskNotFound(task_id.to_string()))?;
        Ok(self.logs.read_to_string(&task.log_path)?)
    }
}
