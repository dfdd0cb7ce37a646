// src/service.rs

//! Request boundary in front of the engine.
//!
//! A front end (the CLI here, an HTTP layer elsewhere) talks to
//! `ScriptService` instead of the executor directly. The service validates
//! submissions before any task exists, resolves named scripts from the
//! configured catalog and turns unknown ids into `TaskNotFound`.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{ConfigFile, ScriptConfig};
use crate::errors::{Result, ScriptexecError};
use crate::exec::Observer;
use crate::executor::{ExecutorOptions, TaskExecutor};
use crate::task::Task;

/// Catalog entry used when a request names neither a script nor an
/// executable.
pub const DEFAULT_SCRIPT: &str = "sample";

/// A request to run something.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// Free-text label of whoever asked. Required, not authenticated.
    pub owner: String,

    /// Name of a `[script.<name>]` catalog entry.
    #[serde(default)]
    pub script: Option<String>,

    /// Executable to run directly, bypassing the catalog.
    #[serde(default)]
    pub executable: Option<PathBuf>,

    #[serde(default)]
    pub args: Vec<String>,
}

impl SubmitRequest {
    pub fn script(owner: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            script: Some(script.into()),
            ..Self::default()
        }
    }

    pub fn executable(owner: impl Into<String>, executable: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            owner: owner.into(),
            executable: Some(executable.into()),
            args,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
pub struct ScriptService {
    executor: Arc<TaskExecutor>,
    catalog: BTreeMap<String, ScriptConfig>,
}

impl ScriptService {
    pub fn new(executor: Arc<TaskExecutor>, catalog: BTreeMap<String, ScriptConfig>) -> Self {
        Self { executor, catalog }
    }

    /// Build the executor from `[config]` and the catalog from `[script.*]`.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let executor = TaskExecutor::new(ExecutorOptions::from_config(&cfg.config))?;
        Ok(Self::new(Arc::new(executor), cfg.script.clone()))
    }

    pub fn executor(&self) -> &Arc<TaskExecutor> {
        &self.executor
    }

    pub fn scripts(&self) -> impl Iterator<Item = (&str, &ScriptConfig)> {
        self.catalog.iter().map(|(name, s)| (name.as_str(), s))
    }

    /// Validate, create and start a task. Returns the task as it looked
    /// right after starting.
    ///
    /// Validation and launch problems detectable up front are returned as
    /// errors and no task is created. Anything that fails later is reported
    /// through the task record.
    pub fn submit(&self, request: SubmitRequest, observer: Option<Observer>) -> Result<Task> {
        let checked = self.check(&request)?;
        self.launch(checked, observer)
    }

    /// Submit a batch. Every request is checked before the first task is
    /// created, so a bad request anywhere in the batch starts nothing.
    pub fn submit_all(
        &self,
        requests: Vec<SubmitRequest>,
        observer: Option<Observer>,
    ) -> Result<Vec<Task>> {
        let checked = requests
            .iter()
            .map(|request| self.check(request))
            .collect::<Result<Vec<_>>>()?;

        checked
            .into_iter()
            .map(|c| self.launch(c, observer.clone()))
            .collect()
    }

    /// Check a request without creating anything.
    pub fn validate(&self, request: &SubmitRequest) -> Result<()> {
        self.check(request).map(|_| ())
    }

    pub fn task(&self, task_id: &str) -> Result<Task> {
        self.executor
            .get_task(task_id)
            .ok_or_else(|| ScriptexecError::TaskNotFound(task_id.to_string()))
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.executor.get_all_tasks()
    }

    pub fn logs(&self, task_id: &str) -> Result<String> {
        self.executor.get_task_logs(task_id)
    }

    fn check(&self, request: &SubmitRequest) -> Result<CheckedRequest> {
        let owner = request.owner.trim();
        if owner.is_empty() {
            return Err(ScriptexecError::Validation("owner cannot be empty".to_string()));
        }

        let (program, args) = self.resolve(request)?;
        ensure_launchable(&program)?;

        Ok(CheckedRequest {
            owner: owner.to_string(),
            program,
            args,
        })
    }

    fn launch(&self, checked: CheckedRequest, observer: Option<Observer>) -> Result<Task> {
        let task_id = self
            .executor
            .create_task(&checked.owner, checked.program, checked.args);
        self.executor.start_task(&task_id, observer)?;
        info!(task_id = %task_id, owner = %checked.owner, "task submitted");

        self.task(&task_id)
    }

    fn resolve(&self, request: &SubmitRequest) -> Result<(PathBuf, Vec<String>)> {
        match (&request.script, &request.executable) {
            (Some(_), Some(_)) => Err(ScriptexecError::Validation(
                "give either a script name or an executable, not both".to_string(),
            )),
            (None, Some(executable)) => {
                if executable.as_os_str().is_empty() {
                    return Err(ScriptexecError::Validation(
                        "executable cannot be empty".to_string(),
                    ));
                }
                Ok((executable.clone(), request.args.clone()))
            }
            (script, None) => {
                let name = script.as_deref().unwrap_or(DEFAULT_SCRIPT);
                let entry = self.catalog.get(name).ok_or_else(|| {
                    ScriptexecError::Validation(format!("unknown script type: {name}"))
                })?;
                let mut args = entry.args.clone();
                args.extend(request.args.iter().cloned());
                Ok((entry.path.clone(), args))
            }
        }
    }
}

struct CheckedRequest {
    owner: String,
    program: PathBuf,
    args: Vec<String>,
}

/// A program given as a path must be an existing file. A bare name is
/// looked up on `PATH`, the same way the process launcher does it.
fn ensure_launchable(program: &Path) -> Result<()> {
    let is_bare_name = program.components().count() == 1
        && matches!(program.components().next(), Some(Component::Normal(_)));

    let found = if is_bare_name {
        which::which(program).is_ok()
    } else {
        program.is_file()
    };

    if !found {
        warn!(program = ?program, "rejecting submission: executable not found");
        return Err(ScriptexecError::Launch(format!(
            "executable not found: {}",
            program.display()
        )));
    }
    Ok(())
}
