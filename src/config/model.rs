// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::duration::parse_duration;
use crate::exec::progress::{DEFAULT_PROGRESS_CAP, DEFAULT_PROGRESS_STEP};

/// Configuration as read from TOML, before validation.
///
/// ```toml
/// [config]
/// logs_dir = "logs"
/// max_tasks = 100
/// progress_step = 5
/// progress_cap = 95
/// poll_interval = "250ms"
///
/// [script.sample]
/// path = "/usr/bin/python3"
/// args = ["backend/sample_script.py"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// Named scripts from `[script.<name>]`.
    #[serde(default)]
    pub script: BTreeMap<String, ScriptConfig>,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub script: BTreeMap<String, ScriptConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        script: BTreeMap<String, ScriptConfig>,
    ) -> Self {
        Self { config, script }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSection {
    /// Directory holding one `<task-id>.log` per task.
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,

    /// Number of tasks kept in memory before finished ones are evicted.
    #[serde(default = "default_max_tasks")]
    pub max_tasks: usize,

    /// Percent of progress credited per stdout line.
    #[serde(default = "default_progress_step")]
    pub progress_step: u8,

    /// Progress ceiling while a task is still running. Must stay below 100.
    #[serde(default = "default_progress_cap")]
    pub progress_cap: u8,

    /// How often the CLI polls task state, e.g. `"250ms"` or `"1s"`.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,
}

impl ConfigSection {
    pub fn poll_interval(&self) -> Result<Duration, String> {
        parse_duration(&self.poll_interval)
    }
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_max_tasks() -> usize {
    100
}

fn default_progress_step() -> u8 {
    DEFAULT_PROGRESS_STEP
}

fn default_progress_cap() -> u8 {
    DEFAULT_PROGRESS_CAP
}

fn default_poll_interval() -> String {
    "250ms".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            logs_dir: default_logs_dir(),
            max_tasks: default_max_tasks(),
            progress_step: default_progress_step(),
            progress_cap: default_progress_cap(),
            poll_interval: default_poll_interval(),
        }
    }
}

/// `[script.<name>]` section: a runnable script in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Executable to launch.
    pub path: PathBuf,

    /// Arguments placed before any arguments given with the request.
    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,
}
