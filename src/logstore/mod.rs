// src/logstore/mod.rs

//! Durable per-task log storage.
//!
//! Each task mirrors its stdout into one log artifact named after the task
//! id. Only the task's own worker ever writes to it, so writers need no
//! locking; each line is flushed as soon as it is written.

use std::fmt::Debug;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod memory;

pub use memory::MemoryLogStore;

/// Marker written between captured output and the error text of a failed task.
pub const ERROR_MARKER: &str = "\nERROR:\n";

/// Deterministic log location for a task id.
pub fn log_path(logs_dir: &Path, task_id: &str) -> PathBuf {
    logs_dir.join(format!("{task_id}.log"))
}

/// Trailing block appended to the log of a failed task.
pub fn error_block(message: &str) -> String {
    format!("{ERROR_MARKER}{message}")
}

/// Abstract log storage.
pub trait LogStore: Send + Sync + Debug {
    /// Make sure the logs directory exists.
    fn prepare(&self, dir: &Path) -> Result<()>;

    /// Create (or truncate) the log at `path` and return a writer for it.
    fn open_write(&self, path: &Path) -> Result<Box<dyn Write + Send>>;

    /// Full log content. A log that does not exist yet reads as empty.
    fn read_to_string(&self, path: &Path) -> Result<String>;
}

/// Log storage on the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FileLogStore;

impl LogStore for FileLogStore {
    fn prepare(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).with_context(|| format!("creating logs dir {:?}", dir))
    }

    fn open_write(&self, path: &Path) -> Result<Box<dyn Write + Send>> {
        let file = fs::File::create(path).with_context(|| format!("creating log file {:?}", path))?;
        Ok(Box::new(file))
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        match fs::read(path) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(anyhow::Error::new(e).context(format!("reading log file {:?}", path))),
        }
    }
}

/// Write `text` and flush it straight away.
pub fn append(writer: &mut (dyn Write + Send), text: &str) -> std::io::Result<()> {
    writer.write_all(text.as_bytes())?;
    writer.flush()
}
