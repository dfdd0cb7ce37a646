// src/logstore/memory.rs

use super::LogStore;
use anyhow::{Result, anyhow};
use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct MemoryState {
    logs: HashMap<PathBuf, Vec<u8>>,
    dirs: HashSet<PathBuf>,
    /// Paths whose log cannot be opened.
    denied: HashSet<PathBuf>,
    /// Paths whose writer fails once it holds this many bytes.
    write_limits: HashMap<PathBuf, usize>,
}

/// In-memory log storage, with hooks to simulate unwritable logs.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `open_write` fail for `path`.
    pub fn deny(&self, path: impl AsRef<Path>) {
        self.lock().denied.insert(path.as_ref().to_path_buf());
    }

    /// Make writes to `path` fail once `limit` bytes have been stored.
    pub fn limit_writes(&self, path: impl AsRef<Path>, limit: usize) {
        self.lock()
            .write_limits
            .insert(path.as_ref().to_path_buf(), limit);
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.lock()
            .logs
            .get(path.as_ref())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn has_dir(&self, path: impl AsRef<Path>) -> bool {
        self.lock().dirs.contains(path.as_ref())
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LogStore for MemoryLogStore {
    fn prepare(&self, dir: &Path) -> Result<()> {
        self.lock().dirs.insert(dir.to_path_buf());
        Ok(())
    }

    fn open_write(&self, path: &Path) -> Result<Box<dyn Write + Send>> {
        let mut state = self.lock();
        if state.denied.contains(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        state.logs.insert(path.to_path_buf(), Vec::new());
        Ok(Box::new(MemoryWriter {
            state: Arc::clone(&self.state),
            path: path.to_path_buf(),
        }))
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        Ok(self.contents(path).unwrap_or_default())
    }
}

struct MemoryWriter {
    state: Arc<Mutex<MemoryState>>,
    path: PathBuf,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let limit = state.write_limits.get(&self.path).copied();
        let log = state.logs.entry(self.path.clone()).or_default();
        if limit.is_some_and(|limit| log.len() + buf.len() > limit) {
            return Err(io::Error::new(
                io::ErrorKind::StorageFull,
                format!("log limit reached for {:?}", self.path),
            ));
        }
        log.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
