#![allow(dead_code)]

pub use scriptexec_test_utils::{init_tracing, poll_until_terminal, sh, with_timeout};

use std::path::Path;
use std::sync::Arc;

use scriptexec::executor::{ExecutorOptions, TaskExecutor};
use scriptexec::logstore::MemoryLogStore;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Executor writing real log files under `<dir>/logs`.
pub fn file_executor(dir: &Path) -> TaskExecutor {
    TaskExecutor::new(ExecutorOptions::new(dir.join("logs"))).expect("executor")
}

/// Executor backed by an in-memory log store the test can inspect.
pub fn memory_executor() -> (TaskExecutor, MemoryLogStore) {
    let store = MemoryLogStore::new();
    let executor = TaskExecutor::with_log_store(
        ExecutorOptions::new("mem-logs"),
        Arc::new(store.clone()),
    )
    .expect("executor");
    (executor, store)
}
