pub mod builders;
pub mod recorder;

use std::path::PathBuf;
use std::sync::Once;
use std::time::Duration;

use scriptexec::executor::TaskExecutor;
use scriptexec::task::Task;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 10-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(10), f)
        .await
        .expect("Test timed out after 10 seconds")
}

/// Poll the executor until the task is terminal, collecting every distinct
/// snapshot seen along the way (the last one is terminal).
pub async fn poll_until_terminal(executor: &TaskExecutor, task_id: &str) -> Vec<Task> {
    with_timeout(async {
        let mut seen: Vec<Task> = Vec::new();
        loop {
            let task = executor
                .get_task(task_id)
                .expect("task disappeared while polling");
            let terminal = task.is_terminal();
            if seen.last() != Some(&task) {
                seen.push(task);
            }
            if terminal {
                return seen;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
}

/// `/bin/sh -c <script>` as (program, args).
pub fn sh(script: &str) -> (PathBuf, Vec<String>) {
    (
        PathBuf::from("/bin/sh"),
        vec!["-c".to_string(), script.to_string()],
    )
}
