// tests/retention.rs

mod common;
use crate::common::{TestResult, init_tracing, poll_until_terminal, sh};

use scriptexec::executor::{ExecutorOptions, TaskExecutor};

#[tokio::test]
async fn oldest_finished_tasks_are_evicted_at_capacity() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let executor = TaskExecutor::new(ExecutorOptions {
        max_tasks: Some(2),
        ..ExecutorOptions::new(dir.path().join("logs"))
    })?;

    let mut finished = Vec::new();
    for _ in 0..2 {
        let (program, args) = sh("echo done");
        let id = executor.create_task("alice", program, args);
        executor.start_task(&id, None)?;
        poll_until_terminal(&executor, &id).await;
        finished.push(id);
    }

    let (program, args) = sh("echo third");
    let third = executor.create_task("alice", program, args);

    assert_eq!(executor.get_all_tasks().len(), 2);
    assert!(executor.get_task(&finished[0]).is_none(), "oldest should be evicted");
    assert!(executor.get_task(&finished[1]).is_some());
    assert!(executor.get_task(&third).is_some());

    // Eviction forgets the record but leaves the log file on disk.
    let evicted_log = dir.path().join("logs").join(format!("{}.log", finished[0]));
    assert_eq!(std::fs::read_to_string(evicted_log)?, "done\n");

    Ok(())
}

#[tokio::test]
async fn running_tasks_survive_eviction() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let executor = TaskExecutor::new(ExecutorOptions {
        max_tasks: Some(1),
        ..ExecutorOptions::new(dir.path().join("logs"))
    })?;

    let (program, args) = sh("sleep 0.3; echo slow");
    let slow = executor.create_task("alice", program, args);
    executor.start_task(&slow, None)?;

    let (program, args) = sh("echo fast");
    let fast = executor.create_task("bob", program, args);

    assert!(executor.get_task(&slow).is_some());
    assert!(executor.get_task(&fast).is_some());

    let task = poll_until_terminal(&executor, &slow).await.pop().unwrap();
    assert_eq!(task.output, "slow\n");

    Ok(())
}
