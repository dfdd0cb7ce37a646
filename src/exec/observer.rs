// src/exec/observer.rs

//! Push-style notification of task updates.
//!
//! Polling the registry is always valid; an observer is an optional extra
//! that the worker calls synchronously after every update it applies.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::{Result, anyhow};
use tokio::sync::mpsc;

use crate::task::Task;
use crate::types::TaskId;

/// Callback invoked with the task id and a snapshot taken right after the
/// update. Must not block: it runs on the worker between two output lines.
pub type Observer = Arc<dyn Fn(&TaskId, &Task) + Send + Sync>;

/// One update delivered through [`channel_observer`].
#[derive(Debug, Clone)]
pub struct TaskUpdate {
    pub task_id: TaskId,
    pub task: Task,
}

/// Wrap a closure as an [`Observer`].
pub fn observer_fn<F>(f: F) -> Observer
where
    F: Fn(&TaskId, &Task) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Forward every update into an unbounded channel.
///
/// Updates sent after the receiver is dropped are discarded.
pub fn channel_observer(tx: mpsc::UnboundedSender<TaskUpdate>) -> Observer {
    Arc::new(move |task_id: &TaskId, task: &Task| {
        let _ = tx.send(TaskUpdate {
            task_id: task_id.clone(),
            task: task.clone(),
        });
    })
}

/// Call the observer, if any. A panicking observer is reported as an error
/// so the worker can still move the task to a terminal state.
pub(crate) fn notify(observer: Option<&Observer>, task_id: &TaskId, task: Option<Task>) -> Result<()> {
    if let (Some(observer), Some(task)) = (observer, task) {
        panic::catch_unwind(AssertUnwindSafe(|| observer(task_id, &task)))
            .map_err(|payload| anyhow!("observer panicked: {}", panic_message(payload.as_ref())))?;
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic payload"
    }
}
