// src/task/registry.rs

//! Lock-protected task store.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};
use uuid::Uuid;

use crate::logstore::log_path;
use crate::task::record::{Task, TaskCommand};
use crate::types::TaskId;

#[derive(Debug, Default)]
struct RegistryInner {
    tasks: HashMap<TaskId, Task>,
    /// Creation order, oldest first.
    order: VecDeque<TaskId>,
}

/// Authoritative store of every task record.
///
/// A single mutex guards both the map and the field values of each record.
/// It is held only to copy or update a record, never across process I/O or
/// log writes.
#[derive(Debug)]
pub struct TaskRegistry {
    inner: Mutex<RegistryInner>,
    logs_dir: PathBuf,
    max_tasks: Option<usize>,
}

impl TaskRegistry {
    /// Create an empty registry whose tasks log under `logs_dir`.
    ///
    /// With `max_tasks = Some(n)`, creating a task while `n` records are held
    /// evicts the oldest finished records first. Pending and running tasks
    /// are never evicted, so the cap can be exceeded temporarily.
    pub fn new(logs_dir: impl Into<PathBuf>, max_tasks: Option<usize>) -> Self {
        Self {
            inner: Mutex::new(RegistryInner::default()),
            logs_dir: logs_dir.into(),
            max_tasks,
        }
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    pub fn max_tasks(&self) -> Option<usize> {
        self.max_tasks
    }

    /// Insert a new `pending` task and return its id.
    pub fn create(&self, owner: impl Into<String>, command: TaskCommand) -> TaskId {
        let owner = owner.into();
        let mut inner = self.lock();

        if let Some(max) = self.max_tasks {
            evict_finished(&mut inner, max);
        }

        let mut id = Uuid::new_v4().to_string();
        while inner.tasks.contains_key(&id) {
            id = Uuid::new_v4().to_string();
        }

        let task = Task::new(
            id.clone(),
            owner,
            command,
            log_path(&self.logs_dir, &id),
        );
        debug!(task_id = %id, owner = %task.owner, cmd = %task.command, "task created");

        inner.tasks.insert(id.clone(), task);
        inner.order.push_back(id.clone());
        id
    }

    /// Snapshot of one task, or `None` if the id is unknown.
    pub fn get(&self, id: &str) -> Option<Task> {
        self.lock().tasks.get(id).cloned()
    }

    /// Snapshot of every task, oldest first.
    pub fn get_all(&self) -> Vec<Task> {
        let inner = self.lock();
        inner
            .order
            .iter()
            .filter_map(|id| inner.tasks.get(id).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply `f` to the record for `id` while holding the lock.
    ///
    /// Returns `None` if the id is unknown.
    pub(crate) fn mutate<R>(&self, id: &str, f: impl FnOnce(&mut Task) -> R) -> Option<R> {
        let mut inner = self.lock();
        inner.tasks.get_mut(id).map(f)
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        // Records are only updated through whole-field assignments, so a
        // panic in another holder cannot leave a half-written record behind.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Drop the oldest terminal records until there is room for one more task.
fn evict_finished(inner: &mut RegistryInner, max: usize) {
    while inner.tasks.len() >= max {
        let victim = inner
            .order
            .iter()
            .position(|id| inner.tasks.get(id).is_some_and(Task::is_terminal));

        let Some(pos) = victim else {
            debug!(
                held = inner.tasks.len(),
                max, "registry over capacity but every task is still active"
            );
            return;
        };

        if let Some(id) = inner.order.remove(pos) {
            inner.tasks.remove(&id);
            info!(task_id = %id, "evicted finished task from registry");
        }
    }
}
