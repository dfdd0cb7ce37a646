use std::sync::{Arc, Mutex};

use scriptexec::exec::{Observer, observer_fn};
use scriptexec::task::Task;

/// Observer that stores every snapshot it is handed.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    updates: Arc<Mutex<Vec<Task>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observer(&self) -> Observer {
        let updates = Arc::clone(&self.updates);
        observer_fn(move |_id, task| {
            updates.lock().unwrap().push(task.clone());
        })
    }

    pub fn updates(&self) -> Vec<Task> {
        self.updates.lock().unwrap().clone()
    }

    pub fn progress_values(&self) -> Vec<u8> {
        self.updates().iter().map(|t| t.progress).collect()
    }
}
