use crate::task::{GenerationTask, TaskHandle, TaskId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::watch;

/// Keeps every in-flight task alive until it finishes.
///
/// A task is inserted when it is admitted and removed by its own finalization. Removal of an id
/// that is no longer present is a no-op.
pub struct TaskRegistry {
    runtime: Handle,
    tasks: Mutex<HashMap<TaskId, Arc<TaskHandle>>>,
    /// Number of tasks in flight, for `wait_idle`
    count_tx: watch::Sender<usize>,
}

impl TaskRegistry {
    pub fn new(runtime: Handle) -> Self {
        let (count_tx, _) = watch::channel(0);
        Self { runtime, tasks: Mutex::new(HashMap::new()), count_tx }
    }

    /// Admit a task and start driving it on the runtime.
    pub(crate) fn submit(&self, task: GenerationTask) {
        let handle = task.handle();
        {
            let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
            tasks.insert(handle.id(), handle.clone());
            self.count_tx.send_replace(tasks.len());
        }

        log::debug!("Task[{}]: admitted", handle.id());
        self.runtime.spawn(task.run());
    }

    pub fn remove(&self, task_id: TaskId) -> Option<Arc<TaskHandle>> {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        let removed = tasks.remove(&task_id);
        if removed.is_some() {
            self.count_tx.send_replace(tasks.len());
            log::debug!("Task[{}]: removed from registry", task_id);
        }
        removed
    }

    pub fn get(&self, task_id: TaskId) -> Option<Arc<TaskHandle>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner()).get(&task_id).cloned()
    }

    pub fn contains(&self, task_id: TaskId) -> bool {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner()).contains_key(&task_id)
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cancel every task in flight. Returns how many were asked to stop.
    pub fn cancel_all(&self) -> usize {
        let snapshot: Vec<Arc<TaskHandle>> =
            self.tasks.lock().unwrap_or_else(|e| e.into_inner()).values().cloned().collect();

        for handle in &snapshot {
            handle.cancel();
        }
        snapshot.len()
    }

    /// Resolves once no task is in flight.
    pub async fn wait_idle(&self) {
        let mut rx = self.count_tx.subscribe();
        // The sender lives in self, so the channel cannot close while we wait
        let _ = rx.wait_for(|count| *count == 0).await;
    }
}
