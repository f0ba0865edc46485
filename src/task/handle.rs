use crate::errors::GeneratorError;
use crate::events::{emit, GeneratorEvent};
use crate::executor::ConfinedExecutor;
use crate::generator::GenerationResult;
use crate::task::registry::TaskRegistry;
use crate::task::TaskId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::{broadcast, oneshot};
use tokio_util::sync::CancellationToken;

pub(crate) type Responder = oneshot::Sender<Result<GenerationResult, GeneratorError>>;

/// Shared part of a task: its identity, the caller's responder and the one-shot finalize guard.
///
/// Held by the registry, the task worker and the caller's pending generation. Every method is
/// safe to call from any thread, any number of times.
pub struct TaskHandle {
    task_id: TaskId,
    /// Taken exactly once, either to deliver a result or by `finish()`
    responder: Mutex<Option<Responder>>,
    finished: AtomicBool,
    cancel: CancellationToken,
    executor: Arc<ConfinedExecutor>,
    registry: Weak<TaskRegistry>,
    event_tx: broadcast::Sender<GeneratorEvent>,
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("task_id", &self.task_id)
            .field("finished", &self.is_finished())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl TaskHandle {
    pub(crate) fn new(
        responder: Responder,
        cancel: CancellationToken,
        executor: Arc<ConfinedExecutor>,
        registry: Weak<TaskRegistry>,
        event_tx: broadcast::Sender<GeneratorEvent>,
    ) -> Self {
        Self {
            task_id: TaskId::new(),
            responder: Mutex::new(Some(responder)),
            finished: AtomicBool::new(false),
            cancel,
            executor,
            registry,
            event_tx,
        }
    }

    pub fn id(&self) -> TaskId {
        self.task_id
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Ask the task to stop. The worker moves it to `Cancelled` and finalizes it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Deliver the task's outcome to the caller. Only the first delivery before `finish()` has any
    /// effect; returns whether this call delivered.
    pub(crate) fn settle(&self, outcome: Result<GenerationResult, GeneratorError>) -> bool {
        let mut responder = self.responder.lock().unwrap_or_else(|e| e.into_inner());
        if self.is_finished() {
            log::debug!("Task[{}]: outcome after finish ignored", self.task_id);
            return false;
        }

        let Some(tx) = responder.take() else {
            log::debug!("Task[{}]: outcome already delivered", self.task_id);
            return false;
        };

        match &outcome {
            Ok(_) => emit(&self.event_tx, GeneratorEvent::TaskCompleted { task_id: self.task_id }),
            Err(e) => emit(
                &self.event_tx,
                GeneratorEvent::TaskFailed { task_id: self.task_id, error: e.to_string() },
            ),
        }

        if tx.send(outcome).is_err() {
            log::debug!("Task[{}]: caller stopped waiting for the outcome", self.task_id);
        }
        true
    }

    /// Finalize the task: release its render surface on the confined thread, then remove it from
    /// the registry. Only the first call has any effect; returns whether this call finalized.
    pub fn finish(&self) -> bool {
        {
            let mut responder = self.responder.lock().unwrap_or_else(|e| e.into_inner());
            if self
                .finished
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                return false;
            }
            // Nothing may be delivered from here on
            responder.take();
        }

        log::debug!("Task[{}]: finishing", self.task_id);

        let task_id = self.task_id;
        let registry = self.registry.clone();
        let event_tx = self.event_tx.clone();

        let teardown = self.executor.dispatch(move |ctx| {
            ctx.surfaces.release(task_id);
            finalize(&registry, task_id, &event_tx);
        });

        if teardown.is_err() {
            // No confined context left; its thread released the surfaces on the way out
            finalize(&self.registry, task_id, &self.event_tx);
        }
        true
    }
}

fn finalize(registry: &Weak<TaskRegistry>, task_id: TaskId, event_tx: &broadcast::Sender<GeneratorEvent>) {
    if let Some(registry) = registry.upgrade() {
        registry.remove(task_id);
    }
    emit(event_tx, GeneratorEvent::TaskFinished { task_id });
}
