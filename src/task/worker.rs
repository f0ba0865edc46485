use crate::errors::GeneratorError;
use crate::events::{emit, GeneratorEvent};
use crate::executor::ConfinedExecutor;
use crate::generator::GenerationResult;
use crate::options::GenerationOptions;
use crate::produce::{DocumentProducer, ProducedDocument};
use crate::render::{LoadObserver, SurfaceEvent};
use crate::share::{ShareRequest, PDF_MIME_TYPE};
use crate::source::ContentSource;
use crate::task::structs::{TaskSpawnArgs, TaskState};
use crate::task::TaskHandle;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Drives one generation request from load to delivery.
///
/// ```text
/// Created -> Loading -> Producing -> Completed
///    \          \           \-> Failed / Cancelled
/// ```
///
/// Whatever the path, the worker finalizes the task through [`TaskHandle::finish`] when it ends.
pub struct GenerationTask {
    handle: Arc<TaskHandle>,
    state: TaskState,
    source: ContentSource,
    options: GenerationOptions,
    producer: DocumentProducer,
    executor: Arc<ConfinedExecutor>,
    event_tx: broadcast::Sender<GeneratorEvent>,
}

impl GenerationTask {
    pub(crate) fn new(args: TaskSpawnArgs) -> (Self, oneshot::Receiver<Result<GenerationResult, GeneratorError>>) {
        let (tx, rx) = oneshot::channel();
        let handle = Arc::new(TaskHandle::new(
            tx,
            tokio_util::sync::CancellationToken::new(),
            args.executor.clone(),
            args.registry,
            args.event_tx.clone(),
        ));

        let task = Self {
            handle,
            state: TaskState::Created,
            source: args.source,
            options: args.options,
            producer: DocumentProducer::new(args.config, args.executor.clone()),
            executor: args.executor,
            event_tx: args.event_tx,
        };
        (task, rx)
    }

    pub fn handle(&self) -> Arc<TaskHandle> {
        self.handle.clone()
    }

    pub fn state(&self) -> &TaskState {
        &self.state
    }

    pub async fn run(mut self) {
        let task_id = self.handle.id();
        emit(&self.event_tx, GeneratorEvent::TaskAdmitted { task_id, source: self.source.kind() });

        let outcome = AssertUnwindSafe(self.drive()).catch_unwind().await.unwrap_or_else(|_| {
            log::error!("Task[{}]: worker panicked", task_id);
            Err(GeneratorError::internal())
        });

        match outcome {
            Ok(result) => {
                log::info!("Task[{}]: completed", task_id);
                self.transition(TaskState::Completed);
                self.handle.settle(Ok(result));
            }
            Err(GeneratorError::Cancelled) => {
                self.transition(TaskState::Cancelled);
                log::info!("Task[{}]: cancelled", task_id);
                emit(&self.event_tx, GeneratorEvent::TaskCancelled { task_id });
            }
            Err(e) => {
                log::warn!("Task[{}]: failed: {}", task_id, e);
                self.transition(TaskState::Failed(e.to_string()));
                self.handle.settle(Err(e));
            }
        }

        self.handle.finish();
    }

    async fn drive(&mut self) -> Result<GenerationResult, GeneratorError> {
        let task_id = self.handle.id();
        let cancel = self.handle.cancel_token().clone();
        if cancel.is_cancelled() {
            return Err(GeneratorError::Cancelled);
        }

        // Loading
        self.transition(TaskState::Loading);

        let (surface_tx, mut surface_rx) = mpsc::unbounded_channel();
        let observer = LoadObserver::new(task_id, surface_tx);
        let source = self.source.clone();
        self.executor
            .call(move |ctx| ctx.surfaces.open(task_id, &source, observer))
            .await??;
        emit(&self.event_tx, GeneratorEvent::LoadStarted { task_id });

        let url = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GeneratorError::Cancelled),
            event = surface_rx.recv() => match event {
                Some(SurfaceEvent::PageFinished { url }) => url,
                Some(SurfaceEvent::ReceivedError { description }) => {
                    emit(&self.event_tx, GeneratorEvent::LoadFailed { task_id, error: description.clone() });
                    return Err(GeneratorError::Load(description));
                }
                None => {
                    log::error!("Task[{}]: surface went away while loading", task_id);
                    return Err(GeneratorError::internal());
                }
            },
        };

        // Only the first completion counts; anything the surface reports from now on is dropped
        drop(surface_rx);
        log::debug!("Task[{}]: loaded {}", task_id, url);
        emit(&self.event_tx, GeneratorEvent::LoadFinished { task_id, url });

        // Producing
        self.transition(TaskState::Producing);
        emit(&self.event_tx, GeneratorEvent::ProduceStarted { task_id });

        let produced = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GeneratorError::Cancelled),
            res = self.producer.produce(task_id, &self.options, cancel.clone()) => res?,
        };

        match produced {
            ProducedDocument::Encoded(base64) => Ok(GenerationResult::Base64 { base64 }),
            ProducedDocument::File(path) => {
                if cancel.is_cancelled() {
                    return Err(GeneratorError::Cancelled);
                }

                log::debug!("Task[{}]: sharing {}", task_id, path.display());
                let request = ShareRequest { path, mime_type: PDF_MIME_TYPE, title: self.options.file_name.clone() };
                self.executor
                    .call(move |ctx| ctx.share_sheet.present(&request))
                    .await??;

                Ok(GenerationResult::Share { completed: true })
            }
        }
    }

    fn transition(&mut self, next: TaskState) {
        if !self.state.can_transition_to(&next) {
            log::warn!("Task[{}]: ignoring transition {:?} -> {:?}", self.handle.id(), self.state, next);
            return;
        }

        log::trace!("Task[{}]: {:?} -> {:?}", self.handle.id(), self.state, next);
        self.state = next;
    }
}
