//! Confined execution context.
//!
//! Render engines are confined to a single thread. [`ConfinedExecutor`] starts one dedicated
//! thread that owns the engine, every render surface and the share sheet, and runs jobs sent to
//! it one at a time, in submission order. Nothing surface-related ever leaves that thread.

use crate::errors::GeneratorError;
use crate::render::{RenderEngine, SurfaceController, SurfaceSettings};
use crate::share::ShareSheet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};

type Job = Box<dyn FnOnce(&mut ConfinedContext) + Send>;

/// State only reachable from inside confined jobs.
pub struct ConfinedContext {
    pub surfaces: SurfaceController,
    pub share_sheet: Arc<dyn ShareSheet>,
}

pub struct ConfinedExecutor {
    tx: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl ConfinedExecutor {
    /// Start the confined thread. The engine is moved onto it and never leaves.
    pub fn spawn(
        engine: Box<dyn RenderEngine>,
        settings: SurfaceSettings,
        share_sheet: Arc<dyn ShareSheet>,
    ) -> anyhow::Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

        let thread = std::thread::Builder::new()
            .name("pdf-confined".to_string())
            .spawn(move || {
                let mut ctx = ConfinedContext {
                    surfaces: SurfaceController::new(engine, settings),
                    share_sheet,
                };

                while let Some(job) = rx.blocking_recv() {
                    if catch_unwind(AssertUnwindSafe(|| job(&mut ctx))).is_err() {
                        log::error!("Confined job panicked");
                    }
                }

                let leftover = ctx.surfaces.release_all();
                if leftover > 0 {
                    log::warn!("Released {} render surface(s) left behind at detach", leftover);
                }
                log::debug!("Confined thread exiting");
            })?;

        Ok(Self {
            tx: Mutex::new(Some(tx)),
            thread: Mutex::new(Some(thread)),
        })
    }

    /// Queue a job without waiting for it. Fails when the context was detached.
    pub fn dispatch<F>(&self, job: F) -> Result<(), GeneratorError>
    where
        F: FnOnce(&mut ConfinedContext) + Send + 'static,
    {
        let guard = self.tx.lock().unwrap_or_else(|e| e.into_inner());
        let tx = guard.as_ref().ok_or(GeneratorError::HostUnavailable)?;
        tx.send(Box::new(job)).map_err(|_| GeneratorError::HostUnavailable)
    }

    /// Run a job on the confined thread and wait for its return value.
    ///
    /// A job that panics is reported as an internal error.
    pub async fn call<F, R>(&self, job: F) -> Result<R, GeneratorError>
    where
        F: FnOnce(&mut ConfinedContext) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.dispatch(move |ctx| {
            let _ = reply_tx.send(job(ctx));
        })?;

        reply_rx.await.map_err(|_| GeneratorError::internal())
    }

    pub fn is_attached(&self) -> bool {
        self.tx.lock().map(|tx| tx.is_some()).unwrap_or(false)
    }

    /// Stop accepting jobs. Already queued jobs still run, then the thread releases any surface
    /// that is left and exits. Returns the thread handle the first time it is called.
    pub fn detach(&self) -> Option<JoinHandle<()>> {
        self.tx.lock().unwrap_or_else(|e| e.into_inner()).take();
        self.thread.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

impl Drop for ConfinedExecutor {
    fn drop(&mut self) {
        // Dropping the sender ends the thread once the queue drains
        self.detach();
    }
}
