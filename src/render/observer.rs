use crate::task::TaskId;
use tokio::sync::mpsc;

/// Load notifications delivered from a render surface to the task that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The main document finished loading.
    PageFinished { url: String },
    /// The main document failed to load.
    ReceivedError { description: String },
}

/// Observer handed to a [`RenderSurface`](crate::render::RenderSurface).
///
/// Notifying never blocks and never fails: once the task has gone away the notification is dropped.
#[derive(Debug, Clone)]
pub struct LoadObserver {
    task_id: TaskId,
    tx: mpsc::UnboundedSender<SurfaceEvent>,
}

impl LoadObserver {
    pub(crate) fn new(task_id: TaskId, tx: mpsc::UnboundedSender<SurfaceEvent>) -> Self {
        Self { task_id, tx }
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn page_finished(&self, url: &str) {
        self.notify(SurfaceEvent::PageFinished { url: url.to_string() });
    }

    pub fn received_error(&self, description: &str) {
        self.notify(SurfaceEvent::ReceivedError { description: description.to_string() });
    }

    fn notify(&self, event: SurfaceEvent) {
        if self.tx.send(event).is_err() {
            log::debug!("Task[{}]: dropping late surface notification", self.task_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifications_reach_the_task() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let observer = LoadObserver::new(TaskId::new(), tx);

        observer.page_finished("https://example.com/");
        observer.received_error("boom");

        assert_eq!(rx.try_recv().unwrap(), SurfaceEvent::PageFinished { url: "https://example.com/".into() });
        assert_eq!(rx.try_recv().unwrap(), SurfaceEvent::ReceivedError { description: "boom".into() });
    }

    #[test]
    fn notifying_a_gone_task_is_harmless() {
        let (tx, rx) = mpsc::unbounded_channel();
        let observer = LoadObserver::new(TaskId::new(), tx);
        drop(rx);
        observer.page_finished("about:blank");
    }
}
