//! Generator events.
//!
//! The generator publishes lifecycle events on a broadcast bus (see
//! [`PdfGenerator::subscribe_events`](crate::generator::PdfGenerator::subscribe_events)). Events are
//! informational only: results and rejections always travel through the caller's pending
//! generation, never through this bus.

use crate::task::TaskId;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratorEvent {
    // ****************************************
    // ** Task lifecycle
    /// Task was admitted to the registry
    TaskAdmitted { task_id: TaskId, source: &'static str },
    /// Task delivered a result
    TaskCompleted { task_id: TaskId },
    /// Task delivered a rejection
    TaskFailed { task_id: TaskId, error: String },
    /// Task was cancelled without delivering anything
    TaskCancelled { task_id: TaskId },
    /// Task resources are released and the task left the registry
    TaskFinished { task_id: TaskId },

    // ****************************************
    // ** Loading
    /// Render surface was created and started loading
    LoadStarted { task_id: TaskId },
    /// Content finished loading
    LoadFinished { task_id: TaskId, url: String },
    /// Content failed to load
    LoadFailed { task_id: TaskId, error: String },

    // ****************************************
    // ** Production
    /// Layout/write protocol started
    ProduceStarted { task_id: TaskId },

    // ****************************************
    // ** Host
    /// The confined UI context went away; new requests are rejected
    HostDetached,
}

impl GeneratorEvent {
    /// Task the event belongs to, if any.
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            GeneratorEvent::TaskAdmitted { task_id, .. }
            | GeneratorEvent::TaskCompleted { task_id }
            | GeneratorEvent::TaskFailed { task_id, .. }
            | GeneratorEvent::TaskCancelled { task_id }
            | GeneratorEvent::TaskFinished { task_id }
            | GeneratorEvent::LoadStarted { task_id }
            | GeneratorEvent::LoadFinished { task_id, .. }
            | GeneratorEvent::LoadFailed { task_id, .. }
            | GeneratorEvent::ProduceStarted { task_id } => Some(*task_id),
            GeneratorEvent::HostDetached => None,
        }
    }
}

/// Publish an event. Having no subscribers is not an error.
pub(crate) fn emit(tx: &broadcast::Sender<GeneratorEvent>, event: GeneratorEvent) {
    let _ = tx.send(event);
}
