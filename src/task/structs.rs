use crate::config::GeneratorConfig;
use crate::events::GeneratorEvent;
use crate::executor::ConfinedExecutor;
use crate::options::GenerationOptions;
use crate::source::ContentSource;
use crate::task::TaskRegistry;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use uuid::Uuid;

/// A unique identifier for a generation task.
///
/// Internally a `TaskId` wraps a [`Uuid`]; treat it as an opaque handle. It is never part of the
/// caller-facing results, it only identifies tasks in the registry, in logs and in events.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Create a new unique `TaskId` using a random UUID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a task. Transitions only move forward; see [`TaskState::can_transition_to`].
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    /// Admitted to the registry, not started yet.
    #[default]
    Created,

    /// The render surface is loading the content.
    Loading,

    /// Content loaded; the layout/write protocol is running.
    Producing,

    /// A result was delivered to the caller.
    Completed,

    /// A rejection was delivered to the caller.
    Failed(String),

    /// Aborted from outside. Nothing was delivered.
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed(_) | TaskState::Cancelled)
    }

    pub fn can_transition_to(&self, next: &TaskState) -> bool {
        use TaskState::*;

        match (self, next) {
            (Created, Loading) => true,
            (Loading, Producing) => true,
            (Producing, Completed) => true,
            // Starting can fail before a surface exists
            (Created | Loading | Producing, Failed(_)) => true,
            (Created | Loading | Producing, Cancelled) => true,
            _ => false,
        }
    }
}

/// Everything a task worker needs, handed over when the task is created.
pub struct TaskSpawnArgs {
    pub source: ContentSource,
    pub options: GenerationOptions,
    pub config: Arc<GeneratorConfig>,
    pub executor: Arc<ConfinedExecutor>,
    pub registry: Weak<TaskRegistry>,
    pub event_tx: broadcast::Sender<GeneratorEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_ids_are_unique() {
        let a = TaskId::new();
        let b = TaskId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string().len(), 36);
    }

    #[test]
    fn forward_transitions_only() {
        use TaskState::*;

        assert!(Created.can_transition_to(&Loading));
        assert!(Loading.can_transition_to(&Producing));
        assert!(Producing.can_transition_to(&Completed));
        assert!(Loading.can_transition_to(&Failed("x".into())));
        assert!(Producing.can_transition_to(&Cancelled));

        assert!(!Created.can_transition_to(&Producing));
        assert!(!Loading.can_transition_to(&Completed));
        assert!(!Producing.can_transition_to(&Loading));
        assert!(!Completed.can_transition_to(&Cancelled));
        assert!(!Cancelled.can_transition_to(&Failed("x".into())));
        assert!(!Failed("x".into()).can_transition_to(&Completed));
    }

    #[test]
    fn terminal_states() {
        assert!(!TaskState::Created.is_terminal());
        assert!(!TaskState::Producing.is_terminal());
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Failed(String::new()).is_terminal());
        assert!(TaskState::Cancelled.is_terminal());
    }
}
