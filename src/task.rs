//! Generation tasks.
//!
//! Every accepted request becomes a task: a [`GenerationTask`] worker that drives it, a shared
//! [`TaskHandle`] that guarantees single delivery and single finalization, and an entry in the
//! [`TaskRegistry`] that keeps it alive until it finishes.

mod handle;
mod registry;
mod structs;
mod worker;

pub use handle::TaskHandle;
pub use registry::TaskRegistry;
pub use structs::{TaskId, TaskSpawnArgs, TaskState};
pub use worker::GenerationTask;
