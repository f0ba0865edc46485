pub mod config;
pub mod errors;
pub mod events;
pub mod executor;
pub mod generator;
pub mod options;
pub mod produce;
pub mod render;
pub mod request;
pub mod share;
pub mod source;
pub mod task;

pub use config::GeneratorConfig;
pub use errors::{FilesystemError, GeneratorError, ShareError};
pub use events::GeneratorEvent;
pub use generator::{GenerationResult, PdfGenerator, PendingGeneration};
pub use request::CallOptions;
