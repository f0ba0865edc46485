//! Rendering collaborators.
//!
//! The actual HTML engine lives outside this crate. It is consumed through [`RenderEngine`],
//! [`RenderSurface`] and [`PrintAdapter`]; [`SurfaceController`] owns the surfaces on the confined
//! thread.

pub mod backend;
pub mod backends;
pub mod controller;
pub mod geometry;
pub mod observer;

pub use backend::{LayoutReply, PrintAdapter, RenderEngine, RenderSurface, SurfaceSettings, WriteReply};
pub use controller::SurfaceController;
pub use geometry::{DocumentInfo, Margins, MediaSize, PageRange, PrintAttributes, Resolution};
pub use observer::{LoadObserver, SurfaceEvent};
