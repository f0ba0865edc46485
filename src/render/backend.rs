use crate::render::geometry::{DocumentInfo, PageRange, PrintAttributes};
use crate::render::observer::LoadObserver;
use std::fs::File;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// Settings applied to a freshly created render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSettings {
    pub javascript_enabled: bool,
    pub dom_storage_enabled: bool,
}

/// Core rendering engine interface.
///
/// The engine is moved onto the confined thread once and is only called from there afterwards,
/// which is why surfaces it hands out do not need to be `Send`.
pub trait RenderEngine: Send {
    fn name(&self) -> &str;

    /// Create a new, empty surface with the given settings.
    fn create_surface(&mut self, settings: &SurfaceSettings) -> anyhow::Result<Box<dyn RenderSurface>>;
}

/// A single rendering surface (a headless web view). Every call happens on the confined thread.
///
/// Loading is asynchronous: `load_url` and `load_html` return immediately and the outcome is
/// reported later through the attached [`LoadObserver`].
pub trait RenderSurface {
    /// Attach (or with `None`, detach) the observer that receives load notifications.
    fn set_observer(&mut self, observer: Option<LoadObserver>);

    fn load_url(&mut self, url: &str);

    /// Render inline markup. `base_url` resolves relative references; `None` means none.
    fn load_html(&mut self, markup: &str, base_url: Option<&str>, mime_type: &str, encoding: &str);

    /// Abort any in-progress load. Harmless when nothing is loading.
    fn stop_loading(&mut self);

    /// Create a print adapter for the content currently loaded on this surface.
    fn create_print_adapter(&mut self, job_name: &str) -> anyhow::Result<Box<dyn PrintAdapter>>;

    /// Release all resources held by the surface. Called exactly once by the controller.
    fn destroy(&mut self);
}

/// Outcome of the layout phase. May be sent later, from any thread.
pub type LayoutReply = oneshot::Sender<Result<DocumentInfo, String>>;

/// Outcome of the write phase. May be sent later, from any thread.
pub type WriteReply = oneshot::Sender<Result<(), String>>;

/// Two-phase document production against the content loaded on a surface.
///
/// Like the surface that created it, an adapter is only ever called on the confined thread. Both
/// calls return immediately and report their outcome through the reply. A failure carries the
/// engine's (possibly empty) description; a reply dropped without an answer counts as a failure.
pub trait PrintAdapter {
    /// Lay out the content for the given page geometry.
    fn layout(&mut self, attributes: &PrintAttributes, cancel: CancellationToken, reply: LayoutReply);

    /// Paint the requested pages into `output`. Only called after a successful layout.
    fn write(&mut self, pages: PageRange, output: File, cancel: CancellationToken, reply: WriteReply);
}
