//! Null rendering engine.
//!
//! Does not render anything. Loads complete immediately (or fail, or never finish, depending on
//! the configured [`LoadBehavior`]) and the print adapter writes a small, deterministic PDF
//! skeleton whose pages carry the requested media box. Useful for tests and for wiring up a host
//! before a real engine is available.

use crate::render::{
    DocumentInfo, LayoutReply, LoadObserver, PageRange, PrintAdapter, PrintAttributes, RenderEngine,
    RenderSurface, SurfaceSettings, WriteReply,
};
use std::fs::File;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// What happens when a surface starts loading.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadBehavior {
    #[default]
    Succeed,
    /// Report a load error with the given description.
    Fail(String),
    /// Never report anything.
    Hang,
}

/// What happens during layout and write.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProduceBehavior {
    #[default]
    Succeed,
    FailLayout(String),
    FailWrite(String),
    /// Layout only finishes when cancelled.
    HangLayout,
}

/// Counters shared between the engine and whoever created it.
#[derive(Debug, Clone, Default)]
pub struct NullStats {
    created: Arc<AtomicUsize>,
    destroyed: Arc<AtomicUsize>,
    loads: Arc<AtomicUsize>,
}

impl NullStats {
    pub fn surfaces_created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn surfaces_destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }

    pub fn surfaces_alive(&self) -> usize {
        self.surfaces_created() - self.surfaces_destroyed()
    }

    pub fn loads_started(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

/// Null engine that does not perform any rendering.
#[derive(Debug, Clone, Default)]
pub struct NullEngine {
    load: LoadBehavior,
    produce: ProduceBehavior,
    page_count: u32,
    stats: NullStats,
}

impl NullEngine {
    /// Creates a new null engine whose loads succeed and which produces single-page documents.
    pub fn new() -> Self {
        Self { page_count: 1, ..Default::default() }
    }

    pub fn with_load(mut self, behavior: LoadBehavior) -> Self {
        self.load = behavior;
        self
    }

    pub fn with_produce(mut self, behavior: ProduceBehavior) -> Self {
        self.produce = behavior;
        self
    }

    pub fn with_page_count(mut self, pages: u32) -> Self {
        self.page_count = pages.max(1);
        self
    }

    pub fn stats(&self) -> NullStats {
        self.stats.clone()
    }
}

impl RenderEngine for NullEngine {
    fn name(&self) -> &str {
        "NullEngine"
    }

    fn create_surface(&mut self, settings: &SurfaceSettings) -> anyhow::Result<Box<dyn RenderSurface>> {
        self.stats.created.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(NullSurface {
            settings: *settings,
            load: self.load.clone(),
            produce: self.produce.clone(),
            page_count: self.page_count,
            stats: self.stats.clone(),
            observer: None,
            content: None,
            destroyed: false,
        }))
    }
}

pub struct NullSurface {
    settings: SurfaceSettings,
    load: LoadBehavior,
    produce: ProduceBehavior,
    page_count: u32,
    stats: NullStats,
    observer: Option<LoadObserver>,
    /// Description of what was loaded, baked into the produced document
    content: Option<String>,
    destroyed: bool,
}

impl NullSurface {
    fn start_load(&mut self, url: &str, content: String) {
        self.stats.loads.fetch_add(1, Ordering::SeqCst);

        if let Err(e) = Url::parse(url) {
            self.report_error(&format!("invalid url '{url}': {e}"));
            return;
        }

        match self.load.clone() {
            LoadBehavior::Succeed => {
                self.content = Some(content);
                if let Some(observer) = &self.observer {
                    observer.page_finished(url);
                }
            }
            LoadBehavior::Fail(description) => self.report_error(&description),
            LoadBehavior::Hang => {}
        }
    }

    fn report_error(&self, description: &str) {
        if let Some(observer) = &self.observer {
            observer.received_error(description);
        }
    }
}

impl RenderSurface for NullSurface {
    fn set_observer(&mut self, observer: Option<LoadObserver>) {
        self.observer = observer;
    }

    fn load_url(&mut self, url: &str) {
        self.start_load(url, format!("url {url}"));
    }

    fn load_html(&mut self, markup: &str, base_url: Option<&str>, _mime_type: &str, _encoding: &str) {
        let url = base_url.unwrap_or("about:blank");
        let content = format!("html {} bytes, scripts {}", markup.len(), self.settings.javascript_enabled);
        self.start_load(url, content);
    }

    fn stop_loading(&mut self) {}

    fn create_print_adapter(&mut self, job_name: &str) -> anyhow::Result<Box<dyn PrintAdapter>> {
        let content = self
            .content
            .clone()
            .ok_or_else(|| anyhow::anyhow!("nothing loaded on this surface"))?;

        Ok(Box::new(NullPrintAdapter {
            job_name: job_name.to_string(),
            content,
            page_count: self.page_count,
            behavior: self.produce.clone(),
            attributes: None,
            pending_layout: None,
        }))
    }

    fn destroy(&mut self) {
        if !self.destroyed {
            self.destroyed = true;
            self.observer = None;
            self.stats.destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Drop for NullSurface {
    fn drop(&mut self) {
        if !self.destroyed {
            log::warn!("NullSurface dropped without being destroyed");
        }
    }
}

pub struct NullPrintAdapter {
    job_name: String,
    content: String,
    page_count: u32,
    behavior: ProduceBehavior,
    attributes: Option<PrintAttributes>,
    /// A hanging layout holds on to its reply until the adapter goes away
    pending_layout: Option<LayoutReply>,
}

impl NullPrintAdapter {
    /// Writes a minimal PDF skeleton: one page object per selected page, each with the laid-out
    /// media box.
    fn render_document(&self, attributes: &PrintAttributes, pages: PageRange) -> Vec<u8> {
        let (width, height) = attributes.media_size.points();
        let selected = pages.pages(self.page_count);
        let count = selected.len();

        let mut out = String::from("%PDF-1.4\n");
        out.push_str(&format!("% {} ({})\n", self.job_name, self.content));
        out.push_str("1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");

        let kids: Vec<String> = (0..count).map(|i| format!("{} 0 R", i + 3)).collect();
        out.push_str(&format!("2 0 obj << /Type /Pages /Count {} /Kids [{}] >> endobj\n", count, kids.join(" ")));
        for (i, page) in selected.enumerate() {
            out.push_str(&format!(
                "{} 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 {width} {height}] >> endobj % page {}\n",
                i + 3,
                page + 1
            ));
        }
        out.push_str("%%EOF\n");
        out.into_bytes()
    }

    fn write_pages(&self, pages: PageRange, output: &mut File, cancel: &CancellationToken) -> Result<(), String> {
        if cancel.is_cancelled() {
            return Err("write cancelled".to_string());
        }
        if let ProduceBehavior::FailWrite(reason) = &self.behavior {
            return Err(reason.clone());
        }

        let attributes = self.attributes.as_ref().ok_or_else(|| "write before layout".to_string())?;
        let bytes = self.render_document(attributes, pages);
        output.write_all(&bytes).map_err(|e| e.to_string())?;
        output.flush().map_err(|e| e.to_string())
    }
}

impl PrintAdapter for NullPrintAdapter {
    fn layout(&mut self, attributes: &PrintAttributes, cancel: CancellationToken, reply: LayoutReply) {
        let outcome = match &self.behavior {
            _ if cancel.is_cancelled() => Err("layout cancelled".to_string()),
            ProduceBehavior::FailLayout(reason) => Err(reason.clone()),
            ProduceBehavior::HangLayout => {
                self.pending_layout = Some(reply);
                return;
            }
            _ => {
                self.attributes = Some(attributes.clone());
                Ok(DocumentInfo { name: self.job_name.clone(), page_count: Some(self.page_count) })
            }
        };
        let _ = reply.send(outcome);
    }

    fn write(&mut self, pages: PageRange, mut output: File, cancel: CancellationToken, reply: WriteReply) {
        let outcome = self.write_pages(pages, &mut output, &cancel);
        let _ = reply.send(outcome);
    }
}
