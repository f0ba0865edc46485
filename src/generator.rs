//! Caller-facing entry point.
//!
//! [`PdfGenerator`] validates a request synchronously, turns it into a task and hands back a
//! [`PendingGeneration`] future that resolves exactly once with the result or the rejection.
//!
//! ```rust,no_run
//! use pdf_generator::generator::PdfGenerator;
//! use pdf_generator::render::backends::null::NullEngine;
//! use pdf_generator::share::UnavailableShareSheet;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let generator = PdfGenerator::new(None, Box::new(NullEngine::new()), Arc::new(UnavailableShareSheet))?;
//! let pdf = generator.from_url(serde_json::json!({ "url": "https://example.com" }))?.await?;
//! println!("{}", serde_json::to_string(&pdf)?);
//! # Ok(()) }
//! ```

use crate::config::GeneratorConfig;
use crate::errors::GeneratorError;
use crate::events::{emit, GeneratorEvent};
use crate::executor::ConfinedExecutor;
use crate::options::GenerationOptions;
use crate::render::{RenderEngine, SurfaceSettings};
use crate::request::CallOptions;
use crate::share::ShareSheet;
use crate::source::ContentSource;
use crate::task::{GenerationTask, TaskHandle, TaskId, TaskRegistry, TaskSpawnArgs};
use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{broadcast, oneshot};

/// Successful outcome of a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GenerationResult {
    /// The whole document, base64 encoded.
    Base64 { base64: String },
    /// The document was written to a file and offered through the share sheet.
    Share { completed: bool },
}

pub struct PdfGenerator {
    config: Arc<GeneratorConfig>,
    executor: Arc<ConfinedExecutor>,
    registry: Arc<TaskRegistry>,
    event_tx: broadcast::Sender<GeneratorEvent>,
}

impl PdfGenerator {
    /// Create a generator driving `engine` on its own confined thread. Must be called from within a
    /// tokio runtime; tasks are spawned on that runtime.
    pub fn new(
        config: Option<GeneratorConfig>,
        engine: Box<dyn RenderEngine>,
        share_sheet: Arc<dyn ShareSheet>,
    ) -> anyhow::Result<Self> {
        let config = Arc::new(config.unwrap_or_default());
        let runtime = tokio::runtime::Handle::try_current().context("PdfGenerator needs a tokio runtime")?;

        log::info!("Starting PDF generator on {} engine", engine.name());

        let settings = SurfaceSettings {
            javascript_enabled: config.javascript_enabled,
            dom_storage_enabled: config.dom_storage_enabled,
        };
        let executor = ConfinedExecutor::spawn(engine, settings, share_sheet)?;
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));

        Ok(Self {
            config,
            executor: Arc::new(executor),
            registry: Arc::new(TaskRegistry::new(runtime)),
            event_tx,
        })
    }

    /// Render the page at `url`. Fails right away, without creating a task, when `url` is
    /// missing or blank.
    pub fn from_url(&self, options: impl Into<CallOptions>) -> Result<PendingGeneration, GeneratorError> {
        let call = options.into();
        let url = non_blank(&call, "url").ok_or_else(GeneratorError::missing_url)?;

        let options = GenerationOptions::parse(&call, &self.config.bundle_root);
        Ok(self.start(ContentSource::Url(url.to_string()), options))
    }

    /// Render the inline markup in `data`. Fails right away, without creating a task, when `data`
    /// is missing or blank.
    pub fn from_data(&self, options: impl Into<CallOptions>) -> Result<PendingGeneration, GeneratorError> {
        let call = options.into();
        let markup = non_blank(&call, "data").ok_or_else(GeneratorError::missing_data)?;

        let options = GenerationOptions::parse(&call, &self.config.bundle_root);
        let source = ContentSource::Html { markup: markup.to_string(), base_url: options.base_url.clone() };
        Ok(self.start(source, options))
    }

    pub fn plugin_version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<GeneratorEvent> {
        self.event_tx.subscribe()
    }

    /// Number of tasks that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.registry.len()
    }

    /// Cancel every task in flight. None of them delivers a result.
    pub fn cancel_all(&self) -> usize {
        let count = self.registry.cancel_all();
        if count > 0 {
            log::info!("Cancelling {} task(s)", count);
        }
        count
    }

    /// Resolves once every task has finished.
    pub async fn wait_idle(&self) {
        self.registry.wait_idle().await
    }

    /// Cancel everything, wait for the tasks to wind down, then detach the confined context.
    /// Requests made afterwards are rejected with [`GeneratorError::HostUnavailable`].
    pub async fn shutdown(&self) {
        self.cancel_all();
        self.wait_idle().await;

        let Some(thread) = self.executor.detach() else {
            return;
        };

        emit(&self.event_tx, GeneratorEvent::HostDetached);
        if tokio::task::spawn_blocking(move || thread.join()).await.is_err() {
            log::warn!("Confined thread did not shut down cleanly");
        }
        log::info!("PDF generator shut down");
    }

    fn start(&self, source: ContentSource, options: GenerationOptions) -> PendingGeneration {
        let (task, rx) = GenerationTask::new(TaskSpawnArgs {
            source,
            options,
            config: self.config.clone(),
            executor: self.executor.clone(),
            registry: Arc::downgrade(&self.registry),
            event_tx: self.event_tx.clone(),
        });

        let handle = task.handle();
        log::info!("Task[{}]: accepted", handle.id());
        self.registry.submit(task);

        PendingGeneration { handle, rx }
    }
}

fn non_blank<'a>(call: &'a CallOptions, key: &str) -> Option<&'a str> {
    call.get_str(key).filter(|value| !value.trim().is_empty())
}

/// The outcome of an accepted request.
///
/// Resolves with the task's result or rejection. A task that was cancelled delivers nothing; the
/// future then resolves with [`GeneratorError::Cancelled`]. Dropping the future does not cancel
/// the task.
pub struct PendingGeneration {
    handle: Arc<TaskHandle>,
    rx: oneshot::Receiver<Result<GenerationResult, GeneratorError>>,
}

impl PendingGeneration {
    pub fn task_id(&self) -> TaskId {
        self.handle.id()
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }
}

impl Future for PendingGeneration {
    type Output = Result<GenerationResult, GeneratorError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|delivered| delivered.unwrap_or(Err(GeneratorError::Cancelled)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ShareError;
    use crate::render::backends::null::{LoadBehavior, NullEngine, NullStats};
    use crate::render::{LoadObserver, PrintAdapter, RenderSurface};
    use crate::share::{ShareRequest, UnavailableShareSheet, PDF_MIME_TYPE};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingShareSheet {
        requests: Mutex<Vec<ShareRequest>>,
        fail_with: Option<ShareError>,
    }

    impl ShareSheet for RecordingShareSheet {
        fn present(&self, request: &ShareRequest) -> Result<(), ShareError> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.fail_with {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            }
        }
    }

    fn build(
        dir: &std::path::Path,
        engine: NullEngine,
        share_sheet: Arc<dyn ShareSheet>,
    ) -> (PdfGenerator, NullStats) {
        let stats = engine.stats();
        let config = GeneratorConfig::builder().cache_dir(dir.join("cache")).output_dir(dir.join("out")).build().unwrap();
        (PdfGenerator::new(Some(config), Box::new(engine), share_sheet).unwrap(), stats)
    }

    async fn settle(generator: &PdfGenerator) {
        tokio::time::timeout(Duration::from_secs(5), generator.wait_idle()).await.unwrap();
    }

    #[tokio::test]
    async fn url_to_base64() {
        let dir = tempfile::tempdir().unwrap();
        let (generator, stats) =
            build(dir.path(), NullEngine::new().with_page_count(3), Arc::new(UnavailableShareSheet));

        let result = generator
            .from_url(json!({ "url": "https://example.com", "type": "base64" }))
            .unwrap()
            .await
            .unwrap();

        let GenerationResult::Base64 { base64 } = result else { panic!("expected base64 output") };
        assert!(!base64.is_empty());
        let pdf = String::from_utf8(STANDARD.decode(base64).unwrap()).unwrap();
        assert!(pdf.starts_with("%PDF-1.4"));
        assert!(pdf.contains("/Count 3"));

        settle(&generator).await;
        assert_eq!(generator.in_flight(), 0);
        assert_eq!(stats.surfaces_alive(), 0);
    }

    #[tokio::test]
    async fn data_to_shared_file() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = Arc::new(RecordingShareSheet::default());
        let (generator, _) = build(dir.path(), NullEngine::new(), sheet.clone());

        let result = generator
            .from_data(json!({ "data": "<html><body>Hi</body></html>", "type": "share", "fileName": "report" }))
            .unwrap()
            .await
            .unwrap();

        assert_eq!(result, GenerationResult::Share { completed: true });
        assert_eq!(serde_json::to_value(&result).unwrap(), json!({ "type": "share", "completed": true }));

        let expected = dir.path().join("out").join("report.pdf");
        assert!(fs_len(&expected) > 0);

        let requests = sheet.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, expected);
        assert_eq!(requests[0].mime_type, PDF_MIME_TYPE);
        assert_eq!(requests[0].title, "report.pdf");
    }

    fn fs_len(path: &std::path::Path) -> u64 {
        std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
    }

    #[tokio::test]
    async fn load_failure_is_rejected_and_task_removed() {
        let dir = tempfile::tempdir().unwrap();
        let engine = NullEngine::new().with_load(LoadBehavior::Fail("net::ERR_NAME_NOT_RESOLVED".into()));
        let (generator, stats) = build(dir.path(), engine, Arc::new(UnavailableShareSheet));

        let err = generator.from_url(json!({ "url": "https://nowhere.invalid" })).unwrap().await.unwrap_err();

        assert!(err.to_string().contains("net::ERR_NAME_NOT_RESOLVED"));
        assert!(matches!(err, GeneratorError::Load(_)));
        settle(&generator).await;
        assert_eq!(generator.in_flight(), 0);
        assert_eq!(stats.surfaces_alive(), 0);
    }

    #[tokio::test]
    async fn missing_input_is_rejected_synchronously() {
        let dir = tempfile::tempdir().unwrap();
        let (generator, stats) = build(dir.path(), NullEngine::new(), Arc::new(UnavailableShareSheet));
        let mut events = generator.subscribe_events();

        let err = generator.from_url(json!({})).err().unwrap();
        assert_eq!(err.to_string(), "A valid 'url' is required.");
        assert_eq!(generator.from_url(json!({ "url": "   " })).err(), Some(GeneratorError::missing_url()));
        assert_eq!(generator.from_data(json!({ "data": "" })).err(), Some(GeneratorError::missing_data()));

        assert_eq!(generator.in_flight(), 0);
        assert!(events.try_recv().is_err());
        assert_eq!(stats.surfaces_created(), 0);
    }

    #[tokio::test]
    async fn events_follow_the_task_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let (generator, _) = build(dir.path(), NullEngine::new(), Arc::new(UnavailableShareSheet));
        let mut events = generator.subscribe_events();

        let pending = generator.from_data(json!({ "data": "<p>x</p>" })).unwrap();
        let task_id = pending.task_id();
        pending.await.unwrap();

        let mut seen = vec![];
        loop {
            let event = events.recv().await.unwrap();
            let done = matches!(event, GeneratorEvent::TaskFinished { .. });
            seen.push(event);
            if done {
                break;
            }
        }

        assert_eq!(
            seen,
            vec![
                GeneratorEvent::TaskAdmitted { task_id, source: "html" },
                GeneratorEvent::LoadStarted { task_id },
                GeneratorEvent::LoadFinished { task_id, url: "about:blank".into() },
                GeneratorEvent::ProduceStarted { task_id },
                GeneratorEvent::TaskCompleted { task_id },
                GeneratorEvent::TaskFinished { task_id },
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_tasks_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = Arc::new(RecordingShareSheet::default());
        let (generator, stats) = build(dir.path(), NullEngine::new().with_page_count(2), sheet.clone());

        let mut pending = vec![];
        for i in 0..12 {
            let request = match i % 3 {
                0 => generator.from_url(json!({ "url": format!("https://example.com/{i}") })),
                1 => generator.from_data(json!({ "data": format!("<p>{i}</p>"), "documentSize": "A3" })),
                _ => generator.from_data(json!({ "data": "<p>s</p>", "type": "share", "fileName": format!("doc-{i}") })),
            };
            pending.push(request.unwrap());
        }

        let ids: std::collections::HashSet<TaskId> = pending.iter().map(|p| p.task_id()).collect();
        assert_eq!(ids.len(), 12);

        for result in futures::future::join_all(pending).await {
            assert!(result.is_ok());
        }

        settle(&generator).await;
        assert_eq!(stats.surfaces_created(), 12);
        assert_eq!(stats.surfaces_destroyed(), 12);
        assert_eq!(sheet.requests.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn cancelled_task_delivers_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (generator, stats) =
            build(dir.path(), NullEngine::new().with_load(LoadBehavior::Hang), Arc::new(UnavailableShareSheet));
        let mut events = generator.subscribe_events();

        let pending = generator.from_url(json!({ "url": "https://example.com" })).unwrap();
        loop {
            if let GeneratorEvent::LoadStarted { .. } = events.recv().await.unwrap() {
                break;
            }
        }
        pending.cancel();

        assert_eq!(pending.await, Err(GeneratorError::Cancelled));
        settle(&generator).await;
        assert_eq!(stats.surfaces_alive(), 0);
    }

    #[tokio::test]
    async fn cancel_all_stops_everything() {
        let dir = tempfile::tempdir().unwrap();
        let (generator, stats) =
            build(dir.path(), NullEngine::new().with_load(LoadBehavior::Hang), Arc::new(UnavailableShareSheet));

        let a = generator.from_url(json!({ "url": "https://example.com/a" })).unwrap();
        let b = generator.from_data(json!({ "data": "<p>b</p>" })).unwrap();
        assert_eq!(generator.in_flight(), 2);

        generator.cancel_all();
        assert_eq!(a.await, Err(GeneratorError::Cancelled));
        assert_eq!(b.await, Err(GeneratorError::Cancelled));

        settle(&generator).await;
        assert_eq!(stats.surfaces_alive(), 0);
    }

    #[tokio::test]
    async fn share_failures_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (generator, _) = build(dir.path(), NullEngine::new(), Arc::new(UnavailableShareSheet));
        let err = generator.from_data(json!({ "data": "<p>x</p>", "type": "share" })).unwrap().await.unwrap_err();
        assert_eq!(err, GeneratorError::Share(ShareError::NoPresenter));
        assert_eq!(err.to_string(), "Unable to open share dialog: no active activity.");

        let dir = tempfile::tempdir().unwrap();
        let sheet = Arc::new(RecordingShareSheet { fail_with: Some(ShareError::NoHandler), ..Default::default() });
        let (generator, _) = build(dir.path(), NullEngine::new(), sheet);
        let err = generator.from_data(json!({ "data": "<p>x</p>", "type": "SHARE" })).unwrap().await.unwrap_err();
        assert_eq!(err.to_string(), "No compatible application found to share the PDF.");
    }

    #[tokio::test]
    async fn requests_after_shutdown_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (generator, stats) = build(dir.path(), NullEngine::new(), Arc::new(UnavailableShareSheet));
        let mut events = generator.subscribe_events();

        generator.shutdown().await;
        assert_eq!(events.recv().await.unwrap(), GeneratorEvent::HostDetached);

        let err = generator.from_url(json!({ "url": "https://example.com" })).unwrap().await.unwrap_err();
        assert_eq!(err, GeneratorError::HostUnavailable);
        assert_eq!(err.to_string(), "No activity available.");

        settle(&generator).await;
        assert_eq!(stats.surfaces_created(), 0);

        // A second shutdown has nothing left to do
        generator.shutdown().await;
    }

    #[tokio::test]
    async fn plugin_version_is_the_crate_version() {
        let dir = tempfile::tempdir().unwrap();
        let (generator, _) = build(dir.path(), NullEngine::new(), Arc::new(UnavailableShareSheet));
        assert_eq!(generator.plugin_version(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn base64_result_serializes_with_type_tag() {
        let result = GenerationResult::Base64 { base64: "JVBERi0=".into() };
        assert_eq!(serde_json::to_value(&result).unwrap(), json!({ "type": "base64", "base64": "JVBERi0=" }));
    }

    /// Null backend that remembers the base URL of every markup load.
    struct BaseUrlRecorder {
        inner: NullEngine,
        base_urls: Arc<Mutex<Vec<Option<String>>>>,
    }

    struct BaseUrlRecordingSurface {
        inner: Box<dyn RenderSurface>,
        base_urls: Arc<Mutex<Vec<Option<String>>>>,
    }

    impl RenderEngine for BaseUrlRecorder {
        fn name(&self) -> &str {
            "base-url-recorder"
        }

        fn create_surface(&mut self, settings: &SurfaceSettings) -> anyhow::Result<Box<dyn RenderSurface>> {
            let inner = self.inner.create_surface(settings)?;
            Ok(Box::new(BaseUrlRecordingSurface { inner, base_urls: self.base_urls.clone() }))
        }
    }

    impl RenderSurface for BaseUrlRecordingSurface {
        fn set_observer(&mut self, observer: Option<LoadObserver>) {
            self.inner.set_observer(observer)
        }

        fn load_url(&mut self, url: &str) {
            self.inner.load_url(url)
        }

        fn load_html(&mut self, markup: &str, base_url: Option<&str>, mime_type: &str, encoding: &str) {
            self.base_urls.lock().unwrap().push(base_url.map(str::to_string));
            self.inner.load_html(markup, base_url, mime_type, encoding)
        }

        fn stop_loading(&mut self) {
            self.inner.stop_loading()
        }

        fn create_print_adapter(&mut self, job_name: &str) -> anyhow::Result<Box<dyn PrintAdapter>> {
            self.inner.create_print_adapter(job_name)
        }

        fn destroy(&mut self) {
            self.inner.destroy()
        }
    }

    #[tokio::test]
    async fn bundle_base_url_loads_from_the_bundle_root() {
        let dir = tempfile::tempdir().unwrap();
        let base_urls = Arc::new(Mutex::new(Vec::new()));
        let engine = BaseUrlRecorder { inner: NullEngine::new(), base_urls: base_urls.clone() };
        let config = GeneratorConfig::builder().cache_dir(dir.path().join("cache")).build().unwrap();
        let generator = PdfGenerator::new(Some(config), Box::new(engine), Arc::new(UnavailableShareSheet)).unwrap();

        generator
            .from_data(json!({ "data": "<img src=\"logo.png\">", "baseUrl": "BUNDLE" }))
            .unwrap()
            .await
            .unwrap();
        generator
            .from_data(json!({ "data": "<p>plain</p>" }))
            .unwrap()
            .await
            .unwrap();

        assert_eq!(
            *base_urls.lock().unwrap(),
            vec![Some("file:///android_asset/".to_string()), None]
        );
    }

    #[tokio::test]
    async fn legacy_landscape_string_turns_the_page() {
        let dir = tempfile::tempdir().unwrap();
        let (generator, _) = build(dir.path(), NullEngine::new(), Arc::new(UnavailableShareSheet));

        let result = generator
            .from_data(json!({ "data": "<p>wide</p>", "landscape": "landscape", "documentSize": "A4" }))
            .unwrap()
            .await
            .unwrap();

        let GenerationResult::Base64 { base64 } = result else { panic!("expected base64 output") };
        let pdf = String::from_utf8(STANDARD.decode(base64).unwrap()).unwrap();
        assert!(pdf.contains("/MediaBox [0 0 841.82 595.22]"));
    }
}
