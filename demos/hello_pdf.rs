use pdf_generator::errors::ShareError;
use pdf_generator::render::backends::null::NullEngine;
use pdf_generator::share::{ShareRequest, ShareSheet};
use pdf_generator::{GeneratorConfig, PdfGenerator};
use serde_json::json;
use std::sync::Arc;

/// Pretends to present the share sheet by logging the request.
struct LoggingShareSheet;

impl ShareSheet for LoggingShareSheet {
    fn present(&self, request: &ShareRequest) -> Result<(), ShareError> {
        log::info!("Sharing '{}' ({}) from {}", request.title, request.mime_type, request.path.display());
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = GeneratorConfig::builder()
        .cache_dir(std::env::temp_dir().join("hello-pdf"))
        .build()?;

    let generator = PdfGenerator::new(
        Some(config),
        Box::new(NullEngine::new().with_page_count(2)),
        Arc::new(LoggingShareSheet),
    )?;
    println!("pdf-generator {}", generator.plugin_version());

    let mut events = generator.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            log::debug!("event: {:?}", event);
        }
    });

    let inline = generator
        .from_url(json!({ "url": "https://example.com", "documentSize": "A4" }))?
        .await?;
    println!("{}", serde_json::to_string(&inline)?);

    let shared = generator
        .from_data(json!({
            "data": "<html><body><h1>Hello PDF</h1></body></html>",
            "type": "share",
            "fileName": "hello",
            "landscape": true,
        }))?
        .await?;
    println!("{}", serde_json::to_string(&shared)?);

    generator.shutdown().await;
    Ok(())
}
