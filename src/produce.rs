//! Document production.
//!
//! Runs the two-phase protocol (layout, then write all pages) against a print adapter and
//! materializes the output either as base64 text (through a process-private temporary file) or
//! as a file at the shared destination path.

use crate::config::GeneratorConfig;
use crate::errors::{FilesystemError, GeneratorError};
use crate::executor::ConfinedExecutor;
use crate::options::{GenerationOptions, OutputMode};
use crate::render::{PageRange, PrintAttributes};
use crate::task::TaskId;
use base64::Engine as _;
use std::fs::{self, File, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// A finished document, in the representation the request asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProducedDocument {
    Encoded(String),
    File(PathBuf),
}

pub struct DocumentProducer {
    config: Arc<GeneratorConfig>,
    executor: Arc<ConfinedExecutor>,
}

impl DocumentProducer {
    pub fn new(config: Arc<GeneratorConfig>, executor: Arc<ConfinedExecutor>) -> Self {
        Self { config, executor }
    }

    /// Where a shared file for these options ends up.
    pub fn destination(&self, options: &GenerationOptions) -> PathBuf {
        self.config.output_dir().join(&options.file_name)
    }

    /// Produce the document described by `options` from the content loaded on the task's surface.
    ///
    /// Dropping the returned future mid-way (cancellation) deletes the temporary file, if any.
    pub async fn produce(
        &self,
        task_id: TaskId,
        options: &GenerationOptions,
        cancel: CancellationToken,
    ) -> Result<ProducedDocument, GeneratorError> {
        let job_name = options.print_job_name().to_string();
        self.executor
            .call(move |ctx| ctx.surfaces.prepare_print(task_id, &job_name))
            .await??;

        let attributes = options.print_attributes(self.config.resolution_dpi);

        match options.output_mode {
            OutputMode::InlineEncoded => {
                let temp = create_temp_file(&self.config.cache_dir, &self.config.temp_prefix)?;
                let output = temp.as_file().try_clone().map_err(|e| {
                    log::warn!("Cannot reopen temporary file: {}", e);
                    GeneratorError::from(FilesystemError::TempFile)
                })?;
                self.run_protocol(task_id, attributes, output, cancel).await?;
                encode_base64(temp).await.map(ProducedDocument::Encoded)
            }
            OutputMode::SharedFile => {
                let path = self.destination(options);
                let file = prepare_destination(&path)?;
                self.run_protocol(task_id, attributes, file, cancel).await?;
                Ok(ProducedDocument::File(path))
            }
        }
    }

    /// Layout with the page geometry, then write every page into `output`.
    ///
    /// Both phases start on the confined thread. Only their completion is awaited here.
    async fn run_protocol(
        &self,
        task_id: TaskId,
        attributes: PrintAttributes,
        output: File,
        cancel: CancellationToken,
    ) -> Result<(), GeneratorError> {
        let (reply, done) = oneshot::channel();
        let token = cancel.clone();
        self.executor
            .call(move |ctx| ctx.surfaces.layout(task_id, &attributes, token, reply))
            .await??;

        let info = done
            .await
            .unwrap_or_else(|_| Err("print adapter dropped the layout request".to_string()))
            .map_err(GeneratorError::Layout)?;

        log::debug!("Task[{}]: layout finished for '{}' ({:?} pages)", task_id, info.name, info.page_count);

        let (reply, done) = oneshot::channel();
        self.executor
            .call(move |ctx| ctx.surfaces.write(task_id, PageRange::All, output, cancel, reply))
            .await??;

        done.await
            .unwrap_or_else(|_| Err("print adapter dropped the write request".to_string()))
            .map_err(GeneratorError::Write)
    }
}

fn create_temp_file(dir: &Path, prefix: &str) -> Result<NamedTempFile, GeneratorError> {
    let created = fs::create_dir_all(dir).and_then(|_| {
        tempfile::Builder::new()
            .prefix(prefix)
            .suffix(".pdf")
            .tempfile_in(dir)
    });

    created.map_err(|e| {
        log::warn!("Cannot create temporary file in {}: {}", dir.display(), e);
        FilesystemError::TempFile.into()
    })
}

/// Replace whatever is at `path` with a fresh, empty file. Deleting an existing file and creating
/// missing parent directories must both succeed.
pub fn prepare_destination(path: &Path) -> Result<File, GeneratorError> {
    if path.exists() && fs::remove_file(path).is_err() {
        return Err(FilesystemError::OverrideExisting.into());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() && fs::create_dir_all(parent).is_err() {
            return Err(FilesystemError::OutputDirectory.into());
        }
    }

    OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(|e| {
            log::warn!("Cannot open {}: {}", path.display(), e);
            FilesystemError::OutputFile.into()
        })
}

/// Read the temp file back and encode it on a blocking worker. The temp file is deleted
/// afterwards whatever the outcome.
async fn encode_base64(temp: NamedTempFile) -> Result<String, GeneratorError> {
    let encoded = tokio::task::spawn_blocking(move || {
        let result = read_all(temp.path()).map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes));

        if let Err(e) = temp.close() {
            log::warn!("Cannot delete temporary PDF file: {}", e);
        }
        result
    })
    .await;

    match encoded {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => {
            log::warn!("Cannot read produced PDF: {}", e);
            Err(GeneratorError::Encoding)
        }
        Err(_) => Err(GeneratorError::Encoding),
    }
}

fn read_all(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    File::open(path)?.read_to_end(&mut bytes)?;
    Ok(bytes)
}
