/// Errors delivered to the caller of a generation request.
///
/// Every variant renders as a short human-readable message. The message is the whole external
/// contract; the variant only exists so callers and tests can match on the failure class.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeneratorError {
    /// A mandatory request field is missing. Raised synchronously, before any task exists.
    #[error("{0}")]
    Validation(String),

    #[error("Failed to load content: {0}")]
    Load(String),

    #[error("PDF layout failed: {0}")]
    Layout(String),

    #[error("PDF write failed: {0}")]
    Write(String),

    #[error("Failed to convert PDF to base64.")]
    Encoding,

    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    #[error(transparent)]
    Share(#[from] ShareError),

    /// There is no confined UI context to run the render surface on.
    #[error("No activity available.")]
    HostUnavailable,

    /// The task was cancelled and no result was delivered.
    #[error("PDF generation was cancelled.")]
    Cancelled,

    #[error("{0}")]
    Internal(String),
}

impl GeneratorError {
    pub(crate) fn missing_url() -> Self {
        GeneratorError::Validation("A valid 'url' is required.".to_string())
    }

    pub(crate) fn missing_data() -> Self {
        GeneratorError::Validation("The 'data' option is required.".to_string())
    }

    /// Generic wrapper used when something unexpected escapes a boundary.
    pub(crate) fn internal() -> Self {
        GeneratorError::Internal("Unexpected error while generating PDF.".to_string())
    }
}

/// Failures while preparing the file the document is written into.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilesystemError {
    #[error("Failed to create temporary file for PDF.")]
    TempFile,

    #[error("Failed to override existing PDF file.")]
    OverrideExisting,

    #[error("Failed to prepare output directory for PDF.")]
    OutputDirectory,

    #[error("Failed to prepare PDF output file.")]
    OutputFile,
}

/// Failures reported by (or before reaching) the native share facility.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShareError {
    #[error("Unable to open share dialog: no active activity.")]
    NoPresenter,

    #[error("No compatible application found to share the PDF.")]
    NoHandler,

    #[error("Share failed: {0}")]
    Failed(String),
}

/// Invalid values passed to [`GeneratorConfigBuilder`](crate::config::GeneratorConfigBuilder).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("resolution_dpi must be at least 1")]
    ZeroResolution,

    #[error("event_capacity must be at least 1")]
    ZeroEventCapacity,

    #[error("temp_prefix must not be empty")]
    EmptyTempPrefix,

    #[error("bundle_root is not a valid URL: {0}")]
    InvalidBundleRoot(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_human_readable() {
        assert_eq!(GeneratorError::missing_url().to_string(), "A valid 'url' is required.");
        assert_eq!(GeneratorError::missing_data().to_string(), "The 'data' option is required.");
        assert_eq!(
            GeneratorError::Load("net::ERR_NAME_NOT_RESOLVED".into()).to_string(),
            "Failed to load content: net::ERR_NAME_NOT_RESOLVED"
        );
        assert_eq!(GeneratorError::Layout("".into()).to_string(), "PDF layout failed: ");
        assert_eq!(GeneratorError::Encoding.to_string(), "Failed to convert PDF to base64.");
    }

    #[test]
    fn nested_errors_are_transparent() {
        let err: GeneratorError = FilesystemError::OverrideExisting.into();
        assert_eq!(err.to_string(), "Failed to override existing PDF file.");

        let err: GeneratorError = ShareError::NoHandler.into();
        assert_eq!(err.to_string(), "No compatible application found to share the PDF.");
    }
}
