use crate::errors::ShareError;
use std::path::PathBuf;

pub const PDF_MIME_TYPE: &str = "application/pdf";

/// A produced file to offer through the native share facility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRequest {
    pub path: PathBuf,
    pub mime_type: &'static str,
    /// Title shown on the share sheet (the output file name).
    pub title: String,
}

/// The host's native "share this file" facility.
///
/// `present` is always called on the confined thread. Returning `Ok` means the share sheet was
/// shown; what the user then picks is not reported back.
pub trait ShareSheet: Send + Sync {
    fn present(&self, request: &ShareRequest) -> Result<(), ShareError>;
}

/// Share sheet for hosts without any UI to present on.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableShareSheet;

impl ShareSheet for UnavailableShareSheet {
    fn present(&self, _request: &ShareRequest) -> Result<(), ShareError> {
        Err(ShareError::NoPresenter)
    }
}
