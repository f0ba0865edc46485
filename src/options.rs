//! Request options model.
//!
//! [`GenerationOptions::parse`] turns loosely-typed [`CallOptions`] into an immutable descriptor.
//! Parsing never fails: every field has a default and unrecognized values fall back to it.

use crate::render::{Margins, MediaSize, PrintAttributes, Resolution};
use crate::request::CallOptions;

const DEFAULT_FILE_NAME: &str = "default.pdf";
const PDF_EXTENSION: &str = ".pdf";
const BUNDLE_SENTINEL: &str = "BUNDLE";

/// How the produced document is handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Return the document as base64 text.
    #[default]
    InlineEncoded,
    /// Write the document to a file and hand it to the native share facility.
    SharedFile,
}

impl OutputMode {
    /// `"share"` (any case) selects [`OutputMode::SharedFile`]; everything else is inline.
    pub fn from_type(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("share") => OutputMode::SharedFile,
            _ => OutputMode::InlineEncoded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSize {
    #[default]
    A4,
    A3,
}

impl PageSize {
    /// `"A3"` (any case) selects A3; everything else is A4.
    pub fn from_name(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("A3") => PageSize::A3,
            _ => PageSize::A4,
        }
    }

    pub fn media_size(self) -> MediaSize {
        match self {
            PageSize::A4 => MediaSize::ISO_A4,
            PageSize::A3 => MediaSize::ISO_A3,
        }
    }
}

/// Validated configuration of a single generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    pub output_mode: OutputMode,
    pub page_size: PageSize,
    pub landscape: bool,
    /// Always ends in `.pdf` and never contains `/`, `\` or `:`.
    pub file_name: String,
    pub base_url: Option<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            output_mode: OutputMode::default(),
            page_size: PageSize::default(),
            landscape: false,
            file_name: DEFAULT_FILE_NAME.to_string(),
            base_url: None,
        }
    }
}

impl GenerationOptions {
    /// Parse call options. `bundle_root` is what the `BUNDLE` base URL maps to.
    pub fn parse(call: &CallOptions, bundle_root: &str) -> Self {
        Self {
            output_mode: OutputMode::from_type(call.get_str("type")),
            page_size: PageSize::from_name(call.get_str("documentSize")),
            landscape: resolve_landscape(call),
            file_name: sanitize_file_name(call.get_str("fileName")),
            base_url: normalize_base_url(call.get_str("baseUrl"), bundle_root),
        }
    }

    /// Media size with the requested orientation applied.
    pub fn media_size(&self) -> MediaSize {
        let media = self.page_size.media_size();
        if self.landscape { media.as_landscape() } else { media.as_portrait() }
    }

    /// Full page geometry for the layout phase: media, fixed resolution and no margins.
    pub fn print_attributes(&self, resolution_dpi: u32) -> PrintAttributes {
        PrintAttributes {
            media_size: self.media_size(),
            resolution: Resolution::pdf(resolution_dpi),
            margins: Margins::NO_MARGINS,
        }
    }

    /// The file name without its final extension.
    pub fn print_job_name(&self) -> &str {
        match self.file_name.rfind('.') {
            Some(idx) if idx > 0 => &self.file_name[..idx],
            _ => &self.file_name,
        }
    }
}

/// Boolean `landscape` wins, then the `orientation` string, then the legacy `landscape` string.
fn resolve_landscape(call: &CallOptions) -> bool {
    if let Some(flag) = call.get_bool("landscape") {
        return flag;
    }
    if let Some(orientation) = call.get_str("orientation") {
        return orientation.trim().eq_ignore_ascii_case("landscape");
    }
    call.get_str("landscape")
        .map(|legacy| legacy.trim().eq_ignore_ascii_case("landscape"))
        .unwrap_or(false)
}

fn sanitize_file_name(raw: Option<&str>) -> String {
    let trimmed = raw.map(str::trim).unwrap_or_default();
    let name = if trimmed.is_empty() { DEFAULT_FILE_NAME } else { trimmed };

    let mut sanitized: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();

    if !sanitized.to_ascii_lowercase().ends_with(PDF_EXTENSION) {
        sanitized.push_str(PDF_EXTENSION);
    }
    sanitized
}

fn normalize_base_url(raw: Option<&str>, bundle_root: &str) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.eq_ignore_ascii_case(BUNDLE_SENTINEL) {
        return Some(bundle_root.to_string());
    }
    Some(trimmed.to_string())
}
