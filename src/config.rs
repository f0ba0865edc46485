//! Generator configuration.
//!
//! `GeneratorConfig` controls where output files are placed, what the `BUNDLE` base URL resolves
//! to and which settings new render surfaces receive. It provides defaults via [`Default`] and a
//! fluent [`GeneratorConfig::builder()`] with validation.
//!
//! # Examples
//!
//! ```rust
//! use pdf_generator::config::GeneratorConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = GeneratorConfig::builder()
//!     .cache_dir(std::env::temp_dir().join("my-app"))
//!     .resolution_dpi(300)
//!     .build()?;
//! assert_eq!(cfg.resolution_dpi, 300);
//! # Ok(()) }
//! ```
//!
//! # Fields (summary)
//! - `cache_dir`: directory for process-private temporary files.
//! - `output_dir`: directory for shared files; `None` means `cache_dir`.
//! - `bundle_root`: URL the `BUNDLE` base URL sentinel maps to.
//! - `resolution_dpi`: fixed print resolution (default: 600).
//! - `temp_prefix`: prefix for temporary file names.
//! - `javascript_enabled` / `dom_storage_enabled`: render surface settings.
//! - `event_capacity`: capacity of the broadcast event bus.

use crate::errors::ConfigError;
use std::path::{Path, PathBuf};
use url::Url;

/// Default capacity for the broadcast event channel
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

const DEFAULT_BUNDLE_ROOT: &str = "file:///android_asset/";
const DEFAULT_TEMP_PREFIX: &str = "pdf_generator";

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub cache_dir: PathBuf,
    pub output_dir: Option<PathBuf>,
    /// Always a valid absolute URL once built; see [`GeneratorConfigBuilder::build`].
    pub bundle_root: String,
    pub resolution_dpi: u32,
    pub temp_prefix: String,
    pub javascript_enabled: bool,
    pub dom_storage_enabled: bool,
    pub event_capacity: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            cache_dir: std::env::temp_dir().join("pdf-generator"),
            output_dir: None,
            bundle_root: DEFAULT_BUNDLE_ROOT.to_string(),
            resolution_dpi: 600,
            temp_prefix: DEFAULT_TEMP_PREFIX.to_string(),
            javascript_enabled: true,
            dom_storage_enabled: true,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl GeneratorConfig {
    pub fn builder() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder::default()
    }

    /// Directory shared files are written into.
    pub fn output_dir(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or(&self.cache_dir)
    }
}

/// Builder for [`GeneratorConfig`].
#[derive(Debug, Clone, Default)]
pub struct GeneratorConfigBuilder {
    inner: GeneratorConfig,
}

impl GeneratorConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut GeneratorConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn cache_dir<P: Into<PathBuf>>(self, dir: P) -> Self { self.map(|c| c.cache_dir = dir.into()) }
    pub fn output_dir<P: Into<PathBuf>>(self, dir: P) -> Self { self.map(|c| c.output_dir = Some(dir.into())) }
    pub fn bundle_root(self, url: Url) -> Self { self.map(|c| c.bundle_root = url.into()) }
    pub fn resolution_dpi(self, dpi: u32) -> Self { self.map(|c| c.resolution_dpi = dpi) }
    pub fn temp_prefix<S: Into<String>>(self, prefix: S) -> Self { self.map(|c| c.temp_prefix = prefix.into()) }
    pub fn javascript_enabled(self, on: bool) -> Self { self.map(|c| c.javascript_enabled = on) }
    pub fn dom_storage_enabled(self, on: bool) -> Self { self.map(|c| c.dom_storage_enabled = on) }
    pub fn event_capacity(self, cap: usize) -> Self { self.map(|c| c.event_capacity = cap) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut GeneratorConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<GeneratorConfig, ConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

fn validate(c: &GeneratorConfig) -> Result<(), ConfigError> {
    if c.resolution_dpi == 0 {
        return Err(ConfigError::ZeroResolution);
    }
    if c.event_capacity == 0 {
        return Err(ConfigError::ZeroEventCapacity);
    }
    if c.temp_prefix.trim().is_empty() {
        return Err(ConfigError::EmptyTempPrefix);
    }
    if Url::parse(&c.bundle_root).is_err() {
        return Err(ConfigError::InvalidBundleRoot(c.bundle_root.clone()));
    }
    Ok(())
}
