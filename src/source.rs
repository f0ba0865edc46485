use crate::render::RenderSurface;

const HTML_MIME_TYPE: &str = "text/html";
const HTML_ENCODING: &str = "UTF-8";

/// Where the content of a generation request comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// A remote or local address to fetch and render.
    Url(String),
    /// Inline markup, optionally with a base URL for relative references.
    Html { markup: String, base_url: Option<String> },
}

impl ContentSource {
    /// Instruct the surface to start loading. The outcome arrives later on the surface's observer.
    pub fn begin_load(&self, surface: &mut dyn RenderSurface) {
        match self {
            ContentSource::Url(url) => surface.load_url(url),
            ContentSource::Html { markup, base_url } => {
                surface.load_html(markup, base_url.as_deref(), HTML_MIME_TYPE, HTML_ENCODING)
            }
        }
    }

    /// Short label used in logs and events
    pub fn kind(&self) -> &'static str {
        match self {
            ContentSource::Url(_) => "url",
            ContentSource::Html { .. } => "html",
        }
    }
}
