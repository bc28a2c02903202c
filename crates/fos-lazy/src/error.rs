//! Lazy loading errors

use fos_dom::NodeId;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, LazyError>;

/// Errors raised while resolving or running a load.
///
/// None of these escape a scan pass: they settle the affected element as
/// failed and reach the user only through `on_error`.
#[derive(Debug, thiserror::Error)]
pub enum LazyError {
    #[error("No loader registered as '{0}'")]
    UnknownLoader(String),

    #[error("Loader '{loader}' does not handle <{tag}> elements")]
    UnsupportedElement { loader: String, tag: String },

    #[error("Element {0} has no usable source")]
    MissingSource(NodeId),

    #[error("HTTP error: {status}")]
    Http { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to load resource: {url}")]
    Resource { url: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}
