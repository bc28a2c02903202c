//! Platform seam
//!
//! Everything the engine needs from the outside world besides the document:
//! resource loads that report success or failure, HTTP fetches for the ajax
//! style loaders, and playing a named visual transition.

use std::time::Duration;

use fos_dom::NodeId;
use smol::future::BoxedLocal;

use crate::Result;

/// What kind of element a resource load stands in for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Offscreen image probe
    Image,
    /// `<script src>`
    Script,
    /// `<iframe src>` navigation
    Frame,
    /// One `<source>` of an audio/video element
    Media,
}

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
        }
    }

    /// Parse a method name case-insensitively
    pub fn parse(name: &str) -> Option<Method> {
        let method = match name.trim().to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "HEAD" => Method::Head,
            "OPTIONS" => Method::Options,
            "PATCH" => Method::Patch,
            _ => return None,
        };
        Some(method)
    }
}

/// Request issued by the ajax and iframe loaders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    /// Expected response type: `html`, `json`, `text`, `xml` or `script`
    pub data_type: String,
}

impl FetchRequest {
    pub fn get(url: &str) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: &str) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn new(method: Method, url: &str) -> Self {
        Self {
            method,
            url: url.to_string(),
            data_type: "html".to_string(),
        }
    }

    pub fn with_data_type(mut self, data_type: &str) -> Self {
        self.data_type = data_type.to_ascii_lowercase();
        self
    }

    /// `Accept` header matching the data type
    pub fn accept(&self) -> &'static str {
        match self.data_type.as_str() {
            "html" => "text/html",
            "json" => "application/json",
            "text" => "text/plain",
            "xml" => "application/xml",
            "script" => "text/javascript",
            _ => "*/*",
        }
    }
}

/// Host services consumed by loaders.
///
/// Futures run on the instance's single-threaded executor, so they do not
/// need to be `Send`.
pub trait Platform {
    /// Load `url` the way an element of `kind` would and report the outcome.
    fn load_resource(&self, kind: ResourceKind, url: &str) -> BoxedLocal<Result<()>>;

    /// Fetch a document and return its body text.
    fn fetch(&self, request: FetchRequest) -> BoxedLocal<Result<String>>;

    /// Play a named show transition on an element.
    fn play_effect(&self, node: NodeId, effect: &str, duration: Duration) {
        let _ = (node, effect, duration);
    }
}
