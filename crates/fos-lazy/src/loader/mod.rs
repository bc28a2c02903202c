//! Loader Registry
//!
//! Loaders are pluggable units that try to load the resource behind one
//! element and settle its [`Responder`] exactly once. They are looked up
//! by the name found in the element's loader attribute; one loader may be
//! registered under several aliases and may be limited to certain tags.
//!
//! # Example
//! ```rust
//! use fos_lazy::loader::{LoadContext, LoaderRegistry};
//! use fos_lazy::Responder;
//!
//! fn always_ok(_cx: LoadContext, responder: Responder) {
//!     responder.succeed();
//! }
//!
//! let mut registry = LoaderRegistry::with_builtins();
//! registry.register(["ok", "always-ok"], None, always_ok);
//! assert!(registry.resolve("always-ok", "div").is_ok());
//! assert!(registry.resolve("youtube", "div").is_err());
//! ```

mod ajax;
mod av;
mod iframe;
pub(crate) mod image;
mod noop;
mod picture;
mod script;
mod youtube;

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

use fos_dom::NodeId;
use smol::LocalExecutor;
use smol::future::BoxedLocal;

pub use av::parse_source_list;
pub use youtube::embed_url;

use crate::{Config, LazyError, Platform, Responder, Result, SharedDocument};

/// Load capability for one element.
pub trait Loader {
    fn load(&self, cx: LoadContext, responder: Responder);
}

impl<F> Loader for F
where
    F: Fn(LoadContext, Responder),
{
    fn load(&self, cx: LoadContext, responder: Responder) {
        self(cx, responder)
    }
}

/// Everything a loader may touch while handling one element.
///
/// Cheap to clone; clones move into spawned futures.
#[derive(Clone)]
pub struct LoadContext {
    node: NodeId,
    document: SharedDocument,
    platform: Rc<dyn Platform>,
    config: Rc<Config>,
    executor: Rc<LocalExecutor<'static>>,
}

impl LoadContext {
    pub(crate) fn new(
        node: NodeId,
        document: SharedDocument,
        platform: Rc<dyn Platform>,
        config: Rc<Config>,
        executor: Rc<LocalExecutor<'static>>,
    ) -> Self {
        Self {
            node,
            document,
            platform,
            config,
            executor,
        }
    }

    /// Element being loaded
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    pub fn platform(&self) -> &Rc<dyn Platform> {
        &self.platform
    }

    pub fn config(&self) -> &Rc<Config> {
        &self.config
    }

    /// Lowercase tag of the element
    pub fn tag(&self) -> String {
        self.document.borrow().tag_name(self.node).unwrap_or_default().to_string()
    }

    /// Owned copy of an attribute of the element
    pub fn attr(&self, name: &str) -> Option<String> {
        self.document.borrow().attr(self.node, name).map(str::to_string)
    }

    /// Run a future on the instance executor
    pub fn spawn(&self, future: impl Future<Output = ()> + 'static) {
        self.executor.spawn(future).detach();
    }

    /// Settle `responder` once `load` completes
    pub fn settle_when(&self, responder: Responder, load: BoxedLocal<Result<()>>) {
        let node = self.node;
        self.spawn(async move {
            match load.await {
                Ok(()) => responder.succeed(),
                Err(err) => {
                    tracing::debug!(node = %node, "load failed: {}", err);
                    responder.fail();
                }
            }
        });
    }
}

struct LoaderEntry {
    loader: Rc<dyn Loader>,
    tags: Option<Vec<String>>,
}

impl Clone for LoaderEntry {
    fn clone(&self) -> Self {
        Self {
            loader: Rc::clone(&self.loader),
            tags: self.tags.clone(),
        }
    }
}

/// Name → loader table shared by instances
#[derive(Clone, Default)]
pub struct LoaderRegistry {
    entries: HashMap<String, LoaderEntry>,
}

impl LoaderRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in loaders
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        ajax::register(&mut registry);
        av::register(&mut registry);
        iframe::register(&mut registry);
        noop::register(&mut registry);
        picture::register(&mut registry);
        script::register(&mut registry);
        youtube::register(&mut registry);
        registry
    }

    /// Register `loader` under every name in `names`.
    ///
    /// With `tags`, the loader only accepts elements of those tag names.
    /// A later registration under the same name replaces the earlier one.
    pub fn register<I, S>(&mut self, names: I, tags: Option<&[&str]>, loader: impl Loader + 'static)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entry = LoaderEntry {
            loader: Rc::new(loader),
            tags: tags.map(|t| t.iter().map(|tag| tag.to_ascii_lowercase()).collect()),
        };
        for name in names {
            let name = name.as_ref().trim().to_ascii_lowercase();
            tracing::trace!("registered loader '{}'", name);
            self.entries.insert(name, entry.clone());
        }
    }

    /// Find the loader for `name` that accepts an element with `tag`
    pub fn resolve(&self, name: &str, tag: &str) -> Result<Rc<dyn Loader>> {
        let key = name.trim().to_ascii_lowercase();
        let entry = self
            .entries
            .get(&key)
            .ok_or_else(|| LazyError::UnknownLoader(name.to_string()))?;

        if let Some(tags) = &entry.tags {
            if !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                return Err(LazyError::UnsupportedElement {
                    loader: key,
                    tag: tag.to_string(),
                });
            }
        }
        Ok(Rc::clone(&entry.loader))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.trim().to_ascii_lowercase())
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderRegistry").field("names", &self.names()).finish()
    }
}

thread_local! {
    static DEFAULT_REGISTRY: RefCell<Option<Rc<LoaderRegistry>>> = const { RefCell::new(None) };
}

/// Shared registry with the built-ins, created on first use.
///
/// Instances built without an explicit registry use this one.
pub fn default_registry() -> Rc<LoaderRegistry> {
    DEFAULT_REGISTRY.with(|slot| {
        Rc::clone(slot.borrow_mut().get_or_insert_with(|| Rc::new(LoaderRegistry::with_builtins())))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(_cx: LoadContext, responder: Responder) {
        responder.succeed();
    }

    #[test]
    fn test_builtin_names() {
        let registry = LoaderRegistry::with_builtins();
        for name in [
            "ajax", "get", "post", "audio", "video", "iframe", "noop", "noop-success",
            "noop-error", "pic", "picture", "js", "javascript", "script", "yt", "youtube",
        ] {
            assert!(registry.contains(name), "missing builtin '{}'", name);
        }
        assert_eq!(registry.len(), 16);
    }

    #[test]
    fn test_aliases_and_case() {
        let mut registry = LoaderRegistry::new();
        registry.register(["Custom", "alias"], None, ok);

        assert!(registry.resolve("custom", "div").is_ok());
        assert!(registry.resolve(" ALIAS ", "div").is_ok());
        assert_eq!(registry.names(), vec!["alias", "custom"]);
    }

    #[test]
    fn test_tag_filter() {
        let registry = LoaderRegistry::with_builtins();

        assert!(registry.resolve("youtube", "IFRAME").is_ok());
        match registry.resolve("youtube", "div") {
            Err(LazyError::UnsupportedElement { loader, tag }) => {
                assert_eq!(loader, "youtube");
                assert_eq!(tag, "div");
            }
            _ => panic!("expected UnsupportedElement"),
        }
    }

    #[test]
    fn test_unknown_loader() {
        let registry = LoaderRegistry::new();
        assert!(matches!(registry.resolve("missing", "div"), Err(LazyError::UnknownLoader(name)) if name == "missing"));
    }

    #[test]
    fn test_default_registry_is_shared() {
        let a = default_registry();
        let b = default_registry();
        assert!(Rc::ptr_eq(&a, &b));
        assert!(a.contains("noop"));
    }
}
