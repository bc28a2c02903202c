//! fOS Lazy
//!
//! Viewport-driven deferred loading. An instance watches a set of
//! elements and loads each one once it comes within a threshold of the
//! viewport: images and backgrounds through the built-in image path, and
//! anything carrying a loader attribute through the loader registry.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use std::time::Instant;
//!
//! use fos_dom::Document;
//! use fos_lazy::{Config, Lazy, LazyEvent, ScrollTarget};
//!
//! let document = Rc::new(RefCell::new(Document::new("https://example.com/")));
//! let mut lazy = Lazy::builder(document.clone(), platform)
//!     .items(images)
//!     .config(Config::from_json(r#"{ "threshold": 200 }"#)?)
//!     .after_load(|node, doc| println!("{} -> {:?}", node, doc.attr(node, "src")))
//!     .build(Instant::now())?;
//!
//! lazy.handle_event(LazyEvent::PageLoad, Instant::now());
//! lazy.handle_event(LazyEvent::Scroll(ScrollTarget::Window), Instant::now());
//! lazy.tick(Instant::now());
//! ```

mod callbacks;
mod config;
mod error;
mod instance;
mod item;
mod platform;
mod responder;

pub mod loader;
pub mod queue;
pub mod throttle;
pub mod viewport;

#[cfg(feature = "net")]
pub mod net;

use std::cell::RefCell;
use std::rc::Rc;

use fos_dom::Document;

pub use callbacks::{ElementCallback, FinishedCallback};
pub use config::{Bind, Config, DEFAULT_IMAGE, ScrollDirection, ScrollTarget};
pub use error::{LazyError, Result};
pub use instance::{Lazy, LazyBuilder, LazyEvent};
pub use item::{ElementKind, classify, is_candidate};
pub use loader::{LoadContext, Loader, LoaderRegistry, default_registry};
pub use platform::{FetchRequest, Method, Platform, ResourceKind};
pub use responder::{DispatchId, Responder, Settlement};

/// Document shared between the host, the instance and running loaders
pub type SharedDocument = Rc<RefCell<Document>>;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
