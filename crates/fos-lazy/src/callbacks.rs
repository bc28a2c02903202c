//! User callbacks

use std::fmt;

use fos_dom::{Document, NodeId};

/// Called with the element and mutable access to its document
pub type ElementCallback = Box<dyn FnMut(NodeId, &mut Document)>;

/// Called once every item has settled
pub type FinishedCallback = Box<dyn FnMut()>;

#[derive(Default)]
pub(crate) struct Callbacks {
    pub before_load: Option<ElementCallback>,
    pub after_load: Option<ElementCallback>,
    pub on_error: Option<ElementCallback>,
    pub on_finished_all: Option<FinishedCallback>,
}

impl Callbacks {
    pub fn before_load(&mut self, node: NodeId, document: &mut Document) {
        if let Some(callback) = self.before_load.as_mut() {
            callback(node, document);
        }
    }

    pub fn after_load(&mut self, node: NodeId, document: &mut Document) {
        if let Some(callback) = self.after_load.as_mut() {
            callback(node, document);
        }
    }

    pub fn on_error(&mut self, node: NodeId, document: &mut Document) {
        if let Some(callback) = self.on_error.as_mut() {
            callback(node, document);
        }
    }

    pub fn finished_all(&mut self) {
        if let Some(callback) = self.on_finished_all.as_mut() {
            callback();
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("before_load", &self.before_load.is_some())
            .field("after_load", &self.after_load.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_finished_all", &self.on_finished_all.is_some())
            .finish()
    }
}
