//! fOS DOM - Document Object Model
//!
//! Memory-efficient DOM tree implementation, together with the window
//! state (viewport, scroll, pixel ratio) that layout-aware consumers need.

mod node;
mod tree;
mod document;
mod geometry;

pub use node::{Node, NodeData, ElementData};
pub use tree::{DomTree, Children};
pub use document::{Document, ReadyState};
pub use geometry::{DOMRect, ScrollOffset};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node ID
    pub const ROOT: NodeId = NodeId(0);
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// DOM errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Invalid node: {0}")]
    InvalidNode(NodeId),

    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),
}
