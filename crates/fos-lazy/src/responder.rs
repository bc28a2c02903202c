//! Settle-once responder handed to every loader.
//!
//! A responder is consumed by settling, so a loader cannot report twice.
//! Settlements travel over a channel and are handled by the instance on its
//! next pump, never inside the loader call. Once the instance is destroyed
//! the liveness flag turns late settlements into no-ops.

use std::cell::Cell;
use std::rc::Rc;

use fos_dom::NodeId;
use smol::channel::Sender;

/// Identifies one dispatch of one element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DispatchId(pub(crate) u64);

/// Outcome reported by a loader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub id: DispatchId,
    pub node: NodeId,
    pub success: bool,
}

#[derive(Debug)]
pub struct Responder {
    id: DispatchId,
    node: NodeId,
    sender: Sender<Settlement>,
    alive: Rc<Cell<bool>>,
    settled: bool,
}

impl Responder {
    pub(crate) fn new(
        id: DispatchId,
        node: NodeId,
        sender: Sender<Settlement>,
        alive: Rc<Cell<bool>>,
    ) -> Self {
        Self {
            id,
            node,
            sender,
            alive,
            settled: false,
        }
    }

    /// Element this dispatch belongs to
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Report the outcome of the load
    pub fn settle(mut self, success: bool) {
        self.settled = true;

        if !self.alive.get() {
            tracing::trace!(node = %self.node, "settlement after destroy ignored");
            return;
        }

        let settlement = Settlement {
            id: self.id,
            node: self.node,
            success,
        };
        if self.sender.try_send(settlement).is_err() {
            tracing::trace!(node = %self.node, "settlement channel closed");
        }
    }

    pub fn succeed(self) {
        self.settle(true);
    }

    pub fn fail(self) {
        self.settle(false);
    }

    /// Give up without reporting; the element stays in flight for good.
    pub fn abandon(mut self) {
        self.settled = true;
        tracing::debug!(node = %self.node, "responder abandoned");
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!(
                node = %self.node,
                "loader dropped its responder without settling; element stays in flight"
            );
        }
    }
}
