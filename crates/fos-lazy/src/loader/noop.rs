//! Loaders that do nothing, for debugging and tests.
//!
//! `noop` never settles, `noop-success` and `noop-error` settle at once.

use crate::Responder;

use super::{LoadContext, LoaderRegistry};

pub(super) fn register(registry: &mut LoaderRegistry) {
    registry.register(["noop"], None, |cx: LoadContext, responder: Responder| {
        tracing::debug!(node = %cx.node(), "noop loader");
        responder.abandon();
    });
    registry.register(["noop-success"], None, |_: LoadContext, responder: Responder| {
        responder.succeed();
    });
    registry.register(["noop-error"], None, |_: LoadContext, responder: Responder| {
        responder.fail();
    });
}
