//! `<iframe>` loader
//!
//! By default the source is assigned directly. With `data-error-detect`
//! set to `true` or `1` the document is fetched first, so HTTP errors are
//! reported instead of showing an error page inside the frame.

use fos_dom::NodeId;

use crate::{FetchRequest, ResourceKind, Responder, SharedDocument};

use super::{LoadContext, LoaderRegistry};

const ERROR_DETECT_ATTRIBUTE: &str = "data-error-detect";

pub(super) fn register(registry: &mut LoaderRegistry) {
    registry.register(["iframe"], Some(&["iframe"]), load_iframe);
}

fn load_iframe(cx: LoadContext, responder: Responder) {
    let attribute = cx.config().attribute.clone();
    let Some(url) = cx.attr(&attribute) else {
        responder.fail();
        return;
    };
    let detect = matches!(cx.attr(ERROR_DETECT_ATTRIBUTE).as_deref(), Some("true" | "1"));
    let remove = cx.config().remove_attribute;

    if !detect {
        assign(cx.document(), cx.node(), &url, &attribute, remove);
        let load = cx.platform().load_resource(ResourceKind::Frame, &url);
        cx.settle_when(responder, load);
        return;
    }

    let fetch = cx.platform().fetch(FetchRequest::get(&url));
    let node = cx.node();
    let document = cx.document().clone();
    cx.spawn(async move {
        match fetch.await {
            Ok(body) => {
                if document.borrow_mut().set_inner_html(node, &body).is_err() {
                    responder.fail();
                    return;
                }
                assign(&document, node, &url, &attribute, remove);
                responder.succeed();
            }
            Err(err) => {
                tracing::debug!(node = %node, "iframe source failed: {}", err);
                responder.fail();
            }
        }
    });
}

fn assign(document: &SharedDocument, node: NodeId, url: &str, attribute: &str, remove: bool) {
    let mut doc = document.borrow_mut();
    if let Err(err) = doc.set_attr(node, "src", url) {
        tracing::debug!(node = %node, "iframe src not set: {}", err);
    }
    if remove {
        doc.remove_attrs(node, &[attribute, ERROR_DETECT_ATTRIBUTE]);
    }
}
