//! AJAX loaders: fetch a fragment and place it as the element's content.
//!
//! `ajax` honours `data-method` (GET when absent), `get` and `post` pin it.
//! `data-type` selects the expected response type.

use crate::{FetchRequest, Method, Responder};

use super::{LoadContext, LoaderRegistry};

const METHOD_ATTRIBUTE: &str = "data-method";
const TYPE_ATTRIBUTE: &str = "data-type";

pub(super) fn register(registry: &mut LoaderRegistry) {
    registry.register(["ajax"], None, load_ajax);
    registry.register(["get"], None, load_get);
    registry.register(["post"], None, load_post);
}

fn load_ajax(cx: LoadContext, responder: Responder) {
    let method = cx
        .attr(METHOD_ATTRIBUTE)
        .and_then(|m| Method::parse(&m))
        .unwrap_or_default();
    request(cx, responder, method);
}

fn load_get(cx: LoadContext, responder: Responder) {
    request(cx, responder, Method::Get);
}

fn load_post(cx: LoadContext, responder: Responder) {
    request(cx, responder, Method::Post);
}

fn request(cx: LoadContext, responder: Responder, method: Method) {
    let attribute = cx.config().attribute.clone();
    let Some(url) = cx.attr(&attribute) else {
        tracing::debug!(node = %cx.node(), "ajax item without '{}'", attribute);
        responder.fail();
        return;
    };
    let data_type = cx.attr(TYPE_ATTRIBUTE).unwrap_or_else(|| "html".to_string());

    tracing::debug!("{} {} ({})", method.as_str(), url, data_type);
    let fetch = cx
        .platform()
        .fetch(FetchRequest::new(method, &url).with_data_type(&data_type));

    let node = cx.node();
    let remove = cx.config().remove_attribute;
    let document = cx.document().clone();
    cx.spawn(async move {
        let body = match fetch.await {
            Ok(body) => body,
            Err(err) => {
                tracing::debug!(node = %node, "ajax request failed: {}", err);
                responder.fail();
                return;
            }
        };

        let written = {
            let mut doc = document.borrow_mut();
            let written = doc.set_inner_html(node, &body);
            if remove {
                doc.remove_attrs(node, &[attribute.as_str(), METHOD_ATTRIBUTE, TYPE_ATTRIBUTE]);
            }
            written
        };
        responder.settle(written.is_ok());
    });
}
