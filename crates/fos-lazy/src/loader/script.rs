//! `<script>` loader

use crate::{ResourceKind, Responder};

use super::{LoadContext, LoaderRegistry};

pub(super) fn register(registry: &mut LoaderRegistry) {
    registry.register(["js", "javascript", "script"], Some(&["script"]), load_script);
}

fn load_script(cx: LoadContext, responder: Responder) {
    let attribute = cx.config().attribute.clone();
    let Some(url) = cx.attr(&attribute) else {
        responder.fail();
        return;
    };

    {
        let mut doc = cx.document().borrow_mut();
        if doc.set_attr(cx.node(), "src", &url).is_err() {
            drop(doc);
            responder.fail();
            return;
        }
        if cx.config().remove_attribute {
            doc.remove_attrs(cx.node(), &[attribute.as_str()]);
        }
    }

    let load = cx.platform().load_resource(ResourceKind::Script, &url);
    cx.settle_when(responder, load);
}
