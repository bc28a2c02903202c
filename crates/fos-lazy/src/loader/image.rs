//! Default image loader
//!
//! Used for every item without a loader attribute. The source is probed
//! offscreen first and only written back once it loaded, so a broken URL
//! never replaces the placeholder.

use fos_dom::{Document, DomError, NodeId};

use crate::item::{css_url, resolve_source};
use crate::{Config, LazyError, Platform, ResourceKind, Responder, SharedDocument};

use super::{LoadContext, Loader};

#[derive(Debug, Clone, Copy, Default)]
pub struct ImageLoader;

impl Loader for ImageLoader {
    fn load(&self, cx: LoadContext, responder: Responder) {
        let node = cx.node();
        let config = cx.config().clone();

        let (source, responsive) = {
            let doc = cx.document().borrow();
            let responsive = (doc.tag_name(node) == Some("img"))
                .then(|| Responsive::read(&doc, node, &config));
            (resolve_source(&doc, node, &config), responsive)
        };

        let Some(source) = source else {
            // srcset alone is enough for an <img>
            let Some(responsive) = responsive.filter(|r| r.srcset.is_some()) else {
                tracing::debug!("{}", LazyError::MissingSource(node));
                responder.fail();
                return;
            };
            let written = responsive.apply(&mut cx.document().borrow_mut(), node);
            match written {
                Ok(()) => {
                    finish(cx.document(), cx.platform().as_ref(), node, &config);
                    responder.succeed();
                }
                Err(err) => {
                    tracing::debug!(node = %node, "srcset not written back: {}", err);
                    responder.fail();
                }
            }
            return;
        };

        let probe = cx.platform().load_resource(ResourceKind::Image, &source);
        let document = cx.document().clone();
        let platform = cx.platform().clone();
        cx.spawn(async move {
            if let Err(err) = probe.await {
                tracing::debug!(node = %node, "image probe failed: {}", err);
                responder.fail();
                return;
            }

            let written = {
                let mut doc = document.borrow_mut();
                match &responsive {
                    Some(responsive) => responsive
                        .apply(&mut doc, node)
                        .and_then(|()| doc.set_attr(node, "src", &source)),
                    None => doc.set_style(node, "background-image", &css_url(&source)),
                }
            };
            match written {
                Ok(()) => {
                    finish(&document, platform.as_ref(), node, &config);
                    responder.succeed();
                }
                Err(err) => {
                    tracing::debug!(node = %node, "image not written back: {}", err);
                    responder.fail();
                }
            }
        });
    }
}

/// `data-srcset`/`data-sizes` of an `<img>`, held until the load succeeded
#[derive(Debug, Default)]
struct Responsive {
    srcset: Option<String>,
    sizes: Option<String>,
}

impl Responsive {
    fn read(doc: &Document, node: NodeId, config: &Config) -> Self {
        Self {
            srcset: doc.attr(node, &config.srcset_attribute).map(str::to_string),
            sizes: doc.attr(node, &config.sizes_attribute).map(str::to_string),
        }
    }

    fn apply(&self, doc: &mut Document, node: NodeId) -> Result<(), DomError> {
        if let Some(sizes) = &self.sizes {
            doc.set_attr(node, "sizes", sizes)?;
        }
        if let Some(srcset) = &self.srcset {
            doc.set_attr(node, "srcset", srcset)?;
        }
        Ok(())
    }
}

fn finish(document: &SharedDocument, platform: &dyn Platform, node: NodeId, config: &Config) {
    if config.remove_attribute {
        document.borrow_mut().remove_attrs(node, &config.image_attributes());
    }
    platform.play_effect(node, &config.effect, config.effect_duration());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_responsive_attrs_written_on_apply() {
        let config = Config::default();
        let mut doc = Document::new("about:blank");
        let img = doc.append_new(doc.body(), "img").unwrap();

        let empty = Responsive::read(&doc, img, &config);
        assert!(empty.srcset.is_none());
        empty.apply(&mut doc, img).unwrap();
        assert_eq!(doc.attr(img, "srcset"), None);

        doc.set_attr(img, "data-srcset", "a.jpg 1x, b.jpg 2x").unwrap();
        doc.set_attr(img, "data-sizes", "100vw").unwrap();
        let responsive = Responsive::read(&doc, img, &config);
        assert_eq!(doc.attr(img, "srcset"), None);

        responsive.apply(&mut doc, img).unwrap();
        assert_eq!(doc.attr(img, "srcset"), Some("a.jpg 1x, b.jpg 2x"));
        assert_eq!(doc.attr(img, "sizes"), Some("100vw"));
    }
}
