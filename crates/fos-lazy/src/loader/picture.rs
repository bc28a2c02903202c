//! `<picture>` loader
//!
//! Two markup forms are understood:
//!
//! * children: `<data-src srcset media type>` become `<source>`, a single
//!   `<data-img src>` becomes the `<img>` (or one is created from the
//!   picture's own source attribute);
//! * attributes: `data-srcset`/`data-media`/`data-sizes`/`data-type` on the
//!   picture produce one `<source>` plus an `<img>`.
//!
//! The element settles on the outcome of the `<img>` load.

use fos_dom::{Document, DomError, NodeId};

use crate::{Config, ResourceKind, Responder};

use super::{LoadContext, LoaderRegistry};

const SOURCE_ATTRIBUTES: [(&str, &str); 4] = [
    ("data-srcset", "srcset"),
    ("data-media", "media"),
    ("data-sizes", "sizes"),
    ("data-type", "type"),
];

pub(super) fn register(registry: &mut LoaderRegistry) {
    registry.register(["pic", "picture"], Some(&["picture"]), load_picture);
}

fn load_picture(cx: LoadContext, responder: Responder) {
    let node = cx.node();
    let hydrated = {
        let mut doc = cx.document().borrow_mut();
        hydrate(&mut doc, node, cx.config())
    };

    match hydrated {
        Ok(Some(image)) => {
            let load = cx.platform().load_resource(ResourceKind::Image, &image);
            cx.settle_when(responder, load);
        }
        Ok(None) => {
            tracing::debug!(node = %node, "picture without image source");
            responder.fail();
        }
        Err(err) => {
            tracing::debug!(node = %node, "picture not prepared: {}", err);
            responder.fail();
        }
    }
}

/// Rewrite the lazy markup and return the image URL to load.
fn hydrate(doc: &mut Document, node: NodeId, config: &Config) -> Result<Option<String>, DomError> {
    let attribute = config.attribute.as_str();
    let sources = doc.children_with_tag(node, "data-src");

    if !sources.is_empty() {
        for source in sources {
            doc.rename_element(source, "source")?;
        }

        let images = doc.children_with_tag(node, "data-img");
        if let [image] = images.as_slice() {
            doc.rename_element(*image, "img")?;
            let src = doc.attr(*image, attribute).map(str::to_string);
            if let Some(src) = &src {
                doc.set_attr(*image, "src", src)?;
                if config.remove_attribute {
                    doc.remove_attrs(*image, &[attribute]);
                }
            }
            return Ok(src);
        }

        let src = doc.attr(node, attribute).map(str::to_string);
        if let Some(src) = &src {
            append_image(doc, node, src)?;
            if config.remove_attribute {
                doc.remove_attrs(node, &[attribute]);
            }
        }
        return Ok(src);
    }

    if doc.has_attr(node, "data-srcset") {
        let source = doc.append_new(node, "source")?;
        for (lazy, live) in SOURCE_ATTRIBUTES {
            if let Some(value) = doc.attr(node, lazy).map(str::to_string) {
                doc.set_attr(source, live, &value)?;
            }
        }

        let src = doc.attr(node, attribute).map(str::to_string);
        if let Some(src) = &src {
            append_image(doc, node, src)?;
        }
        if config.remove_attribute {
            let mut stripped: Vec<&str> = SOURCE_ATTRIBUTES.iter().map(|(lazy, _)| *lazy).collect();
            stripped.push(attribute);
            doc.remove_attrs(node, &stripped);
        }
        return Ok(src);
    }

    Ok(None)
}

fn append_image(doc: &mut Document, picture: NodeId, src: &str) -> Result<NodeId, DomError> {
    let image = doc.append_new(picture, "img")?;
    doc.set_attr(image, "src", src)?;
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn picture() -> (Document, NodeId) {
        let mut doc = Document::new("about:blank");
        let node = doc.append_new(doc.body(), "picture").unwrap();
        (doc, node)
    }

    #[test]
    fn test_children_form() {
        let (mut doc, pic) = picture();
        let source = doc.append_new(pic, "data-src").unwrap();
        doc.set_attr(source, "srcset", "wide.jpg").unwrap();
        doc.set_attr(source, "media", "(min-width: 600px)").unwrap();
        let image = doc.append_new(pic, "data-img").unwrap();
        doc.set_attr(image, "data-src", "narrow.jpg").unwrap();

        let src = hydrate(&mut doc, pic, &Config::default()).unwrap();

        assert_eq!(src.as_deref(), Some("narrow.jpg"));
        assert_eq!(doc.tag_name(source), Some("source"));
        assert_eq!(doc.tag_name(image), Some("img"));
        assert_eq!(doc.attr(image, "src"), Some("narrow.jpg"));
        assert!(!doc.has_attr(image, "data-src"));
    }

    #[test]
    fn test_children_form_with_picture_source() {
        let (mut doc, pic) = picture();
        doc.append_new(pic, "data-src").unwrap();
        doc.set_attr(pic, "data-src", "fallback.jpg").unwrap();

        let src = hydrate(&mut doc, pic, &Config::default()).unwrap();

        assert_eq!(src.as_deref(), Some("fallback.jpg"));
        let images = doc.children_with_tag(pic, "img");
        assert_eq!(images.len(), 1);
        assert_eq!(doc.attr(images[0], "src"), Some("fallback.jpg"));
    }

    #[test]
    fn test_attribute_form() {
        let (mut doc, pic) = picture();
        doc.set_attr(pic, "data-srcset", "a.webp").unwrap();
        doc.set_attr(pic, "data-type", "image/webp").unwrap();
        doc.set_attr(pic, "data-src", "a.jpg").unwrap();

        let src = hydrate(&mut doc, pic, &Config::default()).unwrap();

        assert_eq!(src.as_deref(), Some("a.jpg"));
        let source = doc.children_with_tag(pic, "source")[0];
        assert_eq!(doc.attr(source, "srcset"), Some("a.webp"));
        assert_eq!(doc.attr(source, "type"), Some("image/webp"));
        assert!(!doc.has_attr(pic, "data-srcset"));
        assert!(!doc.has_attr(pic, "data-src"));
    }

    #[test]
    fn test_nothing_to_load() {
        let (mut doc, pic) = picture();
        assert_eq!(hydrate(&mut doc, pic, &Config::default()).unwrap(), None);
    }
}
