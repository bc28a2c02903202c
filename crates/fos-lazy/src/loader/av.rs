//! `<audio>` and `<video>` loader
//!
//! Sources come from `<data-src src type>` children, or from the compact
//! attribute form `"a.ogg|audio/ogg, a.mp3|audio/mpeg"`. `<data-track>`
//! children become `<track>` elements. The element loads once any source
//! loads and fails only when every source fails.

use fos_dom::{Document, DomError, NodeId};

use crate::{ResourceKind, Responder};

use super::{LoadContext, LoaderRegistry};

pub(super) fn register(registry: &mut LoaderRegistry) {
    registry.register(["audio", "video"], Some(&["audio", "video"]), load_media);
}

/// Split a compact source list into `(src, type)` pairs.
///
/// ```rust
/// use fos_lazy::loader::parse_source_list;
///
/// let sources = parse_source_list("a.ogg|audio/ogg, a.mp3");
/// assert_eq!(sources[0], ("a.ogg".to_string(), Some("audio/ogg".to_string())));
/// assert_eq!(sources[1], ("a.mp3".to_string(), None));
/// ```
pub fn parse_source_list(value: &str) -> Vec<(String, Option<String>)> {
    value
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.splitn(2, '|');
            let src = parts.next()?.trim();
            if src.is_empty() {
                return None;
            }
            let kind = parts.next().map(str::trim).filter(|t| !t.is_empty());
            Some((src.to_string(), kind.map(str::to_string)))
        })
        .collect()
}

fn load_media(cx: LoadContext, responder: Responder) {
    let node = cx.node();
    let hydrated = {
        let mut doc = cx.document().borrow_mut();
        hydrate(&mut doc, node, &cx.config().attribute, cx.config().remove_attribute)
    };

    let sources = match hydrated {
        Ok(sources) if !sources.is_empty() => sources,
        Ok(_) => {
            tracing::debug!(node = %node, "media element without sources");
            responder.fail();
            return;
        }
        Err(err) => {
            tracing::debug!(node = %node, "media element not prepared: {}", err);
            responder.fail();
            return;
        }
    };

    let platform = cx.platform().clone();
    cx.spawn(async move {
        for src in &sources {
            match platform.load_resource(ResourceKind::Media, src).await {
                Ok(()) => {
                    responder.succeed();
                    return;
                }
                Err(err) => tracing::debug!(node = %node, "media source failed: {}", err),
            }
        }
        responder.fail();
    });
}

/// Turn the lazy markup into real `<source>`/`<track>` children and return
/// the source URLs in document order.
fn hydrate(
    doc: &mut Document,
    node: NodeId,
    attribute: &str,
    remove: bool,
) -> Result<Vec<String>, DomError> {
    for track in doc.children_with_tag(node, "data-track") {
        doc.rename_element(track, "track")?;
    }

    let mut sources = Vec::new();
    let children = doc.children_with_tag(node, "data-src");

    if !children.is_empty() {
        for child in children {
            doc.rename_element(child, "source")?;
            if let Some(src) = doc.attr(child, "src") {
                sources.push(src.to_string());
            }
        }
    } else if let Some(list) = doc.attr(node, attribute).map(str::to_string) {
        for (src, kind) in parse_source_list(&list) {
            let source = doc.append_new(node, "source")?;
            doc.set_attr(source, "src", &src)?;
            if let Some(kind) = kind {
                doc.set_attr(source, "type", &kind)?;
            }
            sources.push(src);
        }
        if remove {
            doc.remove_attrs(node, &[attribute]);
        }
    }

    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source_list_skips_blanks() {
        let sources = parse_source_list(" a.webm | video/webm ,, b.mp4|");
        assert_eq!(
            sources,
            vec![
                ("a.webm".to_string(), Some("video/webm".to_string())),
                ("b.mp4".to_string(), None),
            ]
        );
        assert!(parse_source_list("").is_empty());
    }

    #[test]
    fn test_hydrate_children() {
        let mut doc = Document::new("about:blank");
        let video = doc.append_new(doc.body(), "video").unwrap();
        let a = doc.append_new(video, "data-src").unwrap();
        doc.set_attr(a, "src", "a.webm").unwrap();
        doc.set_attr(a, "type", "video/webm").unwrap();
        let track = doc.append_new(video, "data-track").unwrap();
        doc.set_attr(track, "src", "subs.vtt").unwrap();

        let sources = hydrate(&mut doc, video, "data-src", true).unwrap();

        assert_eq!(sources, vec!["a.webm".to_string()]);
        assert_eq!(doc.tag_name(a), Some("source"));
        assert_eq!(doc.attr(a, "type"), Some("video/webm"));
        assert_eq!(doc.tag_name(track), Some("track"));
    }

    #[test]
    fn test_hydrate_compact_attribute() {
        let mut doc = Document::new("about:blank");
        let audio = doc.append_new(doc.body(), "audio").unwrap();
        doc.set_attr(audio, "data-src", "a.ogg|audio/ogg,a.mp3|audio/mpeg").unwrap();

        let sources = hydrate(&mut doc, audio, "data-src", true).unwrap();

        assert_eq!(sources, vec!["a.ogg".to_string(), "a.mp3".to_string()]);
        let created = doc.children_with_tag(audio, "source");
        assert_eq!(created.len(), 2);
        assert_eq!(doc.attr(created[1], "type"), Some("audio/mpeg"));
        assert!(!doc.has_attr(audio, "data-src"));
    }
}
