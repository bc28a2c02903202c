//! Item classification and candidacy
//!
//! An item is an element handed to an instance. It is either a custom
//! loader item (carries the loader attribute), an `<img>`, or any other
//! element whose background image gets swapped in.

use fos_dom::{Document, NodeId};

use crate::Config;
use crate::viewport::{ViewportSize, is_in_loadable_area};

/// How an item gets loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    /// `<img>` whose `src`/`srcset` is written back
    Image,
    /// Any other element, loaded into `background-image`
    BackgroundCarrier,
    /// Delegated to the named registry loader
    Custom(String),
}

/// Decide how `node` gets loaded
pub fn classify(document: &Document, node: NodeId, config: &Config) -> ElementKind {
    let loader = document
        .attr(node, &config.loader_attribute)
        .map(str::trim)
        .filter(|name| !name.is_empty());

    match loader {
        Some(name) => ElementKind::Custom(name.to_string()),
        None if document.tag_name(node) == Some("img") => ElementKind::Image,
        None => ElementKind::BackgroundCarrier,
    }
}

/// Source URL the image path would load for `node`.
///
/// On high density screens the retina attribute wins when present. The
/// per-element base attribute, or the configured base, is prepended.
pub fn resolve_source(document: &Document, node: NodeId, config: &Config) -> Option<String> {
    let retina = (document.device_pixel_ratio() > 1.0)
        .then(|| document.attr(node, &config.retina_attribute))
        .flatten();
    let source = retina
        .or_else(|| document.attr(node, &config.attribute))
        .filter(|s| !s.is_empty())?;

    let base = document
        .attr(node, &config.image_base_attribute)
        .or(config.image_base.as_deref())
        .unwrap_or_default();
    Some(format!("{base}{source}"))
}

/// CSS `url("…")` value for a background image
pub fn css_url(source: &str) -> String {
    format!("url(\"{}\")", source.replace('"', "\\\""))
}

/// Whether `node` still has something to load, ignoring the viewport.
///
/// Returns the kind of load to dispatch, or `None` if the element was
/// already handled, is hidden under `visible_only`, or already shows its
/// lazy source. Elements without any lazy source are still dispatched so
/// the image path can fail them.
pub fn wants_load(document: &Document, node: NodeId, config: &Config) -> Option<ElementKind> {
    if document.has_flag(node, &config.handled_name) {
        return None;
    }
    if config.visible_only && !document.is_visible(node) {
        return None;
    }

    let kind = classify(document, node, config);
    let pending = match &kind {
        ElementKind::Custom(_) => true,
        ElementKind::Image => {
            let source = resolve_source(document, node, config);
            let srcset = document.attr(node, &config.srcset_attribute);
            if source.is_none() && srcset.is_none() {
                true
            } else {
                source.as_deref() != document.attr(node, "src")
                    || (srcset.is_some() && srcset != document.attr(node, "srcset"))
            }
        }
        ElementKind::BackgroundCarrier => match resolve_source(document, node, config) {
            Some(source) => document.style(node, "background-image") != Some(css_url(&source).as_str()),
            None => true,
        },
    };
    pending.then_some(kind)
}

/// Full candidacy test for one scan pass.
///
/// A forced pass skips the loadable area check, nothing else.
pub fn is_candidate(
    document: &Document,
    node: NodeId,
    config: &Config,
    viewport: ViewportSize,
    force: bool,
) -> Option<ElementKind> {
    if document.has_flag(node, &config.handled_name) {
        return None;
    }
    if !force {
        let rect = document.bounding_client_rect(node);
        if !is_in_loadable_area(&rect, viewport, config.threshold, config.scroll_direction) {
            return None;
        }
    }
    wants_load(document, node, config)
}

/// Seed placeholders and keep the items worth tracking.
///
/// Handled elements and elements already in `existing` are dropped.
/// `<img>` tags without a `src` get the default image; other elements
/// without a background get the placeholder.
pub fn prepare(
    document: &mut Document,
    nodes: impl IntoIterator<Item = NodeId>,
    config: &Config,
    existing: &[NodeId],
) -> Vec<NodeId> {
    let mut items: Vec<NodeId> = Vec::new();

    for node in nodes {
        let Some(tag) = document.tag_name(node).map(str::to_string) else {
            tracing::debug!(node = %node, "skipping non-element item");
            continue;
        };
        if document.has_flag(node, &config.handled_name)
            || existing.contains(&node)
            || items.contains(&node)
        {
            continue;
        }

        let seeded = if tag == "img" {
            match &config.default_image {
                Some(image) if !document.has_attr(node, "src") => {
                    document.set_attr(node, "src", image)
                }
                _ => Ok(()),
            }
        } else {
            let bare = matches!(document.style(node, "background-image"), None | Some("none"));
            match &config.placeholder {
                Some(placeholder) if bare => {
                    document.set_style(node, "background-image", &css_url(placeholder))
                }
                _ => Ok(()),
            }
        };
        if let Err(err) = seeded {
            tracing::warn!(node = %node, "placeholder not applied: {}", err);
        }

        items.push(node);
    }

    items
}
