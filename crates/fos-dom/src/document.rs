//! Document - High-level document API
//!
//! Wraps the tree with the window state the lazy loader consults: viewport
//! size, scroll offset, device pixel ratio and the load state.

use crate::{DOMRect, DomError, DomTree, NodeId, ScrollOffset};

/// `document.readyState`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadyState {
    #[default]
    Loading,
    Interactive,
    /// The window `load` event has fired
    Complete,
}

/// HTML Document
#[derive(Debug)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Document URL
    url: String,
    html_element: NodeId,
    head_element: NodeId,
    body_element: NodeId,
    viewport_width: f64,
    viewport_height: f64,
    scroll: ScrollOffset,
    device_pixel_ratio: f64,
    ready_state: ReadyState,
}

impl Document {
    /// Create a new document with `<html>`, `<head>` and `<body>`
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();

        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        // Freshly created nodes always attach.
        let _ = tree.append_child(tree.root(), html);
        let _ = tree.append_child(html, head);
        let _ = tree.append_child(html, body);

        Self {
            tree,
            url: url.to_string(),
            html_element: html,
            head_element: head,
            body_element: body,
            viewport_width: 1024.0,
            viewport_height: 768.0,
            scroll: ScrollOffset::default(),
            device_pixel_ratio: 1.0,
            ready_state: ReadyState::Loading,
        }
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get <html> element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// Get <head> element
    pub fn head(&self) -> NodeId {
        self.head_element
    }

    /// Get <body> element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    // ------------------------------------------------------------------
    // Window state
    // ------------------------------------------------------------------

    /// `(innerWidth, innerHeight)`
    pub fn viewport_size(&self) -> (f64, f64) {
        (self.viewport_width, self.viewport_height)
    }

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport_width = width;
        self.viewport_height = height;
    }

    pub fn scroll_offset(&self) -> ScrollOffset {
        self.scroll
    }

    pub fn scroll_to(&mut self, x: f64, y: f64) {
        self.scroll.scroll_to(x, y);
        tracing::trace!("window scrolled to ({}, {})", self.scroll.left, self.scroll.top);
    }

    pub fn scroll_by(&mut self, dx: f64, dy: f64) {
        self.scroll.scroll_by(dx, dy);
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    pub fn set_device_pixel_ratio(&mut self, ratio: f64) {
        self.device_pixel_ratio = ratio;
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    pub fn set_ready_state(&mut self, state: ReadyState) {
        self.ready_state = state;
    }

    /// Has the window `load` event already fired?
    pub fn is_loaded(&self) -> bool {
        self.ready_state == ReadyState::Complete
    }

    // ------------------------------------------------------------------
    // Elements
    // ------------------------------------------------------------------

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.tree.create_element(tag)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.tree.append_child(parent, child)
    }

    /// Create an element and append it under `parent`
    pub fn append_new(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, DomError> {
        let id = self.create_element(tag);
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Detach a node from the tree
    pub fn remove_node(&mut self, id: NodeId) {
        self.tree.detach(id);
    }

    /// Lowercase tag name
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.tree.get(id)?.as_element().map(|e| e.tag.as_str())
    }

    /// Change the tag of an element in place, keeping attributes and children
    pub fn rename_element(&mut self, id: NodeId, tag: &str) -> Result<(), DomError> {
        let elem = self.element_mut(id)?;
        elem.tag = tag.to_ascii_lowercase();
        Ok(())
    }

    /// Element children whose tag matches `tag`
    pub fn children_with_tag(&self, parent: NodeId, tag: &str) -> Vec<NodeId> {
        self.tree
            .children(parent)
            .filter(|(_, n)| n.as_element().is_some_and(|e| e.tag.eq_ignore_ascii_case(tag)))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.tree.get(id)?.as_element()?.get_attr(name)
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.element_mut(id)?.set_attr(name, value);
        Ok(())
    }

    /// Remove each listed attribute; missing ones are ignored
    pub fn remove_attrs(&mut self, id: NodeId, names: &[&str]) {
        if let Ok(elem) = self.element_mut(id) {
            for name in names {
                elem.remove_attr(name);
            }
        }
    }

    pub fn style(&self, id: NodeId, property: &str) -> Option<&str> {
        self.tree.get(id)?.as_element()?.get_style(property)
    }

    pub fn set_style(&mut self, id: NodeId, property: &str, value: &str) -> Result<(), DomError> {
        self.element_mut(id)?.set_style(property, value);
        Ok(())
    }

    pub fn inner_html(&self, id: NodeId) -> Option<&str> {
        self.tree.get(id)?.as_element().map(|e| e.inner_html.as_str())
    }

    pub fn set_inner_html(&mut self, id: NodeId, html: &str) -> Result<(), DomError> {
        self.element_mut(id)?.inner_html = html.to_string();
        Ok(())
    }

    /// Element data flag, like `$(el).data(name)`
    pub fn has_flag(&self, id: NodeId, name: &str) -> bool {
        self.tree
            .get(id)
            .and_then(|n| n.as_element())
            .is_some_and(|e| e.has_flag(name))
    }

    pub fn set_flag(&mut self, id: NodeId, name: &str) -> Result<(), DomError> {
        self.element_mut(id)?.set_flag(name);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    /// Set the layout box of an element in document coordinates
    pub fn set_layout_rect(&mut self, id: NodeId, rect: DOMRect) -> Result<(), DomError> {
        self.element_mut(id)?.layout = rect;
        Ok(())
    }

    /// getBoundingClientRect(): the layout box relative to the viewport
    pub fn bounding_client_rect(&self, id: NodeId) -> DOMRect {
        self.tree
            .get(id)
            .and_then(|n| n.as_element())
            .map(|e| e.layout.translate(-self.scroll.left, -self.scroll.top))
            .unwrap_or_default()
    }

    /// Toggle `display: none`
    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) -> Result<(), DomError> {
        self.element_mut(id)?.hidden = hidden;
        Ok(())
    }

    /// jQuery `:visible` - has a layout box and no hidden ancestor
    pub fn is_visible(&self, id: NodeId) -> bool {
        let Some(elem) = self.tree.get(id).and_then(|n| n.as_element()) else {
            return false;
        };
        if elem.layout.is_empty() {
            return false;
        }

        let mut current = Some(id);
        while let Some(node) = current {
            if self.tree.get(node).and_then(|n| n.as_element()).is_some_and(|e| e.hidden) {
                return false;
            }
            current = self.tree.parent(node);
        }
        true
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut crate::ElementData, DomError> {
        self.tree
            .get_mut(id)
            .ok_or(DomError::InvalidNode(id))?
            .as_element_mut()
            .ok_or(DomError::NotAnElement(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_structure() {
        let doc = Document::new("https://example.com/");
        assert_eq!(doc.tag_name(doc.document_element()), Some("html"));
        assert_eq!(doc.tag_name(doc.body()), Some("body"));
        assert_eq!(doc.url(), "https://example.com/");
        assert!(!doc.is_loaded());
    }

    #[test]
    fn test_bounding_rect_follows_scroll() {
        let mut doc = Document::new("about:blank");
        let img = doc.append_new(doc.body(), "img").unwrap();
        doc.set_layout_rect(img, DOMRect::from_xywh(0.0, 2000.0, 100.0, 100.0)).unwrap();

        assert_eq!(doc.bounding_client_rect(img).top(), 2000.0);
        doc.scroll_to(0.0, 1500.0);
        assert_eq!(doc.bounding_client_rect(img).top(), 500.0);
    }

    #[test]
    fn test_visibility_checks_ancestors() {
        let mut doc = Document::new("about:blank");
        let wrapper = doc.append_new(doc.body(), "div").unwrap();
        let img = doc.append_new(wrapper, "img").unwrap();

        // no layout box yet
        assert!(!doc.is_visible(img));

        doc.set_layout_rect(img, DOMRect::from_xywh(0.0, 0.0, 10.0, 10.0)).unwrap();
        assert!(doc.is_visible(img));

        doc.set_hidden(wrapper, true).unwrap();
        assert!(!doc.is_visible(img));
    }

    #[test]
    fn test_rename_keeps_attributes() {
        let mut doc = Document::new("about:blank");
        let node = doc.append_new(doc.body(), "data-src").unwrap();
        doc.set_attr(node, "src", "a.mp4").unwrap();
        doc.rename_element(node, "source").unwrap();

        assert_eq!(doc.tag_name(node), Some("source"));
        assert_eq!(doc.attr(node, "src"), Some("a.mp4"));
        assert_eq!(doc.children_with_tag(doc.body(), "SOURCE"), vec![node]);
    }

    #[test]
    fn test_mutating_text_node_fails() {
        let mut doc = Document::new("about:blank");
        let text = doc.tree.create_text("hello");
        assert_eq!(doc.set_attr(text, "a", "b"), Err(DomError::NotAnElement(text)));
        assert!(!doc.has_flag(text, "handled"));
    }
}
