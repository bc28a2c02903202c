//! DOM Node
//!
//! Nodes link to each other through `NodeId`s instead of pointers. Element
//! payloads carry everything the lazy loader reads or writes: attributes,
//! inline style, inner HTML, data flags and layout geometry.

use crate::{DOMRect, NodeId};

/// DOM Node - Core structure
#[derive(Debug)]
pub struct Node {
    /// Parent node (NONE if root or detached)
    pub parent: NodeId,
    /// First child
    pub first_child: NodeId,
    /// Last child (for O(1) append)
    pub last_child: NodeId,
    /// Previous sibling
    pub prev_sibling: NodeId,
    /// Next sibling
    pub next_sibling: NodeId,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    fn with_data(data: NodeData) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data,
        }
    }

    /// Create a new element node
    pub fn element(tag: &str) -> Self {
        Self::with_data(NodeData::Element(ElementData::new(tag)))
    }

    /// Create a new text node
    pub fn text(content: String) -> Self {
        Self::with_data(NodeData::Text(content))
    }

    /// Create a document node
    pub fn document() -> Self {
        Self::with_data(NodeData::Document)
    }

    /// Check if this is an element
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get text content if this is a text node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    /// Document root
    Document,
    /// Element
    Element(ElementData),
    /// Text content
    Text(String),
}

/// Element-specific data
#[derive(Debug, Default)]
pub struct ElementData {
    /// Lowercase tag name
    pub tag: String,
    /// Attributes in insertion order
    pub attrs: Vec<(String, String)>,
    /// Inline style declarations
    pub style: Vec<(String, String)>,
    /// Serialized children set through `innerHTML`
    pub inner_html: String,
    /// Data flags (jQuery-style `.data(name, true)`)
    pub flags: Vec<String>,
    /// Layout box in document coordinates
    pub layout: DOMRect,
    /// `display: none` on this element
    pub hidden: bool,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    /// Get an attribute value
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute
    pub fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(attr) = self.attrs.iter_mut().find(|(n, _)| n == name) {
            attr.1 = value.to_string();
            return;
        }
        self.attrs.push((name.to_string(), value.to_string()));
    }

    /// Remove an attribute, returning its old value
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attrs.iter().position(|(n, _)| n == name)?;
        Some(self.attrs.remove(index).1)
    }

    /// Get an inline style property
    pub fn get_style(&self, property: &str) -> Option<&str> {
        self.style.iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    /// Set an inline style property
    pub fn set_style(&mut self, property: &str, value: &str) {
        if let Some(decl) = self.style.iter_mut().find(|(p, _)| p == property) {
            decl.1 = value.to_string();
            return;
        }
        self.style.push((property.to_string(), value.to_string()));
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.iter().any(|f| f == name)
    }

    pub fn set_flag(&mut self, name: &str) {
        if !self.has_flag(name) {
            self.flags.push(name.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_roundtrip() {
        let mut elem = ElementData::new("IMG");
        assert_eq!(elem.tag, "img");

        elem.set_attr("data-src", "a.jpg");
        elem.set_attr("data-src", "b.jpg");
        assert_eq!(elem.get_attr("data-src"), Some("b.jpg"));
        assert_eq!(elem.attrs.len(), 1);

        assert_eq!(elem.remove_attr("data-src").as_deref(), Some("b.jpg"));
        assert_eq!(elem.remove_attr("data-src"), None);
    }

    #[test]
    fn test_flags_are_sets() {
        let mut elem = ElementData::new("div");
        elem.set_flag("handled");
        elem.set_flag("handled");
        assert!(elem.has_flag("handled"));
        assert_eq!(elem.flags.len(), 1);
    }
}
