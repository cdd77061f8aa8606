//! DOM Node - Compact representation
//!
//! Nodes link to their relatives by [`NodeId`] instead of pointers, so the
//! whole tree lives in a single `Vec` and subtrees can be detached and
//! re-attached without reference counting.

use crate::NodeId;

/// DOM Node - Core structure
#[derive(Debug, Clone)]
pub struct Node {
    /// Parent node (NONE if detached or root)
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
    pub(crate) fn with_data(data: NodeData) -> Self {
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
    pub fn text(content: impl Into<String>) -> Self {
        Self::with_data(NodeData::Text(content.into()))
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
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    /// Document root
    Document,
    /// DOCTYPE
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
    /// Element
    Element(ElementData),
    /// Text content
    Text(String),
    /// Comment
    Comment(String),
}

/// Element-specific data
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Lowercase local tag name
    pub tag: String,
    /// Attributes in source order
    pub attrs: Vec<Attribute>,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    /// Get an attribute value
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Check for an attribute
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name == name)
    }

    /// Set an attribute. Returns `false` when the value was already set.
    pub fn set_attr(&mut self, name: &str, value: &str) -> bool {
        for attr in self.attrs.iter_mut() {
            if attr.name == name {
                if attr.value == value {
                    return false;
                }
                attr.value = value.to_string();
                return true;
            }
        }
        self.attrs.push(Attribute {
            name: name.to_string(),
            value: value.to_string(),
        });
        true
    }

    /// Remove an attribute. Returns `true` if something was removed.
    pub fn remove_attr(&mut self, name: &str) -> bool {
        let before = self.attrs.len();
        self.attrs.retain(|a| a.name != name);
        self.attrs.len() != before
    }

    /// The `id` attribute
    pub fn id(&self) -> Option<&str> {
        self.get_attr("id")
    }

    /// Iterate the whitespace-separated `class` tokens
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.get_attr("class").unwrap_or("").split_whitespace()
    }

    /// Check for a class token
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Add a class token. Returns `false` when already present.
    pub fn add_class(&mut self, class: &str) -> bool {
        if self.has_class(class) {
            return false;
        }
        let mut list: Vec<&str> = self.classes().collect();
        list.push(class);
        let joined = list.join(" ");
        self.set_attr("class", &joined)
    }

    /// Remove a class token. Returns `true` if it was present.
    pub fn remove_class(&mut self, class: &str) -> bool {
        if !self.has_class(class) {
            return false;
        }
        let joined = self.classes()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr("class", &joined)
    }

    /// Read a `data-*` annotation by its dataset key (`lazyGroup` → `data-lazy-group`)
    pub fn dataset(&self, key: &str) -> Option<&str> {
        self.get_attr(&dataset_attr_name(key))
    }
}

/// Attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Convert a camelCase dataset key to its `data-` attribute name.
pub(crate) fn dataset_attr_name(key: &str) -> String {
    let mut name = String::with_capacity(key.len() + 8);
    name.push_str("data-");
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            name.push('-');
            name.push(ch.to_ascii_lowercase());
        } else {
            name.push(ch);
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_tokens() {
        let mut elem = ElementData::new("DIV");
        assert_eq!(elem.tag, "div");

        assert!(elem.add_class("card"));
        assert!(elem.add_class("is-visible"));
        assert!(!elem.add_class("card"));
        assert_eq!(elem.get_attr("class"), Some("card is-visible"));

        assert!(elem.remove_class("card"));
        assert!(!elem.remove_class("card"));
        assert_eq!(elem.get_attr("class"), Some("is-visible"));
    }

    #[test]
    fn test_set_attr_reports_change() {
        let mut elem = ElementData::new("a");
        assert!(elem.set_attr("href", "/about"));
        assert!(!elem.set_attr("href", "/about"));
        assert!(elem.set_attr("href", "/work"));
        assert!(elem.remove_attr("href"));
        assert!(!elem.has_attr("href"));
    }

    #[test]
    fn test_dataset_names() {
        assert_eq!(dataset_attr_name("lazyGroup"), "data-lazy-group");
        assert_eq!(dataset_attr_name("loaded"), "data-loaded");

        let mut elem = ElementData::new("div");
        elem.set_attr("data-preview-src", "https://example.com");
        assert_eq!(elem.dataset("previewSrc"), Some("https://example.com"));
    }
}
