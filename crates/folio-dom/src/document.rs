//! Document - High-level document API

use crate::{DomResult, DomTree, NodeId, SimpleSelector};

/// HTML Document
#[derive(Debug, Clone)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Document URL
    url: String,
    /// Cached reference to <html> element
    html_element: NodeId,
    /// Cached reference to <head> element
    head_element: NodeId,
    /// Cached reference to <body> element
    body_element: NodeId,
}

impl Document {
    /// Create a new document with an html/head/body skeleton
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();

        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        // Freshly created nodes cannot violate the hierarchy
        let _ = tree.append_child(tree.root(), html);
        let _ = tree.append_child(html, head);
        let _ = tree.append_child(html, body);

        Self {
            tree,
            url: url.to_string(),
            html_element: html,
            head_element: head,
            body_element: body,
        }
    }

    /// Create an empty document (no structure)
    pub fn empty(url: &str) -> Self {
        Self {
            tree: DomTree::new(),
            url: url.to_string(),
            html_element: NodeId::NONE,
            head_element: NodeId::NONE,
            body_element: NodeId::NONE,
        }
    }

    /// Locate html/head/body after the tree was built externally
    pub fn finalize(&mut self) {
        self.html_element = self.first_child_tagged(self.tree.root(), "html");
        self.head_element = self.first_child_tagged(self.html_element, "head");
        self.body_element = self.first_child_tagged(self.html_element, "body");
    }

    fn first_child_tagged(&self, parent: NodeId, tag: &str) -> NodeId {
        if !parent.is_valid() {
            return NodeId::NONE;
        }
        self.tree
            .child_ids(parent)
            .find(|&id| self.tree.tag_name(id) == Some(tag))
            .unwrap_or(NodeId::NONE)
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Update the document URL (after a history push)
    pub fn set_url(&mut self, url: &str) {
        self.url = url.to_string();
    }

    fn title_element(&self) -> Option<NodeId> {
        if !self.head_element.is_valid() {
            return None;
        }
        self.tree
            .child_ids(self.head_element)
            .find(|&id| self.tree.tag_name(id) == Some("title"))
    }

    /// Get document title
    pub fn title(&self) -> String {
        self.title_element()
            .map(|id| self.tree.text_content(id).trim().to_string())
            .unwrap_or_default()
    }

    /// Replace the document title, creating `<title>` when missing
    pub fn set_title(&mut self, title: &str) -> DomResult<()> {
        let id = match self.title_element() {
            Some(id) => id,
            None => {
                if !self.head_element.is_valid() {
                    return Ok(());
                }
                let id = self.tree.create_element("title");
                self.tree.append_child(self.head_element, id)?;
                id
            }
        };
        if self.tree.text_content(id) == title {
            return Ok(());
        }
        self.tree.set_text_content(id, title)
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

    /// First element with the given tag in document order (`header`, `main`, ...)
    pub fn landmark(&self, tag: &str) -> Option<NodeId> {
        self.query_first(self.tree.root(), &SimpleSelector::Tag(tag.to_string()))
    }

    /// Get element by ID
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.query_first(self.tree.root(), &SimpleSelector::Id(id.to_string()))
    }

    /// All elements carrying a class, in document order
    pub fn elements_by_class(&self, class: &str) -> Vec<NodeId> {
        self.query_all(self.tree.root(), &SimpleSelector::Class(class.to_string()))
    }

    /// All elements below `root` matching a selector
    pub fn query_all(&self, root: NodeId, selector: &SimpleSelector) -> Vec<NodeId> {
        self.tree
            .descendants(root)
            .filter(|(_, node)| node.as_element().is_some_and(|e| selector.matches(e)))
            .map(|(id, _)| id)
            .collect()
    }

    /// First element below `root` matching a selector
    pub fn query_first(&self, root: NodeId, selector: &SimpleSelector) -> Option<NodeId> {
        self.tree
            .descendants(root)
            .find(|(_, node)| node.as_element().is_some_and(|e| selector.matches(e)))
            .map(|(id, _)| id)
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}
