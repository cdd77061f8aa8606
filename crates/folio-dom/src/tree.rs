//! DOM Tree (arena-based allocation)
//!
//! Detached nodes stay in the arena; they are simply unreachable from the
//! root. A page lives for one navigation, so the arena is never compacted.

use crate::node::dataset_attr_name;
use crate::{DomError, DomResult, ElementData, Generation, Node, NodeData, NodeId};

/// Arena-based DOM tree
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
    generation: Generation,
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
            generation: Generation::INITIAL,
        }
    }

    /// The document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.nodes.get_mut(id.index()).ok_or(DomError::NotFound(id))
    }

    /// Number of nodes in the arena (attached or not)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree holds nothing but the document node
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Mutation counter; bumped by every effective change
    #[inline]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    fn bump(&mut self) {
        self.generation = self.generation.next();
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(node);
        id
    }

    // === Construction ===

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(Node::element(tag))
    }

    /// Create a detached element from prepared data
    pub fn create_element_with(&mut self, data: ElementData) -> NodeId {
        self.push(Node::with_data(NodeData::Element(data)))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(Node::text(text))
    }

    /// Create a detached comment
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(Node::with_data(NodeData::Comment(text.to_string())))
    }

    /// Create a detached doctype
    pub fn create_doctype(&mut self, name: &str, public_id: &str, system_id: &str) -> NodeId {
        self.push(Node::with_data(NodeData::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        }))
    }

    // === Structure ===

    /// Parent of a node, if attached
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_valid())
    }

    /// Is `ancestor` equal to or above `node`?
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = node;
        while current.is_valid() {
            if current == ancestor {
                return true;
            }
            current = match self.get(current) {
                Some(n) => n.parent,
                None => return false,
            };
        }
        false
    }

    /// Append `child` as the last child of `parent`, detaching it first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if self.get(parent).is_none() {
            return Err(DomError::NotFound(parent));
        }
        if self.get(child).is_none() {
            return Err(DomError::NotFound(child));
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        self.unlink(child)?;

        let last = self.node_mut(parent)?.last_child;
        {
            let node = self.node_mut(child)?;
            node.parent = parent;
            node.prev_sibling = last;
            node.next_sibling = NodeId::NONE;
        }
        if last.is_valid() {
            self.node_mut(last)?.next_sibling = child;
        } else {
            self.node_mut(parent)?.first_child = child;
        }
        self.node_mut(parent)?.last_child = child;
        self.bump();
        Ok(())
    }

    fn unlink(&mut self, id: NodeId) -> DomResult<()> {
        let (parent, prev, next) = {
            let node = self.get(id).ok_or(DomError::NotFound(id))?;
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        if !parent.is_valid() {
            return Ok(());
        }
        if prev.is_valid() {
            self.node_mut(prev)?.next_sibling = next;
        } else {
            self.node_mut(parent)?.first_child = next;
        }
        if next.is_valid() {
            self.node_mut(next)?.prev_sibling = prev;
        } else {
            self.node_mut(parent)?.last_child = prev;
        }
        let node = self.node_mut(id)?;
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
        Ok(())
    }

    /// Detach every child of `parent`; returns how many were removed
    pub fn remove_children(&mut self, parent: NodeId) -> DomResult<usize> {
        let children: Vec<NodeId> = self.child_ids(parent).collect();
        for child in &children {
            self.unlink(*child)?;
        }
        if !children.is_empty() {
            self.bump();
        }
        Ok(children.len())
    }

    /// Iterate direct children
    pub fn children(&self, parent: NodeId) -> Children<'_> {
        let first = self.get(parent).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        Children { tree: self, next: first }
    }

    /// Iterate direct child ids
    pub fn child_ids(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(parent).map(|(id, _)| id)
    }

    /// Does the node have any children?
    pub fn has_children(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|n| n.first_child.is_valid())
    }

    /// Pre-order traversal of the subtree below `root` (root excluded)
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        let first = self.get(root).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        Descendants { tree: self, root, next: first }
    }

    /// Deep-copy a subtree of another tree into this arena (detached)
    pub fn import_subtree(&mut self, src: &DomTree, node: NodeId) -> DomResult<NodeId> {
        let data = src.get(node).ok_or(DomError::NotFound(node))?.data.clone();
        let copy = self.push(Node::with_data(data));
        let children: Vec<NodeId> = src.child_ids(node).collect();
        for child in children {
            let imported = self.import_subtree(src, child)?;
            self.append_child(copy, imported)?;
        }
        Ok(copy)
    }

    // === Element data ===

    /// Element data of a node
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| n.as_element())
    }

    fn element_mut(&mut self, id: NodeId) -> DomResult<&mut ElementData> {
        self.node_mut(id)?
            .as_element_mut()
            .ok_or(DomError::NotAnElement(id))
    }

    /// Tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    /// Attribute value
    pub fn get_attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.get_attr(name))
    }

    /// Set an attribute
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        if self.element_mut(id)?.set_attr(name, value) {
            self.bump();
        }
        Ok(())
    }

    /// Remove an attribute
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> DomResult<()> {
        if self.element_mut(id)?.remove_attr(name) {
            self.bump();
        }
        Ok(())
    }

    /// Read a dataset annotation (`data-*`)
    pub fn dataset(&self, id: NodeId, key: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.dataset(key))
    }

    /// Write a dataset annotation (`data-*`)
    pub fn set_dataset(&mut self, id: NodeId, key: &str, value: &str) -> DomResult<()> {
        self.set_attr(id, &dataset_attr_name(key), value)
    }

    /// Remove a dataset annotation (`data-*`)
    pub fn remove_dataset(&mut self, id: NodeId, key: &str) -> DomResult<()> {
        self.remove_attr(id, &dataset_attr_name(key))
    }

    /// Class check
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|e| e.has_class(class))
    }

    /// Add a class token
    pub fn add_class(&mut self, id: NodeId, class: &str) -> DomResult<()> {
        if self.element_mut(id)?.add_class(class) {
            self.bump();
        }
        Ok(())
    }

    /// Remove a class token
    pub fn remove_class(&mut self, id: NodeId, class: &str) -> DomResult<()> {
        if self.element_mut(id)?.remove_class(class) {
            self.bump();
        }
        Ok(())
    }

    /// Concatenated text of the subtree
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.get(id).and_then(|n| n.as_text()) {
            out.push_str(text);
        }
        for (_, node) in self.descendants(id) {
            if let Some(text) = node.as_text() {
                out.push_str(text);
            }
        }
        out
    }

    /// Replace all children with a single text node
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> DomResult<()> {
        self.remove_children(id)?;
        if !text.is_empty() {
            let node = self.create_text(text);
            self.append_child(id, node)?;
        }
        Ok(())
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over direct children
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.next.is_valid() {
            return None;
        }
        let id = self.next;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling;
        Some((id, node))
    }
}

/// Pre-order iterator over a subtree
pub struct Descendants<'a> {
    tree: &'a DomTree,
    root: NodeId,
    next: NodeId,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.next.is_valid() {
            return None;
        }
        let id = self.next;
        let node = self.tree.get(id)?;

        self.next = if node.first_child.is_valid() {
            node.first_child
        } else {
            // Climb until a sibling is found or we are back at the root
            let mut current = id;
            loop {
                if current == self.root {
                    break NodeId::NONE;
                }
                let Some(n) = self.tree.get(current) else {
                    break NodeId::NONE;
                };
                if n.next_sibling.is_valid() {
                    break n.next_sibling;
                }
                current = n.parent;
                if !current.is_valid() || current == self.root {
                    break NodeId::NONE;
                }
            }
        };
        Some((id, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (DomTree, NodeId, NodeId, NodeId) {
        let mut tree = DomTree::new();
        let main = tree.create_element("main");
        let a = tree.create_element("section");
        let b = tree.create_element("section");
        tree.append_child(tree.root(), main).unwrap();
        tree.append_child(main, a).unwrap();
        tree.append_child(main, b).unwrap();
        (tree, main, a, b)
    }

    #[test]
    fn test_append_and_children() {
        let (tree, main, a, b) = sample();
        let kids: Vec<NodeId> = tree.child_ids(main).collect();
        assert_eq!(kids, vec![a, b]);
        assert_eq!(tree.parent(a), Some(main));
    }

    #[test]
    fn test_reappend_moves_node() {
        let (mut tree, main, a, b) = sample();
        tree.append_child(main, a).unwrap();
        let kids: Vec<NodeId> = tree.child_ids(main).collect();
        assert_eq!(kids, vec![b, a]);
    }

    #[test]
    fn test_hierarchy_error() {
        let (mut tree, main, a, _) = sample();
        assert!(matches!(
            tree.append_child(a, main),
            Err(DomError::HierarchyRequest { .. })
        ));
    }

    #[test]
    fn test_descendants_preorder() {
        let (mut tree, main, a, b) = sample();
        let text = tree.create_text("hi");
        tree.append_child(a, text).unwrap();

        let order: Vec<NodeId> = tree.descendants(main).map(|(id, _)| id).collect();
        assert_eq!(order, vec![a, text, b]);

        // Traversal of a subtree does not leak into siblings
        let inner: Vec<NodeId> = tree.descendants(a).map(|(id, _)| id).collect();
        assert_eq!(inner, vec![text]);
    }

    #[test]
    fn test_remove_children() {
        let (mut tree, main, a, _) = sample();
        assert_eq!(tree.remove_children(main).unwrap(), 2);
        assert!(!tree.has_children(main));
        assert_eq!(tree.parent(a), None);
    }

    #[test]
    fn test_generation_tracks_effective_mutations() {
        let (mut tree, _, a, _) = sample();
        let before = tree.generation();

        tree.add_class(a, "card").unwrap();
        let after_add = tree.generation();
        assert!(after_add.is_newer_than(before));

        // No-op mutations leave the generation alone
        tree.add_class(a, "card").unwrap();
        tree.remove_attr(a, "missing").unwrap();
        assert_eq!(tree.generation(), after_add);
    }

    #[test]
    fn test_import_subtree() {
        let (src, main, _, _) = sample();
        let mut dst = DomTree::new();
        let copy = dst.import_subtree(&src, main).unwrap();
        assert_eq!(dst.tag_name(copy), Some("main"));
        assert_eq!(dst.child_ids(copy).count(), 2);
        assert_eq!(dst.parent(copy), None);
    }

    #[test]
    fn test_text_content() {
        let (mut tree, main, a, b) = sample();
        tree.set_text_content(a, "Hello ").unwrap();
        tree.set_text_content(b, "World").unwrap();
        assert_eq!(tree.text_content(main), "Hello World");
    }
}
