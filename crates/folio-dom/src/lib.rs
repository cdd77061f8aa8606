//! Folio DOM - Document Object Model
//!
//! Arena-backed DOM tree used by the Folio runtime. Nodes are addressed by
//! [`NodeId`] and every mutation bumps the tree's [`Generation`], which lets
//! callers detect whether anything changed between two points in time.

mod node;
mod tree;
mod document;
mod element;
mod geometry;
mod generation;
mod operations;

pub use node::{Node, NodeData, ElementData, Attribute};
pub use tree::{DomTree, Children, Descendants};
pub use document::Document;
pub use element::SimpleSelector;
pub use geometry::{Rect, Viewport};
pub use generation::Generation;
pub use operations::{DomError, DomResult};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root (document) node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Is this a real node reference?
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Raw arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Build an id from a raw arena index
    #[inline]
    pub fn from_index(index: usize) -> Self {
        NodeId(index as u32)
    }
}
