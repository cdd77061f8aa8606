//! DOM Operation Errors

use crate::NodeId;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node not found
    #[error("node {0:?} not found")]
    NotFound(NodeId),

    /// Inserting a node into its own subtree
    #[error("hierarchy request error: {child:?} cannot be placed under {parent:?}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    /// Element operation on a non-element node
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomError::NotAnElement(NodeId(7));
        assert_eq!(err.to_string(), "node NodeId(7) is not an element");
    }
}
