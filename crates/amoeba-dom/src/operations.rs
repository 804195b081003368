//! DOM Node Operations errors

use crate::NodeId;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node id does not exist in this tree
    #[error("Node not found: {0:?}")]
    NotFound(NodeId),

    /// Inserting would make a node its own ancestor
    #[error("Hierarchy request error: {child:?} cannot be inserted into {parent:?}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    /// Reference node is not a child of the parent
    #[error("Node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },

    /// Node cannot hold children or cannot be inserted
    #[error("Invalid node type for {0:?}")]
    InvalidNodeType(NodeId),
}
