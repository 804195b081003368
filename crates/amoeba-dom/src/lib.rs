//! Amoeba DOM - host document tree
//!
//! Arena-allocated document tree with the primitives the Amoeba toolkit
//! builds on: link mutation, attribute and class access, selector matching
//! and three-phase event dispatch.

mod classlist;
mod document;
mod events;
mod node;
mod operations;
mod parser;
mod selector;
mod tree;

pub use classlist::ClassList;
pub use document::{Document, SharedDocument};
pub use events::{
    dispatch, Event, EventPhase, HandlerId, ListenerCallback, ListenerOptions, ListenerRegistry,
};
pub use node::{Attribute, ElementData, Node, NodeData};
pub use operations::{DomError, DomResult};
pub use parser::{parse_html, HtmlParser};
pub use selector::{Selector, SelectorError};
pub use tree::{Children, DomTree};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for a missing link
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this id points at a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Convert a link into an `Option`
    #[inline]
    pub fn to_option(self) -> Option<NodeId> {
        if self.is_valid() { Some(self) } else { None }
    }

    /// Raw arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
