//! Selector-filtered traversal
//!
//! Every function returns element nodes in document order. A `None`
//! selector matches everything; a selector that fails to parse matches
//! nothing.

use amoeba_dom::{DomTree, NodeId, Selector};

use crate::config::SiblingScan;

/// Compiled form of an optional selector argument
#[derive(Debug, Clone)]
pub enum Filter {
    Any,
    Selector(Selector),
    Nothing,
}

impl Filter {
    pub fn new(selector: Option<&str>) -> Self {
        match selector {
            None => Filter::Any,
            Some(source) => match Selector::parse(source) {
                Ok(selector) => Filter::Selector(selector),
                Err(err) => {
                    tracing::warn!(selector = source, %err, "selector matches nothing");
                    Filter::Nothing
                }
            },
        }
    }

    pub fn accepts(&self, tree: &DomTree, node: NodeId) -> bool {
        match self {
            Filter::Any => true,
            Filter::Selector(selector) => selector.matches(tree, node),
            Filter::Nothing => false,
        }
    }
}

/// Direct element children of `node`
pub fn children(tree: &DomTree, node: NodeId, selector: Option<&str>) -> Vec<NodeId> {
    let filter = Filter::new(selector);
    tree.element_children(node)
        .filter(|&child| filter.accepts(tree, child))
        .collect()
}

/// Element children of the parent of `node`, without `node` itself
pub fn siblings(tree: &DomTree, node: NodeId, selector: Option<&str>) -> Vec<NodeId> {
    let Some(parent) = tree.parent(node) else {
        return Vec::new();
    };
    let mut list = children(tree, parent, selector);
    if let Some(index) = list.iter().position(|&n| n == node) {
        list.remove(index);
    }
    list
}

/// Nearest following element sibling
pub fn next(tree: &DomTree, node: NodeId, selector: Option<&str>, scan: SiblingScan) -> Option<NodeId> {
    scan_siblings(tree, node, selector, scan, DomTree::next_sibling)
}

/// Nearest preceding element sibling
pub fn previous(tree: &DomTree, node: NodeId, selector: Option<&str>, scan: SiblingScan) -> Option<NodeId> {
    scan_siblings(tree, node, selector, scan, DomTree::prev_sibling)
}

fn scan_siblings(
    tree: &DomTree,
    node: NodeId,
    selector: Option<&str>,
    scan: SiblingScan,
    step: fn(&DomTree, NodeId) -> Option<NodeId>,
) -> Option<NodeId> {
    let filter = Filter::new(selector);
    let mut current = step(tree, node);
    while let Some(sibling) = current {
        if tree.is_element(sibling) {
            if filter.accepts(tree, sibling) {
                return Some(sibling);
            }
            if scan == SiblingScan::Abort {
                return None;
            }
        }
        current = step(tree, sibling);
    }
    None
}
