//! Positional insertion engine
//!
//! Resolves a [`Position`] against a target node into a parent and an
//! optional reference sibling, then links each content item in before the
//! reference (or appends it). Resolution is redone for every item against
//! the live tree.

use std::fmt;

use amoeba_dom::{DomTree, NodeId};
use serde::{Deserialize, Serialize};

use crate::config::SiblingScan;
use crate::each::each;
use crate::handle::NodeHandle;
use crate::traverse;
use crate::value::{classify, Category, Value};

/// Where content lands relative to the target node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// Before the first element child of the target
    Top,
    /// After the last child of the target
    #[default]
    Bottom,
    /// Immediately before the target, in the target's parent
    Before,
    /// After the target, before its next element sibling
    After,
    /// After the element child at this index; negative indices count from
    /// the end
    Index(i64),
}

impl Position {
    /// Lenient parse: keywords and integers; anything else is `Bottom`
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "top" => Position::Top,
            "bottom" => Position::Bottom,
            "before" => Position::Before,
            "after" => Position::After,
            other => match other.parse::<i64>() {
                Ok(index) => Position::Index(index),
                Err(_) => {
                    tracing::debug!(position = s, "unknown position, appending");
                    Position::Bottom
                }
            },
        }
    }

    /// Interpret a dynamic value: numbers are indices, strings are parsed,
    /// anything else appends
    pub fn from_value(value: &Value) -> Self {
        match (classify(value), value) {
            (Category::Number, Value::Number(n)) if n.is_finite() => Position::Index(n.trunc() as i64),
            (Category::String, Value::String(s)) => Position::parse(s),
            _ => Position::Bottom,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Top => f.write_str("top"),
            Position::Bottom => f.write_str("bottom"),
            Position::Before => f.write_str("before"),
            Position::After => f.write_str("after"),
            Position::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Position {
    fn from(s: &str) -> Self {
        Position::parse(s)
    }
}

impl From<i64> for Position {
    fn from(index: i64) -> Self {
        Position::Index(index)
    }
}

impl From<i32> for Position {
    fn from(index: i32) -> Self {
        Position::Index(index.into())
    }
}

/// Content to insert
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Becomes a new text node
    Text(String),
    /// An existing node, moved into place
    Node(NodeId),
    /// A node handle; only inserted through [`NodeApi::insert`] on a handle
    /// of the same document
    ///
    /// [`NodeApi::insert`]: crate::NodeApi::insert
    Handle(NodeHandle),
    /// Items inserted in order
    List(Vec<Content>),
}

impl Content {
    /// Derive content from a dynamic value. Strings, numbers and booleans
    /// render as text; sequences and node collections become lists; other
    /// categories contribute nothing.
    pub fn from_value(value: &Value) -> Self {
        match classify(value) {
            Category::String | Category::Number | Category::Boolean => Content::Text(value.to_string()),
            Category::Node => match value {
                Value::Node(id) => Content::Node(*id),
                _ => Content::List(Vec::new()),
            },
            Category::Sequence | Category::NodeCollection => {
                let mut items = Vec::new();
                each(value, |item, _| items.push(Content::from_value(item)));
                Content::List(items)
            }
            category => {
                tracing::debug!(%category, "value is not insertable content");
                Content::List(Vec::new())
            }
        }
    }

    /// Flatten nested lists, preserving order
    fn flatten_into(self, out: &mut Vec<Content>) {
        match self {
            Content::List(items) => items.into_iter().for_each(|item| item.flatten_into(out)),
            item => out.push(item),
        }
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Content::Text(s.to_string())
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Content::Text(s)
    }
}

impl From<NodeId> for Content {
    fn from(id: NodeId) -> Self {
        Content::Node(id)
    }
}

impl From<&Value> for Content {
    fn from(value: &Value) -> Self {
        Content::from_value(value)
    }
}

impl<T: Into<Content>> From<Vec<T>> for Content {
    fn from(items: Vec<T>) -> Self {
        Content::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Content>, const N: usize> From<[T; N]> for Content {
    fn from(items: [T; N]) -> Self {
        Content::List(items.into_iter().map(Into::into).collect())
    }
}

/// Insert `content` relative to `target`.
///
/// Out-of-range indices append; `Before`/`After` on a parentless target
/// skip the item. [`Content::Handle`] items are skipped, since the tree
/// cannot tell which document they belong to. Nodes placed earlier in the same call are never used as
/// anchors, which keeps the content's order intact at every position.
pub fn insert(tree: &mut DomTree, target: NodeId, content: impl Into<Content>, position: Position) {
    if tree.get(target).is_none() {
        tracing::debug!(?target, "insert into unknown node ignored");
        return;
    }

    let mut flat = Vec::new();
    content.into().flatten_into(&mut flat);
    let items: Vec<NodeId> = flat
        .into_iter()
        .filter_map(|item| match item {
            Content::Text(text) => Some(tree.create_text(&text)),
            Content::Node(id) => Some(id),
            Content::Handle(handle) => {
                tracing::warn!(node = ?handle.node(), "handle of unknown document, item skipped");
                None
            }
            Content::List(_) => None,
        })
        .collect();

    tracing::debug!(?target, %position, items = items.len(), "inserting content");

    let mut placed: Vec<NodeId> = Vec::with_capacity(items.len());
    for item in items {
        let Some((parent, reference)) = resolve(tree, target, position, &placed) else {
            tracing::debug!(?target, %position, "no parent to anchor to, item skipped");
            continue;
        };
        match tree.insert_before(parent, item, reference) {
            Ok(_) => placed.push(item),
            Err(err) => tracing::warn!(%err, ?item, "item not inserted"),
        }
    }
}

/// Resolve `position` into `(parent, reference)`; `None` when there is
/// nothing to anchor to
pub fn resolve(
    tree: &DomTree,
    target: NodeId,
    position: Position,
    placed: &[NodeId],
) -> Option<(NodeId, Option<NodeId>)> {
    let fresh = |id: &NodeId| !placed.contains(id);

    match position {
        Position::Bottom => Some((target, None)),
        Position::Top => {
            let first = traverse::children(tree, target, None).into_iter().find(fresh);
            Some((target, first))
        }
        Position::Before => tree.parent(target).map(|parent| (parent, Some(target))),
        Position::After => {
            let parent = tree.parent(target)?;
            let mut reference = traverse::next(tree, target, None, SiblingScan::Abort);
            while let Some(r) = reference.filter(|r| !fresh(r)) {
                reference = traverse::next(tree, r, None, SiblingScan::Abort);
            }
            Some((parent, reference))
        }
        Position::Index(index) => {
            let list: Vec<NodeId> = traverse::children(tree, target, None)
                .into_iter()
                .filter(fresh)
                .collect();
            let len = list.len() as i64;
            let index = if index < 0 { index + len } else { index };
            let reference = if (0..len).contains(&index) {
                list.get(index as usize + 1).copied()
            } else {
                None
            };
            Some((target, reference))
        }
    }
}
