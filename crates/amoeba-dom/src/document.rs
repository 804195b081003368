//! Document - High-level document API

use std::cell::RefCell;
use std::rc::Rc;

use crate::{DomTree, ListenerRegistry, NodeId};

/// Document shared between handles on a single thread
pub type SharedDocument = Rc<RefCell<Document>>;

/// HTML Document
#[derive(Debug)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Event listeners attached to nodes of `tree`
    pub listeners: ListenerRegistry,
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
    /// Create a document with an `html > (head, body)` skeleton
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();

        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        // Fresh elements under the document node cannot fail to link
        let _ = tree.append_child(tree.root(), html);
        let _ = tree.append_child(html, head);
        let _ = tree.append_child(html, body);

        Self {
            tree,
            listeners: ListenerRegistry::new(),
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
            listeners: ListenerRegistry::new(),
            url: url.to_string(),
            html_element: NodeId::NONE,
            head_element: NodeId::NONE,
            body_element: NodeId::NONE,
        }
    }

    /// Wrap into a shared handle
    pub fn shared(self) -> SharedDocument {
        Rc::new(RefCell::new(self))
    }

    /// Locate `<html>`, `<head>` and `<body>` after the tree was built by hand
    pub fn finalize(&mut self) {
        let root = self.tree.root();
        self.html_element = self.child_with_tag(root, "html").unwrap_or(NodeId::NONE);
        if self.html_element.is_valid() {
            self.head_element = self
                .child_with_tag(self.html_element, "head")
                .unwrap_or(NodeId::NONE);
            self.body_element = self
                .child_with_tag(self.html_element, "body")
                .unwrap_or(NodeId::NONE);
        }
    }

    fn child_with_tag(&self, parent: NodeId, tag: &str) -> Option<NodeId> {
        self.tree
            .element_children(parent)
            .find(|&id| self.tree.tag_name(id) == Some(tag))
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get document title
    pub fn title(&self) -> String {
        if !self.head_element.is_valid() {
            return String::new();
        }
        self.child_with_tag(self.head_element, "title")
            .map(|title| self.tree.text_content(title))
            .unwrap_or_default()
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

    /// Get element by ID
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree
            .descendants(self.tree.root())
            .into_iter()
            .find(|&node| self.tree.get_attr(node, "id") == Some(id))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}
