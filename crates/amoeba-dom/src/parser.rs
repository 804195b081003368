//! HTML5 parsing into a [`Document`]
//!
//! Uses html5ever's build-in RcDom and converts it to the arena tree.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use crate::{Document, DomTree, NodeId};

/// Parse an HTML string into a Document
pub fn parse_html(html: &str) -> Document {
    HtmlParser::new().parse(html)
}

/// HTML5 parser
#[derive(Debug, Default)]
pub struct HtmlParser;

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self
    }

    /// Parse HTML string into a Document
    pub fn parse(&self, html: &str) -> Document {
        self.parse_with_url(html, "about:blank")
    }

    /// Parse HTML with a base URL
    pub fn parse_with_url(&self, html: &str, url: &str) -> Document {
        tracing::debug!("Parsing HTML document: {}", url);

        let dom = match parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
        {
            Ok(dom) => dom,
            Err(err) => {
                tracing::warn!(%err, "HTML input could not be read");
                return Document::empty(url);
            }
        };

        let mut document = Document::empty(url);
        let root = document.tree.root();
        self.convert_node(&dom.document, &mut document.tree, root);
        document.finalize();

        tracing::debug!("Parsed {} nodes", document.tree.len());
        document
    }

    /// Convert an RcDom node (and its subtree) below `parent`
    fn convert_node(&self, handle: &Handle, tree: &mut DomTree, parent: NodeId) {
        let id = match &handle.data {
            RcNodeData::Document => {
                for child in handle.children.borrow().iter() {
                    self.convert_node(child, tree, parent);
                }
                return;
            }
            RcNodeData::Doctype { name, .. } => tree.create_doctype(name),
            RcNodeData::Text { contents } => tree.create_text(&contents.borrow()),
            RcNodeData::Comment { contents } => tree.create_comment(contents),
            RcNodeData::Element { name, attrs, .. } => {
                let id = tree.create_element(&name.local);
                for attr in attrs.borrow().iter() {
                    tree.set_attr(id, &attr.name.local, &attr.value);
                }
                id
            }
            // Processing instructions have no place in an HTML tree
            RcNodeData::ProcessingInstruction { .. } => return,
        };

        if let Err(err) = tree.append_child(parent, id) {
            tracing::warn!(%err, "dropping unlinkable parsed node");
            return;
        }
        for child in handle.children.borrow().iter() {
            self.convert_node(child, tree, id);
        }
    }
}
