//! Query entry points
//!
//! One [`Amoeba`] instance per document. It owns nothing global: handles and
//! the [`Util`] namespace it returns are bound to its document and config.

use std::rc::Rc;

use amoeba_dom::{Document, NodeId, SharedDocument};

use crate::config::Config;
use crate::handle::{NodeApi, NodeHandle};
use crate::util::Util;

/// Toolkit instance bound to one document
#[derive(Debug, Clone)]
pub struct Amoeba {
    document: SharedDocument,
    config: Rc<Config>,
}

impl Amoeba {
    /// Bind to `document` with the default config
    pub fn new(document: Document) -> Self {
        Self::with_config(document, Config::default())
    }

    pub fn with_config(document: Document, config: Config) -> Self {
        Self::from_shared(document.shared(), config)
    }

    /// Bind to a document that is already shared
    pub fn from_shared(document: SharedDocument, config: Config) -> Self {
        tracing::debug!(url = %document.borrow().url(), ?config, "amoeba bound to document");
        Self {
            document,
            config: Rc::new(config),
        }
    }

    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle on `node`, absent for `None`
    pub fn wrap(&self, node: Option<NodeId>) -> NodeHandle {
        NodeHandle::new(Rc::clone(&self.document), Rc::clone(&self.config), node)
    }

    /// Handle on the document node
    pub fn root(&self) -> NodeHandle {
        let root = self.document.borrow().tree.root();
        self.wrap(Some(root))
    }

    /// Handle on `<body>`, absent if the document has none
    pub fn body(&self) -> NodeHandle {
        let body = self.document.borrow().body().to_option();
        self.wrap(body)
    }

    /// First element matching `selector` below `scope` (the whole document
    /// when `None`)
    pub fn get(&self, selector: &str, scope: Option<&NodeHandle>) -> Option<NodeHandle> {
        self.scope(scope).get(selector).present()
    }

    /// All elements matching `selector` below `scope`, in document order
    pub fn get_all(&self, selector: &str, scope: Option<&NodeHandle>) -> Vec<NodeHandle> {
        self.scope(scope).get_all(selector)
    }

    fn scope(&self, scope: Option<&NodeHandle>) -> NodeHandle {
        match scope {
            Some(handle) => handle.clone(),
            None => self.root(),
        }
    }

    /// Utility namespace bound to this document
    pub fn util(&self) -> Util {
        Util::new(Rc::clone(&self.document), Rc::clone(&self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amoeba_dom::parse_html;

    #[test]
    fn test_get_scoped_and_unscoped() {
        let amoeba = Amoeba::new(parse_html(
            "<div id='a'><p class='x'>1</p></div><div id='b'><p class='x'>2</p></div>",
        ));

        let all = amoeba.get_all("p.x", None);
        assert_eq!(all.iter().map(NodeHandle::text).collect::<Vec<_>>(), vec!["1", "2"]);

        let b = amoeba.get("#b", None).unwrap();
        let scoped = amoeba.get("p", Some(&b)).unwrap();
        assert_eq!(scoped.text(), "2");

        assert!(amoeba.get("#missing", None).is_none());
        assert!(amoeba.get_all("p", Some(&amoeba.wrap(None))).is_empty());
    }

    #[test]
    fn test_instances_are_independent() {
        let first = Amoeba::new(parse_html("<i id='x'></i>"));
        let second = Amoeba::new(parse_html("<b id='x'></b>"));

        assert_eq!(first.get("#x", None).and_then(|h| h.tag_name()).as_deref(), Some("i"));
        assert_eq!(second.get("#x", None).and_then(|h| h.tag_name()).as_deref(), Some("b"));
        assert!(!Rc::ptr_eq(first.document(), second.document()));
    }
}
