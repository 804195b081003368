//! Node handle
//!
//! A [`NodeHandle`] is the chainable wrapper over one node of a shared
//! document. A handle may be absent (wrapping no node); every operation on an
//! absent handle is a no-op or yields absent/empty results.

use std::fmt;
use std::rc::Rc;

use amoeba_dom::{
    dispatch, ClassList, Event, HandlerId, ListenerCallback, ListenerOptions, NodeId, Selector,
    SharedDocument,
};

use crate::config::{Config, DelegationPhase};
use crate::insert::{self, Content, Position};
use crate::traverse::{self, Filter};

/// Caller-supplied event handler. Clones share identity, which is what
/// [`NodeApi::off`] matches on.
#[derive(Clone)]
pub struct Handler {
    id: HandlerId,
    func: Rc<dyn Fn(&mut Event, &NodeHandle)>,
}

impl Handler {
    pub fn new(func: impl Fn(&mut Event, &NodeHandle) + 'static) -> Self {
        Self {
            id: HandlerId::next(),
            func: Rc::new(func),
        }
    }

    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Invoke directly, outside of any dispatch
    pub fn call(&self, event: &mut Event, node: &NodeHandle) {
        (self.func)(event, node)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Event type, optionally paired with a delegation selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSpec {
    pub event_type: String,
    pub selector: Option<String>,
}

impl From<&str> for EventSpec {
    fn from(event_type: &str) -> Self {
        Self {
            event_type: event_type.to_string(),
            selector: None,
        }
    }
}

impl From<(&str, &str)> for EventSpec {
    fn from((event_type, selector): (&str, &str)) -> Self {
        Self {
            event_type: event_type.to_string(),
            selector: Some(selector.to_string()),
        }
    }
}

/// Operations of a node handle
pub trait NodeApi: Sized {
    /// Insert content relative to this node; `None` uses the configured
    /// default position
    fn insert(&self, content: impl Into<Content>, position: impl Into<Option<Position>>) -> &Self;

    /// First descendant matching `selector`
    fn get(&self, selector: &str) -> Self;

    /// All descendants matching `selector`, in document order
    fn get_all(&self, selector: &str) -> Vec<Self>;

    fn children(&self, selector: Option<&str>) -> Vec<Self>;

    fn siblings(&self, selector: Option<&str>) -> Vec<Self>;

    fn next(&self, selector: Option<&str>) -> Self;

    fn previous(&self, selector: Option<&str>) -> Self;

    /// Whether `other` lies strictly inside this node
    fn contains(&self, other: &Self) -> bool;

    fn matches(&self, selector: &str) -> bool;

    fn add_class(&self, name: &str) -> &Self;

    fn remove_class(&self, name: &str) -> &Self;

    /// Bind `handler`; a selector in `spec` makes the binding delegated
    fn on(&self, spec: impl Into<EventSpec>, handler: &Handler) -> &Self;

    /// Remove every binding of `handler` for `event_type` on this node
    fn off(&self, event_type: &str, handler: &Handler) -> &Self;
}

/// Handle on one (possibly absent) node of a shared document
#[derive(Clone)]
pub struct NodeHandle {
    document: SharedDocument,
    config: Rc<Config>,
    node: Option<NodeId>,
}

impl NodeHandle {
    pub(crate) fn new(document: SharedDocument, config: Rc<Config>, node: Option<NodeId>) -> Self {
        Self {
            document,
            config,
            node,
        }
    }

    fn wrap(&self, node: Option<NodeId>) -> Self {
        Self::new(Rc::clone(&self.document), Rc::clone(&self.config), node)
    }

    fn wrap_all(&self, nodes: Vec<NodeId>) -> Vec<Self> {
        nodes.into_iter().map(|node| self.wrap(Some(node))).collect()
    }

    /// The wrapped node id
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn is_absent(&self) -> bool {
        self.node.is_none()
    }

    /// `Some(self)` unless absent
    pub fn present(self) -> Option<Self> {
        self.node.map(|_| self)
    }

    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    pub fn tag_name(&self) -> Option<String> {
        let node = self.node?;
        self.document.borrow().tree.tag_name(node).map(str::to_string)
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        let node = self.node?;
        self.document.borrow().tree.get_attr(node, name).map(str::to_string)
    }

    pub fn set_attr(&self, name: &str, value: &str) -> &Self {
        if let Some(node) = self.node {
            self.document.borrow_mut().tree.set_attr(node, name, value);
        }
        self
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.class_list().is_some_and(|list| list.contains(name))
    }

    /// Concatenated descendant text
    pub fn text(&self) -> String {
        match self.node {
            Some(node) => self.document.borrow().tree.text_content(node),
            None => String::new(),
        }
    }

    pub fn parent(&self) -> Self {
        let parent = self
            .node
            .and_then(|node| self.document.borrow().tree.parent(node));
        self.wrap(parent)
    }

    /// Fire a bubbling event at this node
    pub fn dispatch(&self, event_type: &str) -> Option<Event> {
        let node = self.node?;
        Some(dispatch(&self.document, node, Event::new(event_type)))
    }

    fn class_list(&self) -> Option<ClassList> {
        let node = self.node?;
        let doc = self.document.borrow();
        if !doc.tree.is_element(node) {
            return None;
        }
        Some(ClassList::parse(doc.tree.get_attr(node, "class").unwrap_or_default()))
    }

    /// Apply `edit` to every whitespace-separated name; the attribute is
    /// only written when the set changed
    fn edit_classes(&self, names: &str, edit: fn(&mut ClassList, &str) -> bool) {
        let (Some(node), Some(mut list)) = (self.node, self.class_list()) else {
            return;
        };
        let mut changed = false;
        for name in names.split_whitespace() {
            changed |= edit(&mut list, name);
        }
        if changed {
            self.document.borrow_mut().tree.set_attr(node, "class", &list.value());
        }
    }

    fn query(&self, selector: &str) -> Vec<NodeId> {
        let Some(node) = self.node else {
            return Vec::new();
        };
        match compile(selector) {
            Some(selector) => selector.query_all(&self.document.borrow().tree, node),
            None => Vec::new(),
        }
    }

    /// Swap handles for node ids of this document. Absent handles and
    /// handles on other documents are dropped.
    fn localize(&self, content: Content) -> Content {
        match content {
            Content::Handle(handle) => match handle.node {
                Some(node) if Rc::ptr_eq(&handle.document, &self.document) => Content::Node(node),
                Some(node) => {
                    tracing::warn!(?node, "handle belongs to another document, item skipped");
                    Content::List(Vec::new())
                }
                None => Content::List(Vec::new()),
            },
            Content::List(items) => {
                Content::List(items.into_iter().map(|item| self.localize(item)).collect())
            }
            other => other,
        }
    }

    fn listener(&self, node: NodeId, spec: &EventSpec, handler: &Handler) -> (ListenerOptions, ListenerCallback) {
        let document = Rc::downgrade(&self.document);
        let config = Rc::clone(&self.config);
        let func = Rc::clone(&handler.func);

        match &spec.selector {
            Some(selector) => {
                let filter = Filter::new(Some(selector));
                let options = ListenerOptions {
                    capture: self.config.delegation_phase == DelegationPhase::Capture,
                    once: false,
                    delegate: Some(selector.clone()),
                };
                let callback: ListenerCallback = Rc::new(move |event: &mut Event| {
                    let Some(document) = document.upgrade() else {
                        return;
                    };
                    let matched = filter.accepts(&document.borrow().tree, event.target);
                    if !matched {
                        return;
                    }
                    let target = NodeHandle::new(document, Rc::clone(&config), Some(event.target));
                    func(event, &target);
                    event.stop_propagation();
                });
                (options, callback)
            }
            None => {
                let callback: ListenerCallback = Rc::new(move |event: &mut Event| {
                    let Some(document) = document.upgrade() else {
                        return;
                    };
                    let this = NodeHandle::new(document, Rc::clone(&config), Some(node));
                    func(event, &this);
                });
                (ListenerOptions::default(), callback)
            }
        }
    }
}

fn compile(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(selector) => Some(selector),
        Err(err) => {
            tracing::warn!(selector, %err, "selector matches nothing");
            None
        }
    }
}

impl NodeApi for NodeHandle {
    fn insert(&self, content: impl Into<Content>, position: impl Into<Option<Position>>) -> &Self {
        if let Some(node) = self.node {
            let position = position.into().unwrap_or(self.config.default_position);
            let content = self.localize(content.into());
            insert::insert(&mut self.document.borrow_mut().tree, node, content, position);
        }
        self
    }

    fn get(&self, selector: &str) -> Self {
        let first = self.node.and_then(|node| {
            let selector = compile(selector)?;
            selector.query_first(&self.document.borrow().tree, node)
        });
        self.wrap(first)
    }

    fn get_all(&self, selector: &str) -> Vec<Self> {
        self.wrap_all(self.query(selector))
    }

    fn children(&self, selector: Option<&str>) -> Vec<Self> {
        let Some(node) = self.node else {
            return Vec::new();
        };
        let nodes = traverse::children(&self.document.borrow().tree, node, selector);
        self.wrap_all(nodes)
    }

    fn siblings(&self, selector: Option<&str>) -> Vec<Self> {
        let Some(node) = self.node else {
            return Vec::new();
        };
        let nodes = traverse::siblings(&self.document.borrow().tree, node, selector);
        self.wrap_all(nodes)
    }

    fn next(&self, selector: Option<&str>) -> Self {
        let next = self.node.and_then(|node| {
            traverse::next(&self.document.borrow().tree, node, selector, self.config.sibling_scan)
        });
        self.wrap(next)
    }

    fn previous(&self, selector: Option<&str>) -> Self {
        let previous = self.node.and_then(|node| {
            traverse::previous(&self.document.borrow().tree, node, selector, self.config.sibling_scan)
        });
        self.wrap(previous)
    }

    fn contains(&self, other: &Self) -> bool {
        match (self.node, other.node) {
            (Some(node), Some(other_node)) if Rc::ptr_eq(&self.document, &other.document) => {
                self.document.borrow().tree.is_ancestor(node, other_node)
            }
            _ => false,
        }
    }

    fn matches(&self, selector: &str) -> bool {
        match self.node {
            Some(node) => Filter::new(Some(selector)).accepts(&self.document.borrow().tree, node),
            None => false,
        }
    }

    fn add_class(&self, name: &str) -> &Self {
        self.edit_classes(name, ClassList::add);
        self
    }

    fn remove_class(&self, name: &str) -> &Self {
        self.edit_classes(name, ClassList::remove);
        self
    }

    fn on(&self, spec: impl Into<EventSpec>, handler: &Handler) -> &Self {
        let Some(node) = self.node else {
            return self;
        };
        let spec = spec.into();
        let (options, callback) = self.listener(node, &spec, handler);
        let added = self.document.borrow_mut().listeners.add(
            node,
            &spec.event_type,
            handler.id,
            options,
            callback,
        );
        tracing::debug!(
            ?node,
            event = %spec.event_type,
            delegate = spec.selector.as_deref(),
            added,
            "bound handler"
        );
        self
    }

    fn off(&self, event_type: &str, handler: &Handler) -> &Self {
        if let Some(node) = self.node {
            let removed = self
                .document
                .borrow_mut()
                .listeners
                .remove(node, event_type, handler.id);
            tracing::debug!(?node, event = event_type, removed, "unbound handler");
        }
        self
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHandle").field("node", &self.node).finish_non_exhaustive()
    }
}

/// Handles are equal when they wrap the same node of the same document
impl PartialEq for NodeHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.document, &other.document) && self.node == other.node
    }
}

impl From<&NodeHandle> for Content {
    fn from(handle: &NodeHandle) -> Self {
        Content::Handle(handle.clone())
    }
}

impl From<NodeHandle> for Content {
    fn from(handle: NodeHandle) -> Self {
        Content::Handle(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amoeba_dom::{parse_html, Document};
    use std::cell::RefCell;

    fn handle(html: &str, id: &str) -> NodeHandle {
        let doc = parse_html(html);
        let node = doc.get_element_by_id(id);
        NodeHandle::new(doc.shared(), Rc::new(Config::default()), node)
    }

    #[test]
    fn test_absent_handle_is_inert() {
        let absent = NodeHandle::new(Document::default().shared(), Rc::new(Config::default()), None);
        let handler = Handler::new(|_, _| panic!("never called"));

        assert!(absent.is_absent());
        assert!(absent.insert("text", Position::Top).children(None).is_empty());
        assert!(absent.get("*").is_absent());
        assert!(absent.get_all("*").is_empty());
        assert!(absent.next(None).is_absent());
        assert!(absent.parent().is_absent());
        assert!(!absent.matches("*"));
        assert!(!absent.add_class("x").has_class("x"));
        assert!(absent.on("click", &handler).dispatch("click").is_none());
        assert_eq!(absent.text(), "");
        assert!(absent.clone().present().is_none());
    }

    #[test]
    fn test_class_edits_are_idempotent() {
        let div = handle("<div id='d' class='a'></div>", "d");
        div.add_class("x").add_class("x");
        assert_eq!(div.attr("class").as_deref(), Some("a x"));

        div.remove_class("missing");
        assert_eq!(div.attr("class").as_deref(), Some("a x"));

        div.add_class("y  z").remove_class("a x");
        assert_eq!(div.attr("class").as_deref(), Some("y z"));
        assert!(div.has_class("z"));
    }

    #[test]
    fn test_remove_class_does_not_create_attribute() {
        let div = handle("<div id='d'></div>", "d");
        div.remove_class("x");
        assert_eq!(div.attr("class"), None);
    }

    #[test]
    fn test_contains_is_strict() {
        let outer = handle("<div id='o'><p><span id='s'></span></p></div>", "o");
        let span = outer.get("#s");
        assert!(outer.contains(&span));
        assert!(!span.contains(&outer));
        assert!(!outer.contains(&outer));
    }

    #[test]
    fn test_get_returns_first_match_in_document_order() {
        let list = handle(
            "<ul id='l'><li id='a'><b id='inner' class='hit'></b></li><li id='b' class='hit'></li></ul>",
            "l",
        );
        assert_eq!(list.get(".hit").attr("id").as_deref(), Some("inner"));
        assert_eq!(list.get("li").attr("id").as_deref(), Some("a"));
        assert!(list.get("li >").is_absent());
        assert!(list.get("p").is_absent());
    }

    #[test]
    fn test_direct_handler_gets_bound_node() {
        let div = handle("<div id='d'><b id='b'></b></div>", "d");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let handler = Handler::new(move |event, this| {
            log.borrow_mut().push((this.node(), event.target));
        });

        div.on("click", &handler);
        let b = div.get("#b");
        b.dispatch("click");

        assert_eq!(*seen.borrow(), vec![(div.node(), b.node().unwrap())]);

        div.off("click", &handler);
        b.dispatch("click");
        assert_eq!(seen.borrow().len(), 1);
    }
}
