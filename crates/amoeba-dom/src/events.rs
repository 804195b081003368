//! DOM Events
//!
//! Listener registry and three-phase dispatch (capture, target, bubble).
//! Listeners are snapshotted per node before they run, so callbacks may add
//! or remove listeners and mutate the tree while an event is in flight.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{NodeId, SharedDocument};

/// Callback stored in the registry
pub type ListenerCallback = Rc<dyn Fn(&mut Event)>;

/// Identity of a caller-supplied handler, used to remove it again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(pub u64);

impl HandlerId {
    /// Allocate a fresh, process-unique id
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        HandlerId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Event phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventPhase {
    #[default]
    None,
    Capturing,
    AtTarget,
    Bubbling,
}

/// DOM event
#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: String,
    pub target: NodeId,
    pub current_target: Option<NodeId>,
    pub phase: EventPhase,
    pub bubbles: bool,
    pub cancelable: bool,
    default_prevented: bool,
    propagation_stopped: bool,
    immediate_propagation_stopped: bool,
}

impl Event {
    /// Create a bubbling, cancelable event
    pub fn new(event_type: &str) -> Self {
        Self {
            event_type: event_type.to_string(),
            target: NodeId::NONE,
            current_target: None,
            phase: EventPhase::None,
            bubbles: true,
            cancelable: true,
            default_prevented: false,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
        }
    }

    /// Create an event that skips the bubble phase (e.g. `load`)
    pub fn non_bubbling(event_type: &str) -> Self {
        Self {
            bubbles: false,
            ..Self::new(event_type)
        }
    }

    /// Prevent default action
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    /// Stop propagation to further nodes; remaining listeners on the
    /// current node still run
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Stop propagation and skip remaining listeners on the current node
    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_propagation_stopped = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Listener options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    pub capture: bool,
    pub once: bool,
    /// Selector of a delegated binding; part of the listener's identity
    pub delegate: Option<String>,
}

impl ListenerOptions {
    pub fn capture() -> Self {
        Self {
            capture: true,
            ..Self::default()
        }
    }
}

#[derive(Clone)]
struct Listener {
    handler_id: HandlerId,
    options: ListenerOptions,
    callback: ListenerCallback,
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("handler_id", &self.handler_id)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Listeners by target node and event type
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    listeners: HashMap<(NodeId, String), Vec<Listener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener. A second registration of the same handler with the
    /// same options is ignored and returns false.
    pub fn add(
        &mut self,
        node: NodeId,
        event_type: &str,
        handler_id: HandlerId,
        options: ListenerOptions,
        callback: ListenerCallback,
    ) -> bool {
        let list = self
            .listeners
            .entry((node, event_type.to_string()))
            .or_default();
        if list
            .iter()
            .any(|l| l.handler_id == handler_id && l.options == options)
        {
            return false;
        }
        list.push(Listener {
            handler_id,
            options,
            callback,
        });
        true
    }

    /// Remove every listener of `handler_id` for this node and event type,
    /// both phases and delegated bindings included. Returns how many went.
    pub fn remove(&mut self, node: NodeId, event_type: &str, handler_id: HandlerId) -> usize {
        let key = (node, event_type.to_string());
        let Some(list) = self.listeners.get_mut(&key) else {
            return 0;
        };
        let before = list.len();
        list.retain(|l| l.handler_id != handler_id);
        let removed = before - list.len();
        if list.is_empty() {
            self.listeners.remove(&key);
        }
        removed
    }

    /// Number of listeners registered for a node and event type
    pub fn count(&self, node: NodeId, event_type: &str) -> usize {
        self.listeners
            .get(&(node, event_type.to_string()))
            .map_or(0, Vec::len)
    }

    /// Total number of listeners
    pub fn len(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Snapshot the callbacks that fire on `node` in `phase`, dropping
    /// `once` listeners from the registry as they are taken
    fn take_for_phase(
        &mut self,
        node: NodeId,
        event_type: &str,
        phase: EventPhase,
    ) -> Vec<ListenerCallback> {
        let key = (node, event_type.to_string());
        let Some(list) = self.listeners.get_mut(&key) else {
            return Vec::new();
        };

        let fires = |l: &Listener| match phase {
            EventPhase::Capturing => l.options.capture,
            EventPhase::Bubbling => !l.options.capture,
            EventPhase::AtTarget => true,
            EventPhase::None => false,
        };

        let mut selected: Vec<&Listener> = list.iter().filter(|l| fires(l)).collect();
        if phase == EventPhase::AtTarget {
            // Capture listeners run before bubble listeners at the target
            selected.sort_by_key(|l| !l.options.capture);
        }
        let callbacks = selected.iter().map(|l| Rc::clone(&l.callback)).collect();

        list.retain(|l| !(l.options.once && fires(l)));
        if list.is_empty() {
            self.listeners.remove(&key);
        }
        callbacks
    }
}

/// Dispatch `event` at `target`, returning the event after propagation.
///
/// The document is only borrowed while listener snapshots are taken, never
/// while a callback runs.
pub fn dispatch(document: &SharedDocument, target: NodeId, mut event: Event) -> Event {
    event.target = target;

    let path: Vec<NodeId> = {
        let doc = document.borrow();
        let mut path: Vec<NodeId> = doc.tree.ancestors(target).collect();
        path.reverse();
        path
    };
    tracing::debug!(event = %event.event_type, ?target, depth = path.len(), "dispatching event");

    'propagate: {
        for &node in &path {
            if invoke(document, node, EventPhase::Capturing, &mut event) {
                break 'propagate;
            }
        }
        if invoke(document, target, EventPhase::AtTarget, &mut event) {
            break 'propagate;
        }
        if event.bubbles {
            for &node in path.iter().rev() {
                if invoke(document, node, EventPhase::Bubbling, &mut event) {
                    break 'propagate;
                }
            }
        }
    }

    event.phase = EventPhase::None;
    event.current_target = None;
    event
}

/// Run the listeners of one node; returns true once propagation has stopped
fn invoke(document: &SharedDocument, node: NodeId, phase: EventPhase, event: &mut Event) -> bool {
    let callbacks =
        document
            .borrow_mut()
            .listeners
            .take_for_phase(node, &event.event_type, phase);

    for callback in callbacks {
        if event.immediate_propagation_stopped {
            break;
        }
        event.current_target = Some(node);
        event.phase = phase;
        callback(event);
    }
    event.propagation_stopped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;
    use std::cell::RefCell;

    fn recorder(log: &Rc<RefCell<Vec<String>>>, label: &str) -> ListenerCallback {
        let log = Rc::clone(log);
        let label = label.to_string();
        Rc::new(move |event: &mut Event| {
            log.borrow_mut().push(format!("{label}:{:?}", event.phase));
        })
    }

    #[test]
    fn test_capture_target_bubble_order() {
        let doc = Document::new("about:blank").shared();
        let body = doc.borrow().body();
        let button = {
            let mut d = doc.borrow_mut();
            let button = d.tree.create_element("button");
            d.tree.append_child(body, button).unwrap();
            button
        };
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let mut d = doc.borrow_mut();
            let l = &mut d.listeners;
            l.add(body, "click", HandlerId::next(), ListenerOptions::default(), recorder(&log, "body-bubble"));
            l.add(body, "click", HandlerId::next(), ListenerOptions::capture(), recorder(&log, "body-capture"));
            l.add(button, "click", HandlerId::next(), ListenerOptions::default(), recorder(&log, "button"));
        }

        let event = dispatch(&doc, button, Event::new("click"));

        assert_eq!(
            *log.borrow(),
            vec!["body-capture:Capturing", "button:AtTarget", "body-bubble:Bubbling"]
        );
        assert_eq!(event.target, button);
        assert_eq!(event.phase, EventPhase::None);
    }

    #[test]
    fn test_stop_propagation_in_capture() {
        let doc = Document::new("about:blank").shared();
        let body = doc.borrow().body();
        let log = Rc::new(RefCell::new(Vec::new()));
        let stopper: ListenerCallback = Rc::new(|event: &mut Event| event.stop_propagation());
        {
            let mut d = doc.borrow_mut();
            let html = d.document_element();
            d.listeners.add(html, "click", HandlerId::next(), ListenerOptions::capture(), stopper);
            d.listeners.add(body, "click", HandlerId::next(), ListenerOptions::default(), recorder(&log, "body"));
        }

        let event = dispatch(&doc, body, Event::new("click"));
        assert!(event.is_propagation_stopped());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_registry_dedupe_and_remove() {
        let mut registry = ListenerRegistry::new();
        let id = HandlerId::next();
        let noop: ListenerCallback = Rc::new(|_: &mut Event| {});

        assert!(registry.add(NodeId(1), "click", id, ListenerOptions::default(), Rc::clone(&noop)));
        assert!(!registry.add(NodeId(1), "click", id, ListenerOptions::default(), Rc::clone(&noop)));
        assert!(registry.add(NodeId(1), "click", id, ListenerOptions::capture(), Rc::clone(&noop)));
        assert_eq!(registry.count(NodeId(1), "click"), 2);

        assert_eq!(registry.remove(NodeId(1), "click", id), 2);
        assert!(registry.is_empty());
        assert_eq!(registry.remove(NodeId(1), "click", id), 0);
    }

    #[test]
    fn test_once_listener() {
        let doc = Document::new("about:blank").shared();
        let body = doc.borrow().body();
        let log = Rc::new(RefCell::new(Vec::new()));
        let options = ListenerOptions {
            once: true,
            ..ListenerOptions::default()
        };
        doc.borrow_mut()
            .listeners
            .add(body, "load", HandlerId::next(), options, recorder(&log, "load"));

        dispatch(&doc, body, Event::non_bubbling("load"));
        dispatch(&doc, body, Event::non_bubbling("load"));
        assert_eq!(log.borrow().len(), 1);
    }
}
