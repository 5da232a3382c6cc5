//! In-memory document and manual scheduler.
//!
//! First-party implementations of the two host capabilities, with no real
//! UI behind them. [`MemoryDocument`] keeps artifacts in a slab and offers
//! inspection helpers ([`outer_html`](MemoryDocument::outer_html),
//! [`fire`](MemoryDocument::fire), attribute and child accessors) so tests
//! and demos can observe exactly what the engine did. [`ManualScheduler`]
//! holds flush callbacks until the caller pumps them, standing in for an
//! animation-frame queue.
//!
//! Handles are never reused: detached artifacts stay in the slab until the
//! document itself is dropped. Good enough for tests, not a production
//! backend.

use std::cell::RefCell;
use std::mem;

use indexmap::IndexMap;
use tracing::warn;

use crate::dom::{Document, DomNode, EventListener};
use crate::schedule::Scheduler;

// =============================================================================
// MEMORY DOCUMENT
// =============================================================================

enum NodeKind {
    Text(String),
    Element {
        name: String,
        attributes: IndexMap<String, String>,
        listeners: IndexMap<String, Vec<EventListener>>,
    },
}

struct MemoryNode {
    kind: NodeKind,
    parent: Option<DomNode>,
    children: Vec<DomNode>,
}

#[derive(Default)]
struct Store {
    nodes: Vec<MemoryNode>,
}

impl Store {
    fn get(&self, node: DomNode) -> Option<&MemoryNode> {
        self.nodes.get(node.0 as usize)
    }

    fn get_mut(&mut self, node: DomNode) -> Option<&mut MemoryNode> {
        self.nodes.get_mut(node.0 as usize)
    }

    fn push(&mut self, kind: NodeKind) -> DomNode {
        let handle = DomNode(self.nodes.len() as u64);
        self.nodes.push(MemoryNode {
            kind,
            parent: None,
            children: Vec::new(),
        });
        handle
    }

    fn detach(&mut self, node: DomNode) {
        let parent = match self.get(node) {
            Some(n) => n.parent,
            None => return,
        };
        if let Some(parent_id) = parent {
            if let Some(parent) = self.get_mut(parent_id) {
                parent.children.retain(|child| *child != node);
            }
        }
        if let Some(n) = self.get_mut(node) {
            n.parent = None;
        }
    }
}

/// Live document backed by a plain slab of nodes.
#[derive(Default)]
pub struct MemoryDocument {
    store: RefCell<Store>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a detached text artifact.
    pub fn create_text(&self, text: &str) -> DomNode {
        self.store.borrow_mut().push(NodeKind::Text(text.to_owned()))
    }

    /// Creates a detached element artifact. Also how tests make the
    /// container they render into.
    pub fn create_element(&self, name: &str) -> DomNode {
        self.store.borrow_mut().push(NodeKind::Element {
            name: name.to_owned(),
            attributes: IndexMap::new(),
            listeners: IndexMap::new(),
        })
    }

    // =========================================================================
    // INSPECTION
    // =========================================================================

    /// Content of a text artifact.
    pub fn text_of(&self, node: DomNode) -> Option<String> {
        match &self.store.borrow().get(node)?.kind {
            NodeKind::Text(text) => Some(text.clone()),
            NodeKind::Element { .. } => None,
        }
    }

    /// Tag name of an element artifact.
    pub fn name_of(&self, node: DomNode) -> Option<String> {
        match &self.store.borrow().get(node)?.kind {
            NodeKind::Element { name, .. } => Some(name.clone()),
            NodeKind::Text(_) => None,
        }
    }

    /// Current value of an attribute.
    pub fn attribute(&self, node: DomNode, name: &str) -> Option<String> {
        match &self.store.borrow().get(node)?.kind {
            NodeKind::Element { attributes, .. } => attributes.get(name).cloned(),
            NodeKind::Text(_) => None,
        }
    }

    /// Attached children of an artifact, in document order.
    pub fn children_of(&self, node: DomNode) -> Vec<DomNode> {
        self.store
            .borrow()
            .get(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Whether the artifact is currently attached to a container.
    pub fn is_attached(&self, node: DomNode) -> bool {
        self.store
            .borrow()
            .get(node)
            .is_some_and(|n| n.parent.is_some())
    }

    /// Fires every listener registered for `event` on `node`, in
    /// registration order.
    ///
    /// # Returns
    ///
    /// How many listeners ran.
    pub fn fire(&self, node: DomNode, event: &str) -> usize {
        let listeners: Vec<EventListener> = {
            let store = self.store.borrow();
            match store.get(node).map(|n| &n.kind) {
                Some(NodeKind::Element { listeners, .. }) => {
                    listeners.get(event).cloned().unwrap_or_default()
                }
                _ => Vec::new(),
            }
        };
        // Listeners run with the store released; they may mutate the
        // document through the engine.
        for listener in &listeners {
            listener();
        }
        listeners.len()
    }

    /// Serializes the subtree below `node` the way a browser would print
    /// it. Attributes keep declaration order; listeners are invisible.
    pub fn outer_html(&self, node: DomNode) -> String {
        let mut out = String::new();
        write_node(&self.store.borrow(), node, &mut out);
        out
    }
}

fn write_node(store: &Store, node: DomNode, out: &mut String) {
    let Some(n) = store.get(node) else {
        out.push_str("<!-- unknown node -->");
        return;
    };
    match &n.kind {
        NodeKind::Text(text) => out.push_str(text),
        NodeKind::Element { name, attributes, .. } => {
            out.push('<');
            out.push_str(name);
            for (attr, value) in attributes {
                out.push(' ');
                out.push_str(attr);
                out.push_str("=\"");
                out.push_str(value);
                out.push('"');
            }
            out.push('>');
            for child in &n.children {
                write_node(store, *child, out);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
    }
}

impl Document for MemoryDocument {
    fn create_text(&self, text: &str) -> DomNode {
        MemoryDocument::create_text(self, text)
    }

    fn create_element(&self, name: &str) -> DomNode {
        MemoryDocument::create_element(self, name)
    }

    fn set_attribute(&self, node: DomNode, name: &str, value: &str) {
        let mut store = self.store.borrow_mut();
        match store.get_mut(node).map(|n| &mut n.kind) {
            Some(NodeKind::Element { attributes, .. }) => {
                attributes.insert(name.to_owned(), value.to_owned());
            }
            Some(NodeKind::Text(_)) => warn!(?node, name, "attribute on a text artifact ignored"),
            None => warn!(?node, name, "attribute on an unknown artifact ignored"),
        }
    }

    fn remove_attribute(&self, node: DomNode, name: &str) {
        let mut store = self.store.borrow_mut();
        if let Some(NodeKind::Element { attributes, .. }) = store.get_mut(node).map(|n| &mut n.kind)
        {
            attributes.shift_remove(name);
        }
    }

    fn add_listener(&self, node: DomNode, event: &str, listener: EventListener) {
        let mut store = self.store.borrow_mut();
        match store.get_mut(node).map(|n| &mut n.kind) {
            Some(NodeKind::Element { listeners, .. }) => {
                listeners.entry(event.to_owned()).or_default().push(listener);
            }
            Some(NodeKind::Text(_)) => warn!(?node, event, "listener on a text artifact ignored"),
            None => warn!(?node, event, "listener on an unknown artifact ignored"),
        }
    }

    fn insert(&self, container: DomNode, node: DomNode, before: Option<DomNode>) {
        let mut store = self.store.borrow_mut();
        if store.get(node).is_none() || store.get(container).is_none() {
            warn!(?container, ?node, "insert of an unknown artifact ignored");
            return;
        }
        // Inserting an attached artifact moves it.
        store.detach(node);

        let index = {
            let children = match store.get(container) {
                Some(c) => &c.children,
                None => return,
            };
            match before {
                Some(reference) => match children.iter().position(|c| *c == reference) {
                    Some(index) => index,
                    None => {
                        warn!(?container, ?reference, "reference artifact not in container, appending");
                        children.len()
                    }
                },
                None => children.len(),
            }
        };
        if let Some(container_node) = store.get_mut(container) {
            container_node.children.insert(index, node);
        }
        if let Some(n) = store.get_mut(node) {
            n.parent = Some(container);
        }
    }

    fn remove(&self, node: DomNode) {
        self.store.borrow_mut().detach(node);
    }

    fn container_of(&self, node: DomNode) -> Option<DomNode> {
        self.store.borrow().get(node)?.parent
    }
}

// =============================================================================
// MANUAL SCHEDULER
// =============================================================================

/// Scheduler that holds callbacks until the caller pumps them.
#[derive(Default)]
pub struct ManualScheduler {
    queued: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callbacks waiting to run.
    pub fn pending(&self) -> usize {
        self.queued.borrow().len()
    }

    /// Runs every waiting callback in scheduling order. Callbacks scheduled
    /// while the pump runs wait for the next pump, like work deferred to
    /// the next frame.
    ///
    /// # Returns
    ///
    /// How many callbacks ran.
    pub fn run_pending(&self) -> usize {
        let batch = mem::take(&mut *self.queued.borrow_mut());
        let count = batch.len();
        for callback in batch {
            callback();
        }
        count
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_once(&self, callback: Box<dyn FnOnce()>) {
        self.queued.borrow_mut().push(callback);
    }
}

// =============================================================================
// TESTS
// =============================================================================
