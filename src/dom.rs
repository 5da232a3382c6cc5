//! Document capability - the live tree the engine renders into.
//!
//! The engine never touches a concrete document API. It drives an object-safe
//! [`Document`] through copyable [`DomNode`] handles, so the same reconciler
//! works against a browser bridge, a scene graph, or the in-memory
//! implementation in [`memory`](crate::memory) that tests and demos use.
//!
//! # Contract
//!
//! Handles are opaque: the engine stores and compares them but never inspects
//! them. The implementation owns the mapping from handle to real node. All
//! methods are synchronous and must not call back into the engine while they
//! run; listeners registered through [`Document::add_listener`] are fired by
//! the host *between* engine operations, never during one.

use std::rc::Rc;

// =============================================================================
// HANDLES
// =============================================================================

/// Opaque handle to one artifact owned by a [`Document`].
///
/// Plain data: copying a handle never copies the artifact behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomNode(pub u64);

/// Event callback wired onto an element artifact.
///
/// Reference counted so the document can keep it alive for the artifact's
/// lifetime and fire it any number of times.
pub type EventListener = Rc<dyn Fn()>;

// =============================================================================
// CAPABILITY TRAIT
// =============================================================================

/// The operations the engine needs from a live document.
///
/// Methods take `&self`; implementations use interior mutability so the
/// engine can hold the document behind an `Rc<dyn Document>`.
pub trait Document {
    /// Creates a detached text artifact with the given content.
    fn create_text(&self, text: &str) -> DomNode;

    /// Creates a detached element artifact with the given tag name.
    fn create_element(&self, name: &str) -> DomNode;

    /// Sets a named attribute on an element artifact.
    fn set_attribute(&self, node: DomNode, name: &str, value: &str);

    /// Removes a named attribute from an element artifact. The engine
    /// rebuilds elements instead of patching them, so it never calls this
    /// itself; it is part of the capability for hosts that patch around
    /// the engine.
    fn remove_attribute(&self, node: DomNode, name: &str);

    /// Registers an event listener on an element artifact. Multiple
    /// listeners for the same event accumulate.
    fn add_listener(&self, node: DomNode, event: &str, listener: EventListener);

    /// Inserts `node` into `container`, immediately before `before`, or at
    /// the end when `before` is `None`. Re-inserting an attached artifact
    /// moves it.
    fn insert(&self, container: DomNode, node: DomNode, before: Option<DomNode>);

    /// Detaches `node` from its container. Must tolerate an already
    /// detached node silently.
    fn remove(&self, node: DomNode);

    /// The container `node` is currently attached to, if any.
    fn container_of(&self, node: DomNode) -> Option<DomNode>;
}
