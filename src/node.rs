//! Shadow nodes - the engine's private mirror of the live document.
//!
//! Every rendered description gets one `ShadowNode` that remembers what
//! the reconciler produced for it: the artifact handle, the rendering
//! function, the state cell, and the sibling/child links used to find the
//! insertion point on re-render. Nodes live in a `NodePool`, a
//! generational slot arena: releasing a slot bumps its generation, so a
//! [`NodeId`] held by a stale queue entry or listener stops resolving
//! instead of aliasing an unrelated node that reused the slot.
//!
//! # Shape
//!
//! ```text
//! container artifact
//!   └─ ShadowNode ── head ─▶ child ── next ─▶ child ── next ─▶ ∅
//!        │                    ▲ prev ◀─┘
//!        └─ output artifact (None while the node renders nothing)
//! ```
//!
//! Siblings are a doubly linked list in description order. A node with no
//! output keeps its place in the list, which is what lets content that was
//! absent appear later at the right position among its siblings.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::content::Render;
use crate::dom::DomNode;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Stable identifier of one shadow node.
///
/// Holds a slot index plus the generation the slot had when the node was
/// created. Resolving an id after its node was destroyed yields nothing,
/// even when the slot has been reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}v{})", self.index, self.generation)
    }
}

// =============================================================================
// SHADOW NODES
// =============================================================================

/// Book-keeping for one rendered description.
pub(crate) struct ShadowNode {
    /// The artifact this node's output is inserted into.
    pub(crate) container: DomNode,
    /// Previous sibling in description order.
    pub(crate) prev: Option<NodeId>,
    /// Next sibling in description order.
    pub(crate) next: Option<NodeId>,
    /// First child.
    pub(crate) head: Option<NodeId>,
    /// Last child.
    pub(crate) tail: Option<NodeId>,
    /// The artifact currently rendered for this node. `None` while the node
    /// renders nothing. Children exist only when this is an element.
    pub(crate) output: Option<DomNode>,
    /// The rendering function, for nodes produced from dynamic content.
    pub(crate) render: Option<Rc<dyn Render>>,
    /// Type-erased state cell owned by the rendering function.
    pub(crate) state: Option<Box<dyn Any>>,
    /// True while the node sits in the update queue.
    pub(crate) update_pending: bool,
}

impl ShadowNode {
    fn new(container: DomNode) -> Self {
        Self {
            container,
            prev: None,
            next: None,
            head: None,
            tail: None,
            output: None,
            render: None,
            state: None,
            update_pending: false,
        }
    }
}

// =============================================================================
// NODE POOL
// =============================================================================

struct Slot {
    generation: u32,
    node: Option<ShadowNode>,
}

/// Generational arena holding every shadow node of one rendering.
pub(crate) struct NodePool {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl NodePool {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Creates a fresh node whose output will go into `container`.
    /// Freed slots are reused before the arena grows.
    pub(crate) fn allocate(&mut self, container: DomNode) -> NodeId {
        self.live += 1;
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(ShadowNode::new(container));
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(ShadowNode::new(container)),
                });
                NodeId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    /// Resolves an id, or `None` when the node has been destroyed.
    pub(crate) fn get(&self, id: NodeId) -> Option<&ShadowNode> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut ShadowNode> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Destroys one node and retires its id.
    ///
    /// # Returns
    ///
    /// `false` when the id was already stale. Releasing never touches the
    /// node's former children; callers walk the tree first.
    pub(crate) fn release(&mut self, id: NodeId) -> bool {
        let Some(slot) = self.slots.get_mut(id.index as usize) else {
            return false;
        };
        if slot.generation != id.generation || slot.node.is_none() {
            return false;
        }
        slot.node = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        true
    }

    /// Number of live nodes.
    pub(crate) fn live(&self) -> usize {
        self.live
    }

    // =========================================================================
    // TREE LINKS
    // =========================================================================

    /// Links `child` as the new last child of `parent`.
    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let old_tail = match self.get(parent) {
            Some(node) => node.tail,
            None => return,
        };
        match self.get_mut(child) {
            Some(node) => {
                node.prev = old_tail;
                node.next = None;
            }
            None => return,
        }
        match old_tail {
            Some(tail_id) => {
                if let Some(tail) = self.get_mut(tail_id) {
                    tail.next = Some(child);
                }
            }
            None => {
                if let Some(node) = self.get_mut(parent) {
                    node.head = Some(child);
                }
            }
        }
        if let Some(node) = self.get_mut(parent) {
            node.tail = Some(child);
        }
        debug_assert!(
            self.links_consistent(parent),
            "sibling links out of shape after append under {parent:?}"
        );
    }

    /// The children of `parent` in description order.
    pub(crate) fn child_ids(&self, parent: NodeId) -> Vec<NodeId> {
        let mut ids = Vec::new();
        let mut cursor = self.get(parent).and_then(|node| node.head);
        while let Some(id) = cursor {
            ids.push(id);
            cursor = self.get(id).and_then(|node| node.next);
        }
        ids
    }

    /// Destroys the whole subtree below `parent` and resets its child list.
    /// `parent` itself survives.
    pub(crate) fn release_children(&mut self, parent: NodeId) {
        // Collect first: the list is edited while nodes are released.
        let children = self.child_ids(parent);
        for child in children {
            self.release_children(child);
            self.release(child);
        }
        if let Some(node) = self.get_mut(parent) {
            node.head = None;
            node.tail = None;
        }
    }

    /// Forward walk over `next` and backward walk over `prev` must visit the
    /// same nodes.
    fn links_consistent(&self, parent: NodeId) -> bool {
        let Some(node) = self.get(parent) else {
            return true;
        };
        let forward = self.child_ids(parent);
        let mut backward = Vec::new();
        let mut cursor = node.tail;
        while let Some(id) = cursor {
            backward.push(id);
            cursor = self.get(id).and_then(|n| n.prev);
        }
        backward.reverse();
        forward == backward
    }
}

// =============================================================================
// TESTS
// =============================================================================
