//! Reconciliation - turning descriptions into live artifacts.
//!
//! The reconciler walks a [`Content`](crate::content::Content) description
//! and mutates the document to match, one shadow node at a time. There is
//! no diffing: a node that re-renders erases its previous output and builds
//! the new description from scratch. Identity is positional, carried by the
//! shadow node itself, which is how a node whose output changes kind (or
//! appears after being absent) still lands at the right spot among its
//! siblings.
//!
//! # Render step
//!
//! One render step for a dynamic node runs in this order:
//!
//! ```text
//! clear: unload hooks, detach output, destroy descendants
//!   └─ invoke rendering function        (state survives the clear)
//!        └─ reconcile result
//!             ├─ empty    nothing to attach
//!             ├─ text     create a text artifact, attach
//!             └─ element  1. create the element, detached
//!                         2. set attributes, wire listeners
//!                         3. build children into the detached element
//!                         4. attach at the node's sibling position
//! ```
//!
//! Descendants build into the detached element, so the document shows one
//! mutation for the whole subtree. Unload hooks fire before any artifact is
//! detached.

use std::rc::Rc;

use tracing::trace;

use crate::content::{Content, Element, Render};
use crate::context::Context;
use crate::dom::DomNode;
use crate::error::RenderError;
use crate::mount::Rendering;
use crate::node::{NodeId, NodePool};

// =============================================================================
// DISPATCH
// =============================================================================

/// Makes the node's output match `content`.
pub(crate) fn reconcile(
    rendering: &Rc<Rendering>,
    id: NodeId,
    content: Content,
) -> Result<(), RenderError> {
    trace!(node = ?id, kind = content.kind_name(), "reconcile");
    match content {
        Content::Empty => {
            set_output(rendering, id, None);
            Ok(())
        }
        Content::Text(text) => {
            let artifact = rendering.doc.create_text(&text);
            set_output(rendering, id, Some(artifact));
            Ok(())
        }
        Content::Element(element) => reconcile_element(rendering, id, element),
        Content::Dynamic(render) => {
            {
                let mut nodes = rendering.nodes.borrow_mut();
                let Some(node) = nodes.get_mut(id) else {
                    trace!(node = ?id, "reconcile on a destroyed node skipped");
                    return Ok(());
                };
                node.render = Some(render);
            }
            run_render_step(rendering, id)
        }
    }
}

/// Clears the node, invokes its rendering function, reconciles the result.
///
/// The clear runs before the function: unload hooks for the old subtree
/// fire first, and the function sees a document its own old output is
/// already gone from. The node's state survives, it lives on the node and
/// not in the cleared output. Nodes without a rendering function (or
/// destroyed nodes) are skipped silently; the queue may legitimately hold
/// ids for either.
pub(crate) fn run_render_step(rendering: &Rc<Rendering>, id: NodeId) -> Result<(), RenderError> {
    let render = {
        let nodes = rendering.nodes.borrow();
        match nodes.get(id).and_then(|node| node.render.clone()) {
            Some(render) => render,
            None => {
                trace!(node = ?id, "render step without a rendering function skipped");
                return Ok(());
            }
        }
    };
    clear(rendering, id);

    // User code: no pool borrow may be held here.
    let ctx = Context::new(rendering, id);
    let content = render.render(&ctx)?;

    if matches!(content, Content::Dynamic(_)) {
        return Err(RenderError::NestedRenderFn { node: id });
    }
    reconcile(rendering, id, content)
}

// =============================================================================
// ELEMENTS
// =============================================================================

fn reconcile_element(
    rendering: &Rc<Rendering>,
    id: NodeId,
    element: Element,
) -> Result<(), RenderError> {
    // Erase the previous subtree before the new one is built, so the fresh
    // child list never mixes with stale links.
    clear(rendering, id);

    let doc = &rendering.doc;
    let artifact = doc.create_element(&element.name);
    for (name, value) in element.attrs.values() {
        // A name without a value is declared absent: skipped, not set.
        if let Some(value) = value {
            doc.set_attribute(artifact, name, value);
        }
    }
    for (event, group) in element.attrs.listeners() {
        for listener in group {
            doc.add_listener(artifact, event, listener.clone());
        }
    }

    // Children build into the artifact while it is still detached.
    for child_content in element.children {
        let child_id = {
            let mut nodes = rendering.nodes.borrow_mut();
            let child_id = nodes.allocate(artifact);
            nodes.append_child(id, child_id);
            child_id
        };
        reconcile(rendering, child_id, child_content)?;
    }

    set_output(rendering, id, Some(artifact));
    Ok(())
}

// =============================================================================
// OUTPUT SWAP
// =============================================================================

/// Replaces the node's output artifact and attaches the new one at the
/// node's position among its siblings.
fn set_output(rendering: &Rc<Rendering>, id: NodeId, new: Option<DomNode>) {
    let had_output = {
        let nodes = rendering.nodes.borrow();
        match nodes.get(id) {
            Some(node) => node.output.is_some(),
            None => return,
        }
    };
    if had_output {
        clear(rendering, id);
    }

    {
        let mut nodes = rendering.nodes.borrow_mut();
        let Some(node) = nodes.get_mut(id) else { return };
        node.output = new;
    }

    if let Some(artifact) = new {
        let (container, before) = {
            let nodes = rendering.nodes.borrow();
            let Some(node) = nodes.get(id) else { return };
            (node.container, next_attached_sibling(&nodes, node.next))
        };
        rendering.doc.insert(container, artifact, before);
    }
}

/// Walks `next` links for the first sibling that currently renders output.
/// Inserting before that artifact (or appending when there is none) puts
/// the node at its description position.
fn next_attached_sibling(nodes: &NodePool, mut cursor: Option<NodeId>) -> Option<DomNode> {
    while let Some(id) = cursor {
        let node = nodes.get(id)?;
        if let Some(artifact) = node.output {
            return Some(artifact);
        }
        cursor = node.next;
    }
    None
}

// =============================================================================
// TEARDOWN
// =============================================================================

/// Erases the node's output: fires unload hooks below it, detaches its
/// artifact, destroys its descendants. The node itself survives with its
/// sibling links, rendering function and state intact.
pub(crate) fn clear(rendering: &Rc<Rendering>, id: NodeId) {
    let hooks = {
        let nodes = rendering.nodes.borrow();
        let mut hooks = Vec::new();
        collect_unload_hooks(&nodes, id, &mut hooks);
        hooks
    };
    // Hooks are user code and run before anything is detached.
    for hook in &hooks {
        hook.unloading();
    }

    let artifact = {
        let mut nodes = rendering.nodes.borrow_mut();
        match nodes.get_mut(id) {
            Some(node) => node.output.take(),
            None => return,
        }
    };
    if let Some(artifact) = artifact {
        // Tolerate hosts that already detached the artifact themselves.
        if rendering.doc.container_of(artifact).is_some() {
            rendering.doc.remove(artifact);
        }
    }

    let mut nodes = rendering.nodes.borrow_mut();
    nodes.release_children(id);
}

/// Rendering functions below `id`, parents before children. The node's own
/// function is not collected: re-rendering yourself is not an unload.
fn collect_unload_hooks(nodes: &NodePool, id: NodeId, hooks: &mut Vec<Rc<dyn Render>>) {
    for child in nodes.child_ids(id) {
        if let Some(node) = nodes.get(child) {
            if let Some(render) = &node.render {
                hooks.push(render.clone());
            }
        }
        collect_unload_hooks(nodes, child, hooks);
    }
}

// =============================================================================
// TESTS
// =============================================================================
