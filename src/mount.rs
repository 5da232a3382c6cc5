//! Mounting - wiring a description to a live document.
//!
//! [`render_into`] renders a description into a container artifact and
//! returns a [`RenderHandle`] that owns the resulting rendering: the shadow
//! node pool, the update queue, and the document and scheduler capabilities.
//! Everything else in the engine reaches this shared core through the
//! crate-private `Rendering` struct.
//!
//! # Update loop
//!
//! ```text
//! ctx.update() ──▶ mark node pending, enqueue
//!                      │ (first request of the batch)
//!                      ▼
//!              scheduler.schedule_once(flush)
//!                      │ (host decides when)
//!                      ▼
//!                 flush: drain batch ──▶ render step per node
//! ```
//!
//! The queue is drained and disarmed before any render step runs, so
//! updates requested *during* a flush form the next batch and never run in
//! the current one.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, error, trace};

use crate::content::Content;
use crate::dom::{Document, DomNode};
use crate::error::RenderError;
use crate::node::{NodeId, NodePool};
use crate::reconcile::{clear, reconcile, run_render_step};
use crate::schedule::{Scheduler, UpdateQueue};

// =============================================================================
// SHARED CORE
// =============================================================================

/// One mounted rendering. Shared by the handle, every [`Context`]
/// (weakly), and the flush callbacks handed to the scheduler (weakly).
///
/// [`Context`]: crate::context::Context
pub(crate) struct Rendering {
    pub(crate) doc: Rc<dyn Document>,
    pub(crate) scheduler: Rc<dyn Scheduler>,
    pub(crate) nodes: RefCell<NodePool>,
    pub(crate) queue: UpdateQueue,
    root: Cell<Option<NodeId>>,
}

/// Queues a re-render for `id` and arms a flush when the batch was empty.
/// Requests for destroyed or already queued nodes are dropped.
pub(crate) fn request_update(rendering: &Rc<Rendering>, id: NodeId) {
    {
        let mut nodes = rendering.nodes.borrow_mut();
        let Some(node) = nodes.get_mut(id) else {
            trace!(node = ?id, "update for a destroyed node dropped");
            return;
        };
        if node.update_pending {
            trace!(node = ?id, "update already queued");
            return;
        }
        node.update_pending = true;
    }

    if rendering.queue.enqueue(id) {
        trace!(node = ?id, "arming flush");
        let weak = Rc::downgrade(rendering);
        rendering.scheduler.schedule_once(Box::new(move || {
            if let Some(rendering) = weak.upgrade() {
                // Failures are logged inside flush.
                let _ = flush(&rendering);
            }
        }));
    }
}

/// Drains the current batch and runs one render step per queued node, in
/// request order.
///
/// A failed step does not stop the batch: the remaining nodes still
/// render, each failure is logged, and the first error is returned.
pub(crate) fn flush(rendering: &Rc<Rendering>) -> Result<(), RenderError> {
    let batch = rendering.queue.drain();
    if batch.is_empty() {
        return Ok(());
    }
    debug!(requests = batch.len(), "flushing update batch");

    let mut first_error = None;
    for id in batch {
        {
            let mut nodes = rendering.nodes.borrow_mut();
            let Some(node) = nodes.get_mut(id) else {
                trace!(node = ?id, "queued node destroyed before flush, skipped");
                continue;
            };
            node.update_pending = false;
        }
        if let Err(err) = run_render_step(rendering, id) {
            error!(node = ?err.node(), %err, "render step failed");
            if first_error.is_none() {
                first_error = Some(err);
            }
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

// =============================================================================
// MOUNTING
// =============================================================================

/// Renders `content` into `container` and returns the handle that owns the
/// mounted rendering.
///
/// The initial render runs synchronously; re-renders requested afterwards
/// go through `scheduler`.
///
/// # Errors
///
/// Any [`RenderError`] raised by a rendering function during the initial
/// render. The rendering is abandoned in that case; artifacts already
/// attached to `container` stay behind.
pub fn render_into(
    doc: Rc<dyn Document>,
    scheduler: Rc<dyn Scheduler>,
    container: DomNode,
    content: impl Into<Content>,
) -> Result<RenderHandle, RenderError> {
    let rendering = Rc::new(Rendering {
        doc,
        scheduler,
        nodes: RefCell::new(NodePool::new()),
        queue: UpdateQueue::new(),
        root: Cell::new(None),
    });
    let root = rendering.nodes.borrow_mut().allocate(container);
    rendering.root.set(Some(root));
    debug!(root = ?root, "mounting");
    reconcile(&rendering, root, content.into())?;
    Ok(RenderHandle { rendering })
}

/// Owner of one mounted rendering.
///
/// Dropping the handle without calling [`unmount`](RenderHandle::unmount)
/// leaves the artifacts in the document but detaches every live
/// [`Context`](crate::context::Context), so no further updates can land.
pub struct RenderHandle {
    rendering: Rc<Rendering>,
}

impl RenderHandle {
    /// Runs queued re-renders now instead of waiting for the scheduler.
    ///
    /// Harmless when nothing is queued, which also makes the scheduler's
    /// own later flush of the same batch a no-op.
    pub fn flush(&self) -> Result<(), RenderError> {
        flush(&self.rendering)
    }

    /// Live shadow nodes in this rendering. Mostly useful to assert that
    /// re-renders and teardown do not leak nodes.
    pub fn live_nodes(&self) -> usize {
        self.rendering.nodes.borrow().live()
    }

    /// Tears the rendering down: fires unload hooks, detaches the root
    /// output from the container, destroys every shadow node.
    pub fn unmount(self) {
        let Some(root) = self.rendering.root.take() else {
            return;
        };
        debug!(root = ?root, "unmounting");
        let root_hook = {
            let nodes = self.rendering.nodes.borrow();
            nodes.get(root).and_then(|node| node.render.clone())
        };
        // The root's own function unloads too: teardown of the whole tree
        // is not a re-render.
        if let Some(hook) = root_hook {
            hook.unloading();
        }
        clear(&self.rendering, root);
        self.rendering.nodes.borrow_mut().release(root);
    }
}

impl std::fmt::Debug for RenderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderHandle")
            .field("live_nodes", &self.live_nodes())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
