//! Update scheduling - deferred, coalesced re-render batches.
//!
//! Re-render requests never run synchronously. They land in an
//! `UpdateQueue` and a single flush callback is handed to the host's
//! [`Scheduler`] the moment the queue goes from empty to non-empty. However
//! many requests arrive before the host runs that callback, they are all
//! served by one flush pass.
//!
//! # Pattern
//!
//! The queue itself is dumb on purpose: it records ids and whether a flush
//! callback is already armed. Per-node deduplication lives on the shadow
//! node (`update_pending`), and the flush pass that drains the queue lives
//! in [`mount`](crate::mount), next to the rest of the engine loop.

use std::cell::{Cell, RefCell};

use crate::node::NodeId;

// =============================================================================
// SCHEDULER CAPABILITY
// =============================================================================

/// Deferred execution capability provided by the host.
///
/// The engine hands over one callback per update batch. The host must run it
/// exactly once, after the current synchronous work has finished; a browser
/// bridge maps this onto an animation-frame request, a test harness onto a
/// manual pump like [`ManualScheduler`](crate::memory::ManualScheduler).
pub trait Scheduler {
    /// Queues `callback` to run once, later.
    fn schedule_once(&self, callback: Box<dyn FnOnce()>);
}

// =============================================================================
// UPDATE QUEUE
// =============================================================================

/// Pending re-render requests for one rendering, in arrival order.
pub(crate) struct UpdateQueue {
    pending: RefCell<Vec<NodeId>>,
    armed: Cell<bool>,
}

impl UpdateQueue {
    pub(crate) fn new() -> Self {
        Self {
            pending: RefCell::new(Vec::new()),
            armed: Cell::new(false),
        }
    }

    /// Appends a node id to the batch.
    ///
    /// # Returns
    ///
    /// `true` when this request is the first since the last drain, meaning
    /// the caller must arm a flush callback with the host scheduler. The id
    /// is recorded either way; the caller is responsible for per-node
    /// deduplication before enqueueing.
    pub(crate) fn enqueue(&self, id: NodeId) -> bool {
        self.pending.borrow_mut().push(id);
        !self.armed.replace(true)
    }

    /// Takes the whole batch and disarms the queue.
    ///
    /// Requests made while the drained batch is being processed start a
    /// fresh batch and arm a fresh flush callback.
    pub(crate) fn drain(&self) -> Vec<NodeId> {
        self.armed.set(false);
        std::mem::take(&mut *self.pending.borrow_mut())
    }

    /// Number of requests waiting in the current batch.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.pending.borrow().len()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodePool;
    use crate::dom::DomNode;

    fn some_ids(n: usize) -> Vec<NodeId> {
        let mut pool = NodePool::new();
        (0..n).map(|_| pool.allocate(DomNode(0))).collect()
    }

    #[test]
    fn test_first_enqueue_arms_flush() {
        let ids = some_ids(3);
        let queue = UpdateQueue::new();

        assert!(queue.enqueue(ids[0]), "first enqueue should arm the flush");
        assert!(!queue.enqueue(ids[1]), "second enqueue should not re-arm");
        assert!(!queue.enqueue(ids[2]), "third enqueue should not re-arm");
        assert_eq!(queue.len(), 3, "all ids should be recorded");
    }

    #[test]
    fn test_drain_returns_arrival_order() {
        let ids = some_ids(3);
        let queue = UpdateQueue::new();
        queue.enqueue(ids[2]);
        queue.enqueue(ids[0]);
        queue.enqueue(ids[1]);

        let batch = queue.drain();
        assert_eq!(batch, vec![ids[2], ids[0], ids[1]]);
        assert_eq!(queue.len(), 0, "drain should empty the queue");
    }

    #[test]
    fn test_enqueue_after_drain_arms_again() {
        let ids = some_ids(2);
        let queue = UpdateQueue::new();
        queue.enqueue(ids[0]);
        let _ = queue.drain();

        assert!(
            queue.enqueue(ids[1]),
            "first enqueue after a drain should arm a fresh flush"
        );
    }

    #[test]
    fn test_drain_when_empty_is_harmless() {
        let queue = UpdateQueue::new();
        assert!(queue.drain().is_empty());
        let ids = some_ids(1);
        assert!(queue.enqueue(ids[0]), "arming still works after empty drain");
    }
}
