//! Error taxonomy for the rendering engine.
//!
//! Every variant is a programmer-contract violation surfaced synchronously
//! from the render step that hit it. There is no retry machinery: nothing in
//! the engine fails for transient or environmental reasons.
//!
//! Two situations are deliberately *not* errors and degrade to no-ops:
//! removing an artifact that is already detached from its container, and
//! flushing a queued node that was destroyed after it was enqueued.

use thiserror::Error;

use crate::node::NodeId;

/// Error produced by reconciliation or by the state contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A rendering function read its state cell before seeding it through
    /// `init_state`/`init_state_with` or a direct `set_state` write.
    #[error("state for {node:?} was read before it was initialized")]
    UninitializedState {
        /// The node whose state cell was read.
        node: NodeId,
    },

    /// The state cell holds a different type than the access asked for.
    /// The cell is owner-checked: the one rendering function that owns the
    /// node is expected to always use the same state type.
    #[error("state for {node:?} is not a `{requested}`")]
    StateType {
        /// The node whose state cell was accessed.
        node: NodeId,
        /// The type the caller asked for.
        requested: &'static str,
    },

    /// A rendering function returned another rendering function. Composition
    /// is done by invoking the inner function directly, not by returning it.
    #[error("rendering function for {node:?} returned another rendering function")]
    NestedRenderFn {
        /// The node whose rendering function misbehaved.
        node: NodeId,
    },

    /// A [`Context`](crate::context::Context) was used after its node (or the
    /// whole rendering) was destroyed. Event listeners can outlive the node
    /// they were built for; `update()` tolerates that silently, state access
    /// reports it.
    #[error("context for {node:?} outlived its node")]
    Detached {
        /// The node the stale context referred to.
        node: NodeId,
    },
}

impl RenderError {
    /// The node the error is about.
    pub fn node(&self) -> NodeId {
        match self {
            Self::UninitializedState { node }
            | Self::StateType { node, .. }
            | Self::NestedRenderFn { node }
            | Self::Detached { node } => *node,
        }
    }
}
