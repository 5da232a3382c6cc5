//! Context - the handle a rendering function works through.
//!
//! Each invocation of a rendering function receives a [`Context`] bound to
//! the shadow node the function owns. Through it the function seeds and
//! reads its per-node state cell and requests its own re-render. Contexts
//! are `Clone` and `'static`, so event listeners capture them and keep
//! using them long after the render call returned.
//!
//! A context holds a weak handle to its rendering. Once the rendering (or
//! just this node) is torn down, state access reports
//! [`RenderError::Detached`] and [`Context::update`] degrades to a no-op.
//!
//! # State cell
//!
//! The cell is type-erased storage owned by the one rendering function that
//! owns the node. [`init_state`](Context::init_state) seeds it exactly once
//! and is safe to call on every render pass; reads before the first seed
//! are an error, not a default.

use std::any::Any;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::RenderError;
use crate::mount::{request_update, Rendering};
use crate::node::NodeId;

/// Per-node handle handed to rendering functions and kept by listeners.
#[derive(Clone)]
pub struct Context {
    rendering: Weak<Rendering>,
    id: NodeId,
}

impl Context {
    pub(crate) fn new(rendering: &Rc<Rendering>, id: NodeId) -> Self {
        Self {
            rendering: Rc::downgrade(rendering),
            id,
        }
    }

    /// The shadow node this context is bound to.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Whether the node behind this context still exists.
    ///
    /// Listeners that survive their node can use this to bail out early
    /// instead of pattern-matching on [`RenderError::Detached`].
    pub fn is_live(&self) -> bool {
        self.rendering
            .upgrade()
            .is_some_and(|rendering| rendering.nodes.borrow().contains(self.id))
    }

    // =========================================================================
    // STATE
    // =========================================================================

    /// Seeds the state cell with `value` if it has never been seeded.
    ///
    /// # Returns
    ///
    /// `true` on the pass that actually seeded the cell, `false` on every
    /// later pass. The distinction lets first-render work (timers,
    /// subscriptions) run exactly once.
    pub fn init_state<S: 'static>(&self, value: S) -> Result<bool, RenderError> {
        self.init_state_with(move || value)
    }

    /// Like [`init_state`](Self::init_state), but the value is built lazily:
    /// `init` runs only on the pass that seeds the cell.
    ///
    /// A factory that seeds this node's cell itself (through
    /// [`set_state`](Self::set_state)) wins: its write stays, the factory's
    /// return value is discarded, and the call reports `false`.
    pub fn init_state_with<S: 'static>(
        &self,
        init: impl FnOnce() -> S,
    ) -> Result<bool, RenderError> {
        let rendering = self.rendering()?;
        {
            let nodes = rendering.nodes.borrow();
            let node = nodes
                .get(self.id)
                .ok_or(RenderError::Detached { node: self.id })?;
            if node.state.is_some() {
                return Ok(false);
            }
        }

        // The factory is user code: run it with no borrow held.
        let value: Box<dyn Any> = Box::new(init());

        let mut nodes = rendering.nodes.borrow_mut();
        let node = nodes
            .get_mut(self.id)
            .ok_or(RenderError::Detached { node: self.id })?;
        if node.state.is_some() {
            // The factory seeded the cell itself. The earlier write stays.
            return Ok(false);
        }
        node.state = Some(value);
        Ok(true)
    }

    /// Reads the state cell by value.
    ///
    /// # Errors
    ///
    /// [`RenderError::UninitializedState`] before the first seed,
    /// [`RenderError::StateType`] when `S` is not the seeded type,
    /// [`RenderError::Detached`] when the node is gone.
    pub fn state<S: Clone + 'static>(&self) -> Result<S, RenderError> {
        self.with_state(|state: &mut S| state.clone())
    }

    /// Overwrites the state cell, seeding it if necessary.
    pub fn set_state<S: 'static>(&self, value: S) -> Result<(), RenderError> {
        let rendering = self.rendering()?;
        let boxed: Box<dyn Any> = Box::new(value);
        let mut nodes = rendering.nodes.borrow_mut();
        let node = nodes
            .get_mut(self.id)
            .ok_or(RenderError::Detached { node: self.id })?;
        node.state = Some(boxed);
        Ok(())
    }

    /// Runs `f` with mutable access to the state cell and returns its result.
    ///
    /// The cell is taken out of the node while `f` runs, so `f` may call
    /// back into this context (for example [`update`](Self::update)) without
    /// re-entrancy trouble. A nested state *read* on the same node from
    /// inside `f` therefore finds the cell empty and reports
    /// [`RenderError::UninitializedState`]; `f` already holds the state as
    /// `&mut S` and does not need the read.
    pub fn with_state<S: 'static, R>(
        &self,
        f: impl FnOnce(&mut S) -> R,
    ) -> Result<R, RenderError> {
        let rendering = self.rendering()?;
        let mut boxed = {
            let mut nodes = rendering.nodes.borrow_mut();
            let node = nodes
                .get_mut(self.id)
                .ok_or(RenderError::Detached { node: self.id })?;
            node.state
                .take()
                .ok_or(RenderError::UninitializedState { node: self.id })?
        };

        match boxed.downcast_mut::<S>() {
            Some(state) => {
                let result = f(state);
                let mut nodes = rendering.nodes.borrow_mut();
                if let Some(node) = nodes.get_mut(self.id) {
                    // An inner set_state wins over the taken cell.
                    if node.state.is_none() {
                        node.state = Some(boxed);
                    }
                }
                Ok(result)
            }
            None => {
                let mut nodes = rendering.nodes.borrow_mut();
                if let Some(node) = nodes.get_mut(self.id) {
                    node.state = Some(boxed);
                }
                Err(RenderError::StateType {
                    node: self.id,
                    requested: std::any::type_name::<S>(),
                })
            }
        }
    }

    // =========================================================================
    // UPDATES
    // =========================================================================

    /// Requests a re-render of this node.
    ///
    /// Never renders synchronously: the node joins the current update batch
    /// and its rendering function runs when the host scheduler fires the
    /// flush. Duplicate requests before the flush coalesce into one render.
    /// Requests for destroyed nodes are dropped silently, so listeners that
    /// outlive their node stay harmless.
    pub fn update(&self) {
        match self.rendering.upgrade() {
            Some(rendering) => request_update(&rendering, self.id),
            None => tracing::trace!(node = ?self.id, "update after teardown ignored"),
        }
    }

    fn rendering(&self) -> Result<Rc<Rendering>, RenderError> {
        self.rendering
            .upgrade()
            .ok_or(RenderError::Detached { node: self.id })
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Context").field(&self.id).finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
