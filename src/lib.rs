//! # shadetree
//!
//! Incremental shadow-tree rendering for live documents.
//!
//! Shadetree keeps a live document in sync with a declarative description.
//! Descriptions are plain [`Content`] values: text, elements with attributes,
//! listeners and children, or dynamic units whose rendering function is
//! re-invoked on demand. The engine mirrors every rendered description with a
//! shadow node that remembers its artifact, its position among its siblings,
//! and the per-node state its rendering function seeded.
//!
//! There is no diffing. A node that re-renders erases its previous output and
//! rebuilds it, and the shadow node's sibling links put the fresh artifact
//! back at the right place, even when the output changes kind or appears
//! after having been absent. Re-renders are requested per node through
//! [`Context::update`], coalesced into batches, and run when the host
//! scheduler fires.
//!
//! ## Architecture
//!
//! ```text
//! Content ──▶ reconcile ──▶ Document (opaque artifacts)
//!                │
//!          shadow node pool (sibling links, state cells)
//!                ▲
//! Context ── update queue ──▶ Scheduler (deferred flush)
//! ```
//!
//! The document and the scheduler are capabilities the host provides:
//! implement [`Document`] and [`Scheduler`] over whatever is actually on
//! screen, or use [`MemoryDocument`] and [`ManualScheduler`] for tests and
//! headless runs.
//!
//! ## Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use shadetree::{render_into, Content, Context, Element, ManualScheduler, MemoryDocument};
//!
//! let doc = Rc::new(MemoryDocument::new());
//! let scheduler = Rc::new(ManualScheduler::new());
//! let body = doc.create_element("body");
//!
//! let handle = render_into(
//!     doc.clone(),
//!     scheduler.clone(),
//!     body,
//!     Element::new("div").child(Content::dynamic(|ctx: &Context| {
//!         ctx.init_state(0_i32)?;
//!         let clicks: i32 = ctx.state()?;
//!         let bump = {
//!             let ctx = ctx.clone();
//!             move || {
//!                 let _ = ctx.with_state(|n: &mut i32| *n += 1);
//!                 ctx.update();
//!             }
//!         };
//!         Ok(Element::new("button")
//!             .on("click", bump)
//!             .child(format!("clicked {clicks} times"))
//!             .into())
//!     })),
//! )?;
//!
//! let div = doc.children_of(body)[0];
//! let button = doc.children_of(div)[0];
//! doc.fire(button, "click");
//! scheduler.run_pending(); // the button re-renders here
//! ```
//!
//! ## Threading
//!
//! Single threaded by design, like the documents it targets. Handles,
//! contexts and listeners are `Rc`-based and stay on the thread that mounted
//! the rendering.
//!
//! ## Modules
//!
//! - [`content`] - Descriptions: [`Content`], [`Element`], the [`Render`] trait
//! - [`context`] - Per-node handle: state cell access, update requests
//! - [`dom`] - The [`Document`] capability and opaque [`DomNode`] handles
//! - [`mount`] - [`render_into`], [`RenderHandle`], the flush loop
//! - [`memory`] - In-memory document and manual scheduler for tests/demos

pub mod content;
pub mod context;
pub mod dom;
pub mod error;
pub mod memory;
pub mod mount;
pub mod node;
pub mod schedule;

mod reconcile;

// Re-export the whole working surface at the crate root.
pub use content::{Attrs, Content, Element, Render};
pub use context::Context;
pub use dom::{Document, DomNode, EventListener};
pub use error::RenderError;
pub use memory::{ManualScheduler, MemoryDocument};
pub use mount::{render_into, RenderHandle};
pub use node::NodeId;
pub use schedule::Scheduler;
