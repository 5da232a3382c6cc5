//! Content - the declarative description a rendering function produces.
//!
//! A [`Content`] value is cheap, inert data: nothing happens until the
//! reconciler in [`reconcile`](crate::reconcile) turns it into artifacts of
//! a live [`Document`](crate::dom::Document). Four kinds cover the whole
//! vocabulary:
//!
//! - [`Content::Empty`] renders nothing (and erases whatever was there),
//! - [`Content::Text`] renders one text artifact,
//! - [`Content::Element`] renders an element with attributes, listeners and
//!   an ordered child list,
//! - [`Content::Dynamic`] defers to a rendering function that is re-invoked
//!   on demand through [`Context::update`](crate::context::Context::update).
//!
//! # Example
//!
//! ```ignore
//! let view = Element::new("div")
//!     .attr("class", "bigfont")
//!     .child(Content::dynamic(counter))
//!     .child("Hi there!");
//!
//! fn counter(ctx: &Context) -> Result<Content, RenderError> {
//!     ctx.init_state(0_i32)?;
//!     let clicks: i32 = ctx.state()?;
//!     let bump = {
//!         let ctx = ctx.clone();
//!         move || {
//!             let _ = ctx.with_state(|n: &mut i32| *n += 1);
//!             ctx.update();
//!         }
//!     };
//!     Ok(Element::new("button")
//!         .on("click", bump)
//!         .child(format!("clicked {clicks} times"))
//!         .into())
//! }
//! ```

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::context::Context;
use crate::dom::EventListener;
use crate::error::RenderError;

// =============================================================================
// RENDERING FUNCTIONS
// =============================================================================

/// A rendering function: produces a fresh description of its subtree each
/// time the engine invokes it.
///
/// Implemented for free by every `Fn(&Context) -> Result<Content, RenderError>`
/// closure or function. Implement the trait by hand when the unit also needs
/// to observe teardown through [`Render::unloading`].
pub trait Render {
    /// Produces the current description for the node this unit owns.
    ///
    /// Returning [`Content::Dynamic`] from here is an error: compose by
    /// invoking the inner function, not by returning it.
    fn render(&self, ctx: &Context) -> Result<Content, RenderError>;

    /// Teardown notification.
    ///
    /// Called when an ancestor replaces or erases the subtree this unit
    /// lives in, before the artifacts are detached. Not called when the
    /// unit re-renders itself. The default does nothing.
    fn unloading(&self) {}
}

impl<F> Render for F
where
    F: Fn(&Context) -> Result<Content, RenderError>,
{
    fn render(&self, ctx: &Context) -> Result<Content, RenderError> {
        self(ctx)
    }
}

// =============================================================================
// CONTENT
// =============================================================================

/// One renderable description. See the [module docs](self) for the taxonomy.
#[derive(Clone, Default)]
pub enum Content {
    /// Renders nothing. Siblings close ranks around it.
    #[default]
    Empty,
    /// Renders one text artifact with exactly this content.
    Text(String),
    /// Renders an element artifact with attributes and children.
    Element(Element),
    /// Defers to a rendering function invoked by the engine.
    Dynamic(Rc<dyn Render>),
}

impl Content {
    /// Wraps a rendering function or closure.
    pub fn dynamic(render: impl Render + 'static) -> Self {
        Self::Dynamic(Rc::new(render))
    }

    /// Whether this description renders nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Text(_) => "text",
            Self::Element(_) => "element",
            Self::Dynamic(_) => "dynamic",
        }
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Element(element) => element.fmt(f),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

// =============================================================================
// ELEMENTS
// =============================================================================

/// Description of one element artifact: tag name, attributes, listeners and
/// an ordered child list.
#[derive(Clone, Debug)]
pub struct Element {
    /// Tag name handed verbatim to the document.
    pub name: String,
    /// Attributes and event listeners, in declaration order.
    pub attrs: Attrs,
    /// Ordered child descriptions.
    pub children: Vec<Content>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Attrs::default(),
            children: Vec::new(),
        }
    }

    /// Sets a named attribute. Later writes to the same name win.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.values.insert(name.into(), Some(value.into()));
        self
    }

    /// Sets a named attribute from an optional value. A `None` records the
    /// name with no value; the reconciler skips it instead of setting it,
    /// which also withdraws any earlier value given for the name.
    pub fn attr_opt(mut self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        self.attrs.values.insert(name.into(), value.map(Into::into));
        self
    }

    /// Wires an event listener. Listeners for the same event accumulate in
    /// declaration order.
    pub fn on(mut self, event: impl Into<String>, listener: impl Fn() + 'static) -> Self {
        self.attrs
            .listeners
            .entry(event.into())
            .or_default()
            .push(Rc::new(listener));
        self
    }

    /// Appends one child description.
    pub fn child(mut self, child: impl Into<Content>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Appends a run of child descriptions.
    pub fn children(mut self, children: impl IntoIterator<Item = Content>) -> Self {
        self.children.extend(children);
        self
    }
}

/// Attribute and listener sets of an [`Element`], iteration in declaration
/// order.
#[derive(Clone, Default)]
pub struct Attrs {
    values: IndexMap<String, Option<String>>,
    listeners: IndexMap<String, Vec<EventListener>>,
}

impl Attrs {
    /// Attribute entries. A `None` value means the name was declared with no
    /// value and must be skipped, not set.
    pub fn values(&self) -> impl Iterator<Item = (&str, Option<&str>)> + '_ {
        self.values.iter().map(|(name, v)| (name.as_str(), v.as_deref()))
    }

    /// Listener entries, one per event name, in declaration order.
    pub fn listeners(&self) -> impl Iterator<Item = (&str, &[EventListener])> + '_ {
        self.listeners
            .iter()
            .map(|(event, group)| (event.as_str(), group.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.listeners.is_empty()
    }
}

impl fmt::Debug for Attrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attrs")
            .field("values", &self.values)
            .field("listeners", &self.listeners.keys().collect::<Vec<_>>())
            .finish()
    }
}

// =============================================================================
// CONVERSIONS
// =============================================================================

impl From<Element> for Content {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

/// Booleans render as the words `true` and `false`, they are not a
/// visibility switch. Use `Option` (or [`Content::Empty`]) to omit output.
impl From<bool> for Content {
    fn from(value: bool) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i32> for Content {
    fn from(value: i32) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for Content {
    fn from(value: i64) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<u32> for Content {
    fn from(value: u32) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<u64> for Content {
    fn from(value: u64) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<f64> for Content {
    fn from(value: f64) -> Self {
        Self::Text(value.to_string())
    }
}

/// `None` renders nothing; `Some` converts the payload.
impl<T: Into<Content>> From<Option<T>> for Content {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(inner) => inner.into(),
            None => Self::Empty,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
