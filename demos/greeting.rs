//! Content appearing and disappearing between fixed siblings.
//!
//! The status badge starts absent, appears when the host seeds it, and
//! vanishes again, always landing between the two static texts. Uses
//! `RenderHandle::flush` instead of a scheduler pump to run batches.

use std::cell::RefCell;
use std::rc::Rc;

use shadetree::{
    render_into, Content, Context, Element, ManualScheduler, MemoryDocument, RenderError,
};

fn main() -> Result<(), RenderError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let doc = Rc::new(MemoryDocument::new());
    let scheduler = Rc::new(ManualScheduler::new());
    let body = doc.create_element("body");

    let captured: Rc<RefCell<Option<Context>>> = Rc::new(RefCell::new(None));
    let slot = captured.clone();
    let badge = Content::dynamic(move |ctx: &Context| {
        *slot.borrow_mut() = Some(ctx.clone());
        ctx.init_state(None::<String>)?;
        let status: Option<String> = ctx.state()?;
        Ok(status
            .map(|text| Element::new("b").attr("class", "status").child(text))
            .into())
    });

    let view = Element::new("p")
        .child("Hello, ")
        .child(badge)
        .child("world!");
    let handle = render_into(doc.clone(), scheduler, body, view)?;
    println!("mounted      {}", doc.outer_html(body));

    let ctx = captured.borrow().clone().expect("initial render captures the context");

    ctx.set_state(Some("shiny ".to_owned()))?;
    ctx.update();
    handle.flush()?;
    println!("appeared     {}", doc.outer_html(body));

    ctx.set_state(None::<String>)?;
    ctx.update();
    handle.flush()?;
    println!("disappeared  {}", doc.outer_html(body));

    handle.unmount();
    println!("unmounted    {}", doc.outer_html(body));
    Ok(())
}
