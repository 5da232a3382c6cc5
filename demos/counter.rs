//! Click counter rendered headlessly.
//!
//! Mounts a small view with one dynamic unit, fires its button a few times
//! through the in-memory document, and prints the document after every
//! update batch. Run with `RUST_LOG=shadetree=trace` to watch the engine
//! reconcile.

use std::rc::Rc;

use shadetree::{
    render_into, Content, Context, Element, ManualScheduler, MemoryDocument, RenderError,
};

fn counter(ctx: &Context) -> Result<Content, RenderError> {
    ctx.init_state(0_i32)?;
    let clicks: i32 = ctx.state()?;
    let bump = {
        let ctx = ctx.clone();
        move || {
            let _ = ctx.with_state(|n: &mut i32| *n += 1);
            ctx.update();
        }
    };
    Ok(Element::new("span")
        .child(Element::new("button").on("click", bump).child("Click me"))
        .child(format!("clicked {clicks} times"))
        .into())
}

fn main() -> Result<(), RenderError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let doc = Rc::new(MemoryDocument::new());
    let scheduler = Rc::new(ManualScheduler::new());
    let body = doc.create_element("body");

    let view = Element::new("div")
        .attr("class", "bigfont")
        .child(Content::dynamic(counter))
        .child("Hi there!");
    let handle = render_into(doc.clone(), scheduler.clone(), body, view)?;
    println!("mounted    {}", doc.outer_html(body));

    for round in 1..=3 {
        let div = doc.children_of(body)[0];
        let widget = doc.children_of(div)[0];
        let button = doc.children_of(widget)[0];
        doc.fire(button, "click");
        scheduler.run_pending();
        println!("click {round}    {}", doc.outer_html(body));
    }

    handle.unmount();
    println!("unmounted  {}", doc.outer_html(body));
    Ok(())
}
