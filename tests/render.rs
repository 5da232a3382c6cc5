//! End-to-end scenarios against the in-memory document.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use shadetree::{
    render_into, Content, Context, Document, DomNode, Element, ManualScheduler, MemoryDocument,
    Render, RenderError,
};

fn harness() -> (Rc<MemoryDocument>, Rc<ManualScheduler>, DomNode) {
    let doc = Rc::new(MemoryDocument::new());
    let scheduler = Rc::new(ManualScheduler::new());
    let body = doc.create_element("body");
    (doc, scheduler, body)
}

/// Shared slot for smuggling a context out of a rendering function.
#[derive(Clone, Default)]
struct CtxSlot(Rc<RefCell<Option<Context>>>);

impl CtxSlot {
    fn capture(&self, ctx: &Context) {
        *self.0.borrow_mut() = Some(ctx.clone());
    }

    fn get(&self) -> Context {
        self.0.borrow().clone().unwrap()
    }
}

// =============================================================================
// STATE CONTINUITY
// =============================================================================

#[test]
fn test_counter_keeps_state_across_rerenders() {
    let (doc, scheduler, body) = harness();

    let view = Element::new("div")
        .attr("class", "bigfont")
        .child(Content::dynamic(|ctx: &Context| {
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
                .child(format!("clicks: {clicks}"))
                .into())
        }))
        .child("Hi there!");

    let _handle = render_into(doc.clone(), scheduler.clone(), body, view).unwrap();
    assert_eq!(
        doc.outer_html(body),
        "<body><div class=\"bigfont\"><span><button>Click me</button>clicks: 0</span>Hi there!</div></body>"
    );

    let div = doc.children_of(body)[0];
    let greeting = doc.children_of(div)[1];
    for round in 1..=3 {
        let span = doc.children_of(div)[0];
        let button = doc.children_of(span)[0];
        assert_eq!(doc.fire(button, "click"), 1);
        assert_eq!(scheduler.run_pending(), 1);
        let span = doc.children_of(div)[0];
        assert_eq!(
            doc.outer_html(span),
            format!("<span><button>Click me</button>clicks: {round}</span>"),
            "state must survive the rebuild of round {round}"
        );
        assert_eq!(
            doc.children_of(div)[1],
            greeting,
            "the static sibling text must never be recreated"
        );
    }
}

#[test]
fn test_init_state_is_idempotent_across_passes() {
    let (doc, scheduler, body) = harness();
    let slot = CtxSlot::default();
    let seeds = Rc::new(Cell::new(0_u32));

    let capture = slot.clone();
    let seed_count = seeds.clone();
    let view = Content::dynamic(move |ctx: &Context| {
        capture.capture(ctx);
        if ctx.init_state_with(|| "seeded".to_owned())? {
            seed_count.set(seed_count.get() + 1);
        }
        let value: String = ctx.state()?;
        Ok(Content::Text(value))
    });

    let handle = render_into(doc.clone(), scheduler.clone(), body, view).unwrap();
    for _ in 0..4 {
        slot.get().update();
        scheduler.run_pending();
    }

    assert_eq!(seeds.get(), 1, "only the first pass may seed");
    assert_eq!(doc.outer_html(body), "<body>seeded</body>");
    assert_eq!(handle.live_nodes(), 1);
}

// =============================================================================
// BATCHING
// =============================================================================

#[test]
fn test_batch_renders_each_node_once_in_request_order() {
    let (doc, scheduler, body) = harness();
    let order: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
    let slot_a = CtxSlot::default();
    let slot_b = CtxSlot::default();

    let make_unit = |label: &'static str, slot: CtxSlot, order: Rc<RefCell<Vec<&'static str>>>| {
        Content::dynamic(move |ctx: &Context| {
            slot.capture(ctx);
            order.borrow_mut().push(label);
            Ok(Content::Text(label.to_owned()))
        })
    };

    let view = Element::new("div")
        .child(make_unit("a", slot_a.clone(), order.clone()))
        .child(make_unit("b", slot_b.clone(), order.clone()));
    let _handle = render_into(doc.clone(), scheduler.clone(), body, view).unwrap();
    order.borrow_mut().clear();

    // b first, then a, with duplicates sprinkled in.
    slot_b.get().update();
    slot_a.get().update();
    slot_b.get().update();
    slot_a.get().update();

    assert_eq!(scheduler.pending(), 1, "one batch, one flush");
    scheduler.run_pending();

    assert_eq!(
        *order.borrow(),
        vec!["b", "a"],
        "each node renders once, in first-request order"
    );
}

#[test]
fn test_update_during_render_lands_in_next_batch() {
    let (doc, scheduler, body) = harness();
    let renders = Rc::new(Cell::new(0_u32));

    let counted = renders.clone();
    let view = Content::dynamic(move |ctx: &Context| {
        counted.set(counted.get() + 1);
        if counted.get() == 1 {
            // Ask for another pass while this one is still running.
            ctx.update();
        }
        Ok(Content::Text(format!("pass {}", counted.get())))
    });

    let _handle = render_into(doc.clone(), scheduler.clone(), body, view).unwrap();
    assert_eq!(renders.get(), 1);
    assert_eq!(scheduler.pending(), 1, "the inner request must defer");

    scheduler.run_pending();
    assert_eq!(renders.get(), 2, "the deferred request renders exactly once");
    assert_eq!(scheduler.pending(), 0, "no further pass was requested");
    assert_eq!(doc.outer_html(body), "<body>pass 2</body>");
}

// =============================================================================
// SIBLING ISOLATION AND POSITION
// =============================================================================

#[test]
fn test_rerender_leaves_sibling_artifacts_untouched() {
    let (doc, scheduler, body) = harness();
    let slot = CtxSlot::default();

    let capture = slot.clone();
    let view = Element::new("div")
        .child(Element::new("p").child("static"))
        .child(Content::dynamic(move |ctx: &Context| {
            capture.capture(ctx);
            ctx.init_state(0_i32)?;
            Ok(Content::Text(format!("v{}", ctx.state::<i32>()?)))
        }));
    let _handle = render_into(doc.clone(), scheduler.clone(), body, view).unwrap();

    let div = doc.children_of(body)[0];
    let static_before = doc.children_of(div)[0];
    let dynamic_before = doc.children_of(div)[1];

    let ctx = slot.get();
    ctx.set_state(1_i32).unwrap();
    ctx.update();
    scheduler.run_pending();

    let static_after = doc.children_of(div)[0];
    let dynamic_after = doc.children_of(div)[1];
    assert_eq!(
        static_before, static_after,
        "the static sibling must keep its artifact"
    );
    assert_ne!(
        dynamic_before, dynamic_after,
        "the re-rendered node must have a fresh artifact"
    );
    assert_eq!(doc.outer_html(div), "<div><p>static</p>v1</div>");
}

#[test]
fn test_absent_content_appears_at_its_sibling_position() {
    let (doc, scheduler, body) = harness();
    let slot = CtxSlot::default();

    let capture = slot.clone();
    let view = Element::new("div")
        .child("left")
        .child(Content::dynamic(move |ctx: &Context| {
            capture.capture(ctx);
            ctx.init_state(None::<String>)?;
            let label: Option<String> = ctx.state()?;
            Ok(label.map(|text| Element::new("b").child(text)).into())
        }))
        .child("right");

    let handle = render_into(doc.clone(), scheduler.clone(), body, view).unwrap();
    let div = doc.children_of(body)[0];
    assert_eq!(doc.outer_html(div), "<div>leftright</div>");
    assert_eq!(handle.live_nodes(), 4, "the empty node still occupies a slot");

    let ctx = slot.get();
    ctx.set_state(Some("mid".to_owned())).unwrap();
    ctx.update();
    scheduler.run_pending();

    assert_eq!(
        doc.outer_html(div),
        "<div>left<b>mid</b>right</div>",
        "content appearing after absence must land between its siblings"
    );

    ctx.set_state(None::<String>).unwrap();
    ctx.update();
    scheduler.run_pending();

    assert_eq!(doc.outer_html(div), "<div>leftright</div>");
    assert_eq!(handle.live_nodes(), 4, "the subtree must be fully released");
}

#[test]
fn test_output_kind_can_change_in_place() {
    let (doc, scheduler, body) = harness();
    let slot = CtxSlot::default();

    let capture = slot.clone();
    let view = Element::new("div")
        .child("[")
        .child(Content::dynamic(move |ctx: &Context| {
            capture.capture(ctx);
            ctx.init_state(0_u8)?;
            let phase: u8 = ctx.state()?;
            Ok(match phase {
                0 => Content::Empty,
                1 => Content::Text("plain".to_owned()),
                _ => Element::new("em").child("fancy").into(),
            })
        }))
        .child("]");

    let _handle = render_into(doc.clone(), scheduler.clone(), body, view).unwrap();
    let div = doc.children_of(body)[0];
    let ctx = slot.get();

    assert_eq!(doc.outer_html(div), "<div>[]</div>");

    ctx.set_state(1_u8).unwrap();
    ctx.update();
    scheduler.run_pending();
    assert_eq!(doc.outer_html(div), "<div>[plain]</div>");

    ctx.set_state(2_u8).unwrap();
    ctx.update();
    scheduler.run_pending();
    assert_eq!(doc.outer_html(div), "<div>[<em>fancy</em>]</div>");

    ctx.set_state(0_u8).unwrap();
    ctx.update();
    scheduler.run_pending();
    assert_eq!(doc.outer_html(div), "<div>[]</div>");
}

#[test]
fn test_rerender_tolerates_a_host_detached_artifact() {
    let (doc, scheduler, body) = harness();
    let slot = CtxSlot::default();

    let capture = slot.clone();
    let view = Element::new("div")
        .child("left")
        .child(Content::dynamic(move |ctx: &Context| {
            capture.capture(ctx);
            ctx.init_state(0_i32)?;
            Ok(Content::Text(format!("v{}", ctx.state::<i32>()?)))
        }))
        .child("right");
    let _handle = render_into(doc.clone(), scheduler.clone(), body, view).unwrap();

    let div = doc.children_of(body)[0];
    assert_eq!(doc.outer_html(div), "<div>leftv0right</div>");

    // The host rips the dynamic node's artifact out on its own.
    let artifact = doc.children_of(div)[1];
    doc.remove(artifact);
    assert_eq!(doc.outer_html(div), "<div>leftright</div>");

    let ctx = slot.get();
    ctx.set_state(1_i32).unwrap();
    ctx.update();
    scheduler.run_pending();

    assert_eq!(
        doc.outer_html(div),
        "<div>leftv1right</div>",
        "the rebuild must re-attach between the original siblings"
    );
    assert!(!doc.is_attached(artifact), "the ripped-out artifact stays gone");
}

// =============================================================================
// TEARDOWN
// =============================================================================

/// Render unit that logs its unload under a label.
struct Unloader {
    label: &'static str,
    body: Content,
    log: Rc<RefCell<Vec<&'static str>>>,
}

impl Render for Unloader {
    fn render(&self, _ctx: &Context) -> Result<Content, RenderError> {
        Ok(self.body.clone())
    }

    fn unloading(&self) {
        self.log.borrow_mut().push(self.label);
    }
}

#[test]
fn test_unload_hooks_fire_parent_first() {
    let (doc, scheduler, body) = harness();
    let log: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
    let slot = CtxSlot::default();

    let inner = Content::dynamic(Unloader {
        label: "inner",
        body: Content::Text("leaf".to_owned()),
        log: log.clone(),
    });
    let outer = Content::dynamic(Unloader {
        label: "outer",
        body: Element::new("section").child(inner).into(),
        log: log.clone(),
    });

    let capture = slot.clone();
    let gate = Content::dynamic(move |ctx: &Context| {
        capture.capture(ctx);
        ctx.init_state(true)?;
        let open: bool = ctx.state()?;
        // Nested units go in as children, never as the return value.
        Ok(if open {
            Element::new("slot").child(outer.clone()).into()
        } else {
            Content::Empty
        })
    });

    let view = Element::new("div").child(gate);
    let handle = render_into(doc.clone(), scheduler.clone(), body, view).unwrap();
    assert_eq!(
        doc.outer_html(body),
        "<body><div><slot><section>leaf</section></slot></div></body>"
    );
    assert!(log.borrow().is_empty(), "nothing unloads while mounted");

    let ctx = slot.get();
    ctx.set_state(false).unwrap();
    ctx.update();
    scheduler.run_pending();

    assert_eq!(doc.outer_html(body), "<body><div></div></body>");
    assert_eq!(
        *log.borrow(),
        vec!["outer", "inner"],
        "ancestors must hear about the teardown before their descendants"
    );

    log.borrow_mut().clear();
    handle.unmount();
    assert!(
        log.borrow().is_empty(),
        "already discarded units must not unload again"
    );
    assert_eq!(doc.outer_html(body), "<body></body>");
}

#[test]
fn test_queued_node_destroyed_before_flush_is_skipped() {
    let (doc, scheduler, body) = harness();
    let parent_slot = CtxSlot::default();
    let child_slot = CtxSlot::default();
    let child_renders = Rc::new(Cell::new(0_u32));

    let capture_child = child_slot.clone();
    let counted = child_renders.clone();
    let capture_parent = parent_slot.clone();
    let view = Content::dynamic(move |ctx: &Context| {
        capture_parent.capture(ctx);
        let capture_child = capture_child.clone();
        let counted = counted.clone();
        Ok(Element::new("div")
            .child(Content::dynamic(move |ctx: &Context| {
                capture_child.capture(ctx);
                counted.set(counted.get() + 1);
                Ok(Content::Text("child".to_owned()))
            }))
            .into())
    });

    let handle = render_into(doc.clone(), scheduler.clone(), body, view).unwrap();
    assert_eq!(child_renders.get(), 1);

    // Parent first: its rebuild destroys the child the queue still names.
    parent_slot.get().update();
    child_slot.get().update();
    handle.flush().unwrap();

    assert_eq!(
        child_renders.get(),
        2,
        "the child renders once for the parent rebuild, its stale request is dropped"
    );
    assert_eq!(doc.outer_html(body), "<body><div>child</div></body>");
    assert_eq!(handle.live_nodes(), 2);
}

#[test]
fn test_context_outliving_its_node_goes_inert() {
    let (doc, scheduler, body) = harness();
    let parent_slot = CtxSlot::default();
    let child_slot = CtxSlot::default();

    let capture_parent = parent_slot.clone();
    let capture_child = child_slot.clone();
    let view = Content::dynamic(move |ctx: &Context| {
        capture_parent.capture(ctx);
        let capture_child = capture_child.clone();
        Ok(Element::new("div")
            .child(Content::dynamic(move |ctx: &Context| {
                capture_child.capture(ctx);
                ctx.init_state(7_i32)?;
                Ok(Content::Text("child".to_owned()))
            }))
            .into())
    });

    let _handle = render_into(doc.clone(), scheduler.clone(), body, view).unwrap();
    let old_child = child_slot.get();
    assert!(old_child.is_live());

    // The parent rebuild destroys this child node and mints a replacement.
    parent_slot.get().update();
    scheduler.run_pending();
    assert_eq!(doc.outer_html(body), "<body><div>child</div></body>");
    assert_eq!(scheduler.pending(), 0);

    assert!(!old_child.is_live(), "the old child id must stop resolving");
    old_child.update();
    assert_eq!(
        scheduler.pending(),
        0,
        "an update through the stale context must not arm a flush"
    );
    assert_eq!(
        old_child.state::<i32>(),
        Err(RenderError::Detached { node: old_child.id() }),
        "state access through the stale context must report detachment"
    );

    let new_child = child_slot.get();
    assert!(new_child.is_live(), "the replacement child keeps working");
    assert_eq!(new_child.state::<i32>(), Ok(7));
}

// =============================================================================
// FAILURE POLICY
// =============================================================================

#[test]
fn test_failed_step_does_not_starve_the_batch() {
    let (doc, scheduler, body) = harness();
    let poison = Rc::new(Cell::new(false));
    let bad_slot = CtxSlot::default();
    let good_slot = CtxSlot::default();

    let armed = poison.clone();
    let capture_bad = bad_slot.clone();
    let bad = Content::dynamic(move |ctx: &Context| {
        capture_bad.capture(ctx);
        if armed.get() {
            // Composition error: a rendering function must not return one.
            Ok(Content::dynamic(|_ctx: &Context| Ok(Content::Empty)))
        } else {
            Ok(Content::Text("good so far".to_owned()))
        }
    });

    let capture_good = good_slot.clone();
    let good = Content::dynamic(move |ctx: &Context| {
        capture_good.capture(ctx);
        ctx.init_state(0_i32)?;
        Ok(Content::Text(format!("healthy {}", ctx.state::<i32>()?)))
    });

    let view = Element::new("div").child(bad).child(good);
    let handle = render_into(doc.clone(), scheduler.clone(), body, view).unwrap();

    poison.set(true);
    bad_slot.get().update();
    let ctx = good_slot.get();
    ctx.set_state(1_i32).unwrap();
    ctx.update();

    let err = handle.flush().unwrap_err();
    assert!(matches!(err, RenderError::NestedRenderFn { .. }), "got {err:?}");
    assert_eq!(
        doc.outer_html(body),
        "<body><div>healthy 1</div></body>",
        "the failing node is cleared before its function runs, the healthy sibling still renders"
    );

    // The failed node is left without output but stays re-renderable.
    poison.set(false);
    bad_slot.get().update();
    handle.flush().unwrap();
    assert_eq!(doc.outer_html(body), "<body><div>good so farhealthy 1</div></body>");
}
