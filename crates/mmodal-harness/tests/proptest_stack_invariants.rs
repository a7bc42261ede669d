#![forbid(unsafe_code)]

//! Property tests: registry/stack invariants under arbitrary interleavings of
//! programmatic calls and host events.
//!
//! Dialog 0 is plain, dialog 1 waits for its open animation, dialog 2 locks
//! scrolling and waits for its close animation.

use mmodal::dom::{Dom, DomEvent, EventKind, EventTarget, Key, KeyEvent, Modifiers, NodeId};
use mmodal::{ConfigPatch, DialogId, Listener, ModalRegistry};
use mmodal_harness::{MemoryDom, el};
use proptest::prelude::*;

type Registry = ModalRegistry<MemoryDom<Listener>>;

const IDS: [&str; 3] = ["d0", "d1", "d2"];

#[derive(Debug, Clone)]
enum Op {
    Show(usize),
    Close(usize),
    CloseTop,
    CloseAll,
    ClickTrigger(usize),
    ClickBackdrop(usize),
    ClickContent(usize),
    Escape,
    Tab { shift: bool },
    AnimationEnd(usize),
    Blur,
    Unregister(usize),
    Register(usize),
}

fn op() -> impl Strategy<Value = Op> {
    let dialog = 0..IDS.len();
    prop_oneof![
        4 => dialog.clone().prop_map(Op::Show),
        2 => dialog.clone().prop_map(Op::Close),
        1 => Just(Op::CloseTop),
        1 => Just(Op::CloseAll),
        3 => dialog.clone().prop_map(Op::ClickTrigger),
        2 => dialog.clone().prop_map(Op::ClickBackdrop),
        1 => dialog.clone().prop_map(Op::ClickContent),
        3 => Just(Op::Escape),
        2 => any::<bool>().prop_map(|shift| Op::Tab { shift }),
        2 => dialog.clone().prop_map(Op::AnimationEnd),
        1 => Just(Op::Blur),
        1 => dialog.clone().prop_map(Op::Unregister),
        1 => dialog.prop_map(Op::Register),
    ]
}

fn registry() -> Registry {
    let mut dom = MemoryDom::new().with_scrollbar_width(12);
    for id in IDS {
        dom.append_to_body(
            el("button")
                .id(&format!("open-{id}"))
                .attr("data-micromodal-trigger", id),
        );
        dom.append_to_body(
            el("div").id(id).attr("aria-hidden", "true").child(
                el("div")
                    .id(&format!("{id}-overlay"))
                    .flag("data-micromodal-close")
                    .child(el("div").attr("role", "dialog").children([
                        el("button")
                            .id(&format!("{id}-close"))
                            .flag("data-micromodal-close"),
                        el("input").id(&format!("{id}-input")),
                        el("button").id(&format!("{id}-ok")),
                    ])),
            ),
        );
    }
    let mut registry = ModalRegistry::new(dom);
    registry.init(None);
    for (index, id) in IDS.into_iter().enumerate() {
        if let Some(patch) = patch(index) {
            registry.configure(id, &patch);
        }
    }
    registry
}

/// Per-dialog settings, reapplied whenever a dialog is registered again.
fn patch(index: usize) -> Option<ConfigPatch> {
    match index {
        1 => Some(ConfigPatch::new().await_open_animation(true)),
        2 => Some(
            ConfigPatch::new()
                .disable_scroll(true)
                .await_close_animation(true),
        ),
        _ => None,
    }
}

fn node(registry: &Registry, id: &str) -> NodeId {
    registry
        .dom()
        .element_by_id(id)
        .expect("fixture element exists")
}

fn key_target(registry: &Registry) -> NodeId {
    registry
        .dom()
        .active_element()
        .unwrap_or_else(|| registry.dom().body())
}

fn apply(registry: &mut Registry, op: &Op) {
    match *op {
        Op::Show(i) => {
            registry.show(IDS[i], patch(i).as_ref());
        }
        Op::Close(i) => {
            registry.close(IDS[i]);
        }
        Op::CloseTop => {
            registry.close_top();
        }
        Op::CloseAll => registry.close_all(),
        Op::ClickTrigger(i) => {
            let target = node(registry, &format!("open-{}", IDS[i]));
            registry.dispatch(&DomEvent::click(target));
        }
        Op::ClickBackdrop(i) => {
            let target = node(registry, &format!("{}-overlay", IDS[i]));
            registry.dispatch(&DomEvent::click(target));
        }
        Op::ClickContent(i) => {
            let target = node(registry, &format!("{}-ok", IDS[i]));
            registry.dispatch(&DomEvent::click(target));
        }
        Op::Escape => {
            let target = key_target(registry);
            registry.dispatch(&DomEvent::keydown(target, KeyEvent::new(Key::Escape)));
        }
        Op::Tab { shift } => {
            let target = key_target(registry);
            let mut key = KeyEvent::new(Key::Tab);
            if shift {
                key = key.with_modifiers(Modifiers::SHIFT);
            }
            registry.dispatch(&DomEvent::keydown(target, key));
        }
        Op::AnimationEnd(i) => {
            let target = node(registry, IDS[i]);
            registry.dispatch(&DomEvent::animation_end(target));
        }
        Op::Blur => registry.dom_mut().blur(),
        Op::Unregister(i) => {
            registry.unregister(IDS[i]);
        }
        Op::Register(i) => {
            registry.register(IDS[i], patch(i).as_ref());
        }
    }
}

fn check_invariants(registry: &Registry) -> Result<(), TestCaseError> {
    let stack = registry.open_dialogs();

    for (i, id) in stack.iter().enumerate() {
        prop_assert!(!stack[..i].contains(id), "duplicate {id} on stack");
        prop_assert!(registry.is_registered(id), "{id} open but not registered");
    }

    for id in IDS {
        let on_stack = stack.contains(&DialogId::new(id));
        prop_assert_eq!(registry.is_open(id), on_stack, "is_open({})", id);
        let container = node(registry, id);
        if registry.is_registered(id) {
            let aria = registry.dom().attribute(container, "aria-hidden");
            let expected = if on_stack { "false" } else { "true" };
            prop_assert_eq!(aria.as_deref(), Some(expected), "aria-hidden on {}", id);
        }
        let own_keys = registry.dom().listener_count(container.into(), EventKind::Keydown);
        prop_assert_eq!(own_keys, usize::from(on_stack), "keydown listeners on {}", id);
    }

    let global = registry
        .dom()
        .listener_count(EventTarget::Document, EventKind::Keydown);
    prop_assert_eq!(global, usize::from(!stack.is_empty()));

    prop_assert_eq!(registry.top(), stack.last());
    prop_assert_eq!(registry.scroll_locked(), registry.is_open("d2"));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn invariants_hold_after_every_step(ops in proptest::collection::vec(op(), 0..48)) {
        let mut registry = registry();
        check_invariants(&registry)?;
        for op in &ops {
            apply(&mut registry, op);
            check_invariants(&registry)?;
        }
    }

    #[test]
    fn close_all_always_empties_the_stack(ops in proptest::collection::vec(op(), 0..32)) {
        let mut registry = registry();
        for op in &ops {
            apply(&mut registry, op);
        }
        registry.close_all();
        prop_assert!(registry.open_dialogs().is_empty());
        prop_assert!(!registry.scroll_locked());
        prop_assert_eq!(
            registry.dom().listener_count(EventTarget::Document, EventKind::Keydown),
            0
        );
    }

    #[test]
    fn teardown_always_leaves_a_clean_page(ops in proptest::collection::vec(op(), 0..32)) {
        let mut registry = registry();
        for op in &ops {
            apply(&mut registry, op);
        }
        let dom = registry.teardown();
        prop_assert_eq!(dom.total_listeners(), 0);
    }
}
