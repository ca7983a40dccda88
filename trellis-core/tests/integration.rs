//! Integration Tests for the Render Pipeline
//!
//! These tests drive observed data, watchers, the scheduler and the
//! reconciler together through the public API.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::json;
use tokio::sync::oneshot;
use tokio::task::LocalSet;

use trellis_core::config::{self, RuntimeConfig, TickMode};
use trellis_core::mount::View;
use trellis_core::reactive::{
    defer_until_flush, observe, scheduler, untracked, Computed, ReactiveArray, ReactiveObject,
    Watcher,
};
use trellis_core::vdom::{make_element, make_text, MemId, MemorySurface, Node, Props};

fn object(value: serde_json::Value) -> ReactiveObject {
    observe(value).as_object().cloned().unwrap()
}

fn mount_target() -> (Rc<RefCell<MemorySurface>>, MemId) {
    let mut surface = MemorySurface::new();
    let root = surface.root();
    let target = surface.append_element(root, "div");
    (Rc::new(RefCell::new(surface)), target)
}

fn todo_list(todos: &ReactiveArray) -> Node<MemId> {
    let items = todos
        .to_vec()
        .into_iter()
        .map(|todo| {
            let todo = todo.as_object().cloned().unwrap();
            let id = todo.get("id").and_then(|v| v.as_i64()).unwrap_or_default();
            let title = todo
                .get("title")
                .and_then(|v| v.as_str().map(str::to_owned))
                .unwrap_or_default();
            make_element("li", Props::new().key(id), vec![make_text(title)])
        })
        .collect();
    make_element("ul", Props::new(), items)
}

/// Test that two mutations in one tick cause exactly one re-render.
#[test]
fn mutations_are_batched_into_one_rerender() {
    let state = object(json!({ "a": 1, "b": 2 }));
    let renders = Rc::new(Cell::new(0));

    let source = state.clone();
    let seen = renders.clone();
    let _render = Watcher::new(move || {
        source.get("a");
        source.get("b");
        seen.set(seen.get() + 1);
    });

    state.set("a", 10);
    state.set("b", 20);
    assert_eq!(renders.get(), 1);

    assert_eq!(scheduler::run_until_idle(), Ok(1));
    assert_eq!(renders.get(), 2);
}

/// Test that a keyed list re-renders after `push` and reuses existing rows.
#[test]
fn pushing_to_a_list_appends_one_row() {
    let (surface, target) = mount_target();
    let state = object(json!({
        "todos": [
            { "id": 1, "title": "write" },
            { "id": 2, "title": "test" },
        ]
    }));

    let source = state.clone();
    let view = View::mount(Rc::clone(&surface), target, move || {
        let todos = source.get("todos").and_then(|v| v.as_array().cloned()).unwrap();
        todo_list(&todos)
    });
    let list = view.root().unwrap();
    let rows_before = surface.borrow().children(list);
    surface.borrow_mut().reset_stats();

    let todos = state.get("todos").and_then(|v| v.as_array().cloned()).unwrap();
    todos.push(json!({ "id": 3, "title": "ship" }));
    scheduler::tick();

    let surface = surface.borrow();
    let rows_after = surface.children(list);
    assert_eq!(rows_after.len(), 3);
    assert_eq!(&rows_after[..2], &rows_before[..]);
    assert_eq!(surface.text_content(list), "writetestship");
    // One <li> plus its text.
    assert_eq!(surface.stats().created, 2);
}

/// Test that editing a nested object re-renders only through the property it
/// reads.
#[test]
fn nested_edit_patches_text_in_place() {
    let (surface, target) = mount_target();
    let state = object(json!({ "todos": [ { "id": 1, "title": "draft" } ] }));

    let source = state.clone();
    let view = View::mount(Rc::clone(&surface), target, move || {
        let todos = source.get("todos").and_then(|v| v.as_array().cloned()).unwrap();
        todo_list(&todos)
    });
    surface.borrow_mut().reset_stats();

    let first = state
        .get("todos")
        .and_then(|v| v.as_array().and_then(|a| a.get(0)))
        .and_then(|v| v.as_object().cloned())
        .unwrap();
    first.set("title", "final");
    scheduler::tick();

    let list = view.root().unwrap();
    assert_eq!(surface.borrow().text_content(list), "final");
    assert_eq!(surface.borrow().stats().created, 0);
    assert_eq!(view.render_count(), 2);
}

/// Test that reordering observed data moves rows instead of recreating them.
#[test]
fn reversing_the_data_reverses_the_rows() {
    let (surface, target) = mount_target();
    let state = object(json!({
        "todos": [
            { "id": 1, "title": "a" },
            { "id": 2, "title": "b" },
            { "id": 3, "title": "c" },
        ]
    }));

    let source = state.clone();
    let view = View::mount(Rc::clone(&surface), target, move || {
        let todos = source.get("todos").and_then(|v| v.as_array().cloned()).unwrap();
        todo_list(&todos)
    });
    surface.borrow_mut().reset_stats();

    state.get("todos").and_then(|v| v.as_array().cloned()).unwrap().reverse();
    scheduler::tick();

    let list = view.root().unwrap();
    let surface = surface.borrow();
    assert_eq!(surface.text_content(list), "cba");
    assert_eq!(surface.stats().created, 0);
    assert_eq!(surface.stats().removed, 0);
}

/// Test that a render reading a computed value re-renders when the computed
/// value's inputs change, and the computed getter runs once per change.
#[test]
fn computed_values_feed_renders() {
    let state = object(json!({ "items": [1, 2, 3] }));
    let evaluations = Rc::new(Cell::new(0));

    let source = state.clone();
    let count = evaluations.clone();
    let total = Computed::new(move || {
        count.set(count.get() + 1);
        source
            .get("items")
            .and_then(|v| v.as_array().cloned())
            .map(|items| items.to_vec().iter().filter_map(|v| v.as_i64()).sum::<i64>())
            .unwrap_or(0)
    });

    let seen = Rc::new(Cell::new(0));
    let out = seen.clone();
    let sum = total.clone();
    let _render = Watcher::new(move || out.set(sum.get()));
    assert_eq!(seen.get(), 6);

    let items = state.get("items").and_then(|v| v.as_array().cloned()).unwrap();
    items.push(4);
    items.push(5);
    scheduler::tick();

    assert_eq!(seen.get(), 15);
    assert_eq!(evaluations.get(), 2);
}

/// Test that reads inside `untracked` do not subscribe the render.
#[test]
fn untracked_reads_are_not_dependencies() {
    let state = object(json!({ "tracked": 1, "ignored": 1 }));

    let source = state.clone();
    let render = Watcher::new(move || {
        source.get("tracked");
        untracked(|| source.get("ignored"));
    });

    state.set("ignored", 2);
    assert!(scheduler::is_idle());
    state.set("tracked", 2);
    scheduler::tick();
    assert_eq!(render.run_count(), 2);
}

/// Test that `defer_until_flush` callbacks run after the re-render they
/// follow, in registration order.
#[test]
fn deferred_callbacks_observe_the_patched_surface() {
    let (surface, target) = mount_target();
    let state = object(json!({ "label": "old" }));

    let source = state.clone();
    let view = View::mount(Rc::clone(&surface), target, move || {
        let label = source.get("label").and_then(|v| v.as_str().map(str::to_owned));
        make_element("span", Props::new(), vec![make_text(label.unwrap_or_default())])
    });

    state.set("label", "new");
    let seen = Rc::new(RefCell::new(Vec::new()));
    for n in 0..2 {
        let seen = seen.clone();
        let surface = surface.clone();
        let root = view.root().unwrap();
        defer_until_flush(move || {
            seen.borrow_mut().push(format!("{n}:{}", surface.borrow().text_content(root)));
        });
    }

    scheduler::tick();
    assert_eq!(*seen.borrow(), vec!["0:new".to_owned(), "1:new".to_owned()]);
}

/// Test that with the tokio tick driver a flush runs on the local set
/// without any manual tick.
#[tokio::test]
async fn tokio_driver_flushes_automatically() {
    config::configure(RuntimeConfig::default().with_tick(TickMode::Tokio));

    let local = LocalSet::new();
    local
        .run_until(async {
            let state = object(json!({ "count": 0 }));
            let renders = Rc::new(Cell::new(0));

            let source = state.clone();
            let seen = renders.clone();
            let _render = Watcher::new(move || {
                source.get("count");
                seen.set(seen.get() + 1);
            });

            state.set("count", 1);
            state.set("count", 2);

            let (tx, rx) = oneshot::channel();
            defer_until_flush(move || {
                let _ = tx.send(());
            });
            rx.await.unwrap();

            assert_eq!(renders.get(), 2);
            assert!(scheduler::is_idle());
        })
        .await;
}
