//! Integration Tests for the Reactive System
//!
//! These tests verify that signals, computed values, effects and the stores
//! built on them work together correctly through the public API.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use trellis_core::reactive::{untrack, Computed, Effect, Runtime, Signal};
use trellis_core::store::{TodoFilter, TodoStore};
use trellis_core::view::ViewBinder;

/// Test that a computed value tracks signal dependencies without any manual
/// invalidation.
#[test]
fn computed_tracks_signal_dependency() {
    let rt = Runtime::new();
    let signal = Signal::new(&rt, 10);

    let signal_clone = signal.clone();
    let computed = Computed::new(&rt, move || signal_clone.get() * 2);

    assert_eq!(computed.get(), 20);

    signal.set(5);
    assert_eq!(computed.get(), 10);

    signal.update(|v| v + 1);
    assert_eq!(computed.get(), 12);
}

/// Test that computed values cache between changes.
#[test]
fn computed_caches_expensive_computation() {
    let rt = Runtime::new();
    let compute_count = Arc::new(AtomicI32::new(0));
    let compute_clone = compute_count.clone();

    let computed = Computed::new(&rt, move || {
        compute_clone.fetch_add(1, Ordering::SeqCst);
        42
    });

    // Nothing runs until the first read
    assert_eq!(compute_count.load(Ordering::SeqCst), 0);

    assert_eq!(computed.get(), 42);
    assert_eq!(computed.get(), 42);
    assert_eq!(computed.get(), 42);
    assert_eq!(compute_count.load(Ordering::SeqCst), 1);
}

/// Test that computed values can depend on other computed values.
#[test]
fn computed_depends_on_computed() {
    let rt = Runtime::new();
    let base = Signal::new(&rt, 5);

    let base_clone = base.clone();
    let doubled = Computed::new(&rt, move || base_clone.get() * 2);

    let doubled_clone = doubled.clone();
    let plus_ten = Computed::new(&rt, move || doubled_clone.get() + 10);

    assert_eq!(plus_ten.get(), 20);

    base.set(10);
    assert_eq!(doubled.get(), 20);
    assert_eq!(plus_ten.get(), 30);
}

/// Test the equality cutoff: when an intermediate value recomputes to the
/// same result, nothing downstream of it re-runs.
#[test]
fn equal_intermediate_value_stops_propagation() {
    let rt = Runtime::new();
    let count = Signal::new(&rt, 1);
    let downstream_runs = Arc::new(AtomicI32::new(0));

    let count_clone = count.clone();
    let parity = Computed::new(&rt, move || count_clone.get() % 2);

    let parity_clone = parity.clone();
    let runs = downstream_runs.clone();
    let label = Computed::new(&rt, move || {
        runs.fetch_add(1, Ordering::SeqCst);
        if parity_clone.get() == 0 { "even" } else { "odd" }
    });

    assert_eq!(label.get(), "odd");
    count.set(3);
    count.set(5);
    assert_eq!(label.get(), "odd");
    assert_eq!(downstream_runs.load(Ordering::SeqCst), 1);

    count.set(6);
    assert_eq!(label.get(), "even");
    assert_eq!(downstream_runs.load(Ordering::SeqCst), 2);
}

/// Test that dependencies are rebuilt on every evaluation.
#[test]
fn dynamic_dependencies_follow_branches() {
    let rt = Runtime::new();
    let use_left = Signal::new(&rt, true);
    let left = Signal::new(&rt, 1);
    let right = Signal::new(&rt, 100);
    let runs = Arc::new(AtomicI32::new(0));

    let (flag, l, r, counter) = (use_left.clone(), left.clone(), right.clone(), runs.clone());
    let picked = Computed::new(&rt, move || {
        counter.fetch_add(1, Ordering::SeqCst);
        if flag.get() { l.get() } else { r.get() }
    });

    assert_eq!(picked.get(), 1);

    // `right` is not a dependency yet
    right.set(200);
    assert_eq!(picked.get(), 1);
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    use_left.set(false);
    assert_eq!(picked.get(), 200);

    // ...and now `left` no longer is
    left.set(2);
    assert_eq!(picked.get(), 200);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

/// Test that an effect re-runs automatically and stops once disposed.
#[test]
fn effect_tracks_signal_until_disposed() {
    let rt = Runtime::new();
    let signal = Signal::new(&rt, 0);
    let observed = Arc::new(AtomicI32::new(-1));

    let signal_clone = signal.clone();
    let observed_clone = observed.clone();
    let effect = Effect::new(&rt, move || {
        observed_clone.store(signal_clone.get(), Ordering::SeqCst);
    });

    assert_eq!(observed.load(Ordering::SeqCst), 0);

    signal.set(42);
    assert_eq!(observed.load(Ordering::SeqCst), 42);

    effect.dispose();
    signal.set(7);
    assert_eq!(observed.load(Ordering::SeqCst), 42);
}

/// Test that a batch coalesces writes into a single effect run.
#[test]
fn batch_runs_effect_once() {
    let rt = Runtime::new();
    let first = Signal::new(&rt, String::from("Ada"));
    let last = Signal::new(&rt, String::from("Lovelace"));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let (f, l, s) = (first.clone(), last.clone(), seen.clone());
    let _effect = Effect::new(&rt, move || {
        s.lock().push(format!("{} {}", f.get(), l.get()));
    });

    rt.batch(|| {
        first.set(String::from("Grace"));
        last.set(String::from("Hopper"));
    });

    assert_eq!(*seen.lock(), ["Ada Lovelace", "Grace Hopper"]);
}

/// Test that untracked reads do not create dependencies.
#[test]
fn untracked_reads_are_ignored() {
    let rt = Runtime::new();
    let tracked = Signal::new(&rt, 1);
    let ignored = Signal::new(&rt, 10);

    let (t, i) = (tracked.clone(), ignored.clone());
    let sum = Computed::new(&rt, move || t.get() + untrack(|| i.get()));

    assert_eq!(sum.get(), 11);
    ignored.set(20);
    assert_eq!(sum.get(), 11);
    tracked.set(2);
    assert_eq!(sum.get(), 22);
}

/// Test that dropping every handle removes the nodes from the graph.
#[test]
fn dropped_nodes_leave_the_graph() {
    let rt = Runtime::new();
    {
        let signal = Signal::new(&rt, 1);
        let s = signal.clone();
        let computed = Computed::new(&rt, move || s.get() + 1);
        assert_eq!(computed.get(), 2);
        assert_eq!(rt.node_count(), 2);
    }
    assert_eq!(rt.node_count(), 0);
}

/// Test the todo store end to end through a view binder.
#[test]
fn todo_store_renders_through_binder() {
    let rt = Runtime::new();
    let todos = TodoStore::new(&rt);
    let frames = Arc::new(Mutex::new(Vec::new()));

    let store = todos.clone();
    let sink = frames.clone();
    let binder = ViewBinder::bind(
        &rt,
        move || {
            let view = store.view();
            (view.total, view.active, view.completed, view.empty_message)
        },
        move |view: &(usize, usize, usize, Option<&'static str>)| sink.lock().push(*view),
    );

    let milk = todos.add("Buy milk").unwrap();
    todos.add("   ");
    todos.toggle(milk);
    todos.set_filter(TodoFilter::Active);

    assert_eq!(
        *frames.lock(),
        [
            (0, 0, 0, Some("No todos yet. Add one above!")),
            (1, 1, 0, None),
            (1, 0, 1, None),
            (1, 0, 1, Some("No active todos")),
        ]
    );
    assert_eq!(binder.render_count(), 4);
}
