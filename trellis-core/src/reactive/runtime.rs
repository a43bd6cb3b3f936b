//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects signals, computed
//! values and effects. It owns the dependency graph and dispatches work
//! when signals change.
//!
//! # How It Works
//!
//! 1. Every signal, computed value and effect registers a node with the
//!    runtime it was created in.
//!
//! 2. When a computed value or effect finishes an evaluation, the runtime
//!    replaces its dependency edges with the reads it just made.
//!
//! 3. When a signal's value changes, the runtime:
//!    a. Marks dependents dirty / maybe dirty
//!    b. Fires invalidation subscribers of the newly invalid nodes
//!    c. Refreshes invalidated effects in topological order
//!    d. Leaves computed values alone: they recompute on next read
//!
//! # Ownership
//!
//! A `Runtime` is a cheap handle. There is no process-wide instance: each
//! application (or test) creates one and passes it to whatever builds
//! signals. Nodes hold a strong handle to their runtime; the runtime only
//! holds weak references back, so dropping the last handle to a node
//! removes it from the graph.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::trace;

use crate::graph::{DependencyGraph, DirtyState, Node, NodeId, NodeKind};

use super::computed::Computed;
use super::effect::Effect;
use super::signal::Signal;
use super::subscriber::{Subscriber, SubscriberId, Subscription};

/// A node the runtime can bring up to date by ID.
///
/// Implemented by computed values and effects. For a computed value,
/// `refresh` recomputes if needed; for an effect it re-runs if needed.
pub trait Reactive: Send + Sync {
    /// The graph node backing this value.
    fn node_id(&self) -> NodeId;

    /// Bring this node up to date.
    fn refresh(&self);
}

/// Work deferred by an open batch.
#[derive(Default)]
struct BatchState {
    depth: usize,
    subscribers: IndexMap<SubscriberId, Subscriber>,
    effects: IndexMap<NodeId, Weak<dyn Reactive>>,
}

#[derive(Default)]
pub(crate) struct RuntimeInner {
    graph: Mutex<DependencyGraph>,
    reactives: Mutex<HashMap<NodeId, Weak<dyn Reactive>>>,
    subscribers: Mutex<HashMap<NodeId, Vec<Subscriber>>>,
    batch: Mutex<BatchState>,
}

impl RuntimeInner {
    pub(crate) fn remove_subscriber(&self, node: NodeId, id: SubscriberId) {
        let mut subscribers = self.subscribers.lock();
        if let Some(list) = subscribers.get_mut(&node) {
            list.retain(|s| s.id() != id);
            if list.is_empty() {
                subscribers.remove(&node);
            }
        }
    }
}

/// Handle to a reactive runtime.
///
/// Cloning the handle shares the runtime.
#[derive(Clone, Default)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

impl Runtime {
    /// Create an empty runtime.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a signal in this runtime.
    pub fn signal<T>(&self, value: T) -> Signal<T>
    where
        T: Clone + PartialEq + Send + Sync + 'static,
    {
        Signal::new(self, value)
    }

    /// Create a computed value in this runtime.
    pub fn computed<T, F>(&self, compute: F) -> Computed<T>
    where
        T: Clone + PartialEq + Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Computed::new(self, compute)
    }

    /// Create an effect in this runtime. It runs once immediately.
    pub fn effect<F>(&self, run: F) -> Effect
    where
        F: Fn() + Send + Sync + 'static,
    {
        Effect::new(self, run)
    }

    /// Run `f` with effects and invalidation callbacks deferred.
    ///
    /// Deferred work runs once, when the outermost batch returns. An effect
    /// invalidated by several writes inside the batch runs a single time.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        self.inner.batch.lock().depth += 1;
        let _guard = BatchGuard { runtime: self };
        f()
    }

    /// Number of live nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.inner.graph.lock().node_count()
    }

    // ------------------------------------------------------------------
    // Node bookkeeping, used by Signal / Computed / Effect
    // ------------------------------------------------------------------

    pub(crate) fn add_node(&self, kind: NodeKind) -> NodeId {
        self.inner.graph.lock().add_node(Node::new(kind))
    }

    pub(crate) fn register_reactive(&self, node: NodeId, reactive: Weak<dyn Reactive>) {
        self.inner.reactives.lock().insert(node, reactive);
    }

    pub(crate) fn remove_node(&self, node: NodeId) {
        self.inner.graph.lock().remove_node(node);
        self.inner.reactives.lock().remove(&node);
        self.inner.subscribers.lock().remove(&node);
        self.inner.batch.lock().effects.shift_remove(&node);
    }

    pub(crate) fn dirty_state(&self, node: NodeId) -> DirtyState {
        self.inner.graph.lock().dirty_state(node)
    }

    pub(crate) fn revision(&self) -> u64 {
        self.inner.graph.lock().revision()
    }

    pub(crate) fn mark_clean(&self, node: NodeId, as_of: u64) {
        self.inner.graph.lock().mark_clean(node, as_of);
    }

    pub(crate) fn mark_output_changed(&self, node: NodeId) {
        self.inner.graph.lock().mark_output_changed(node);
    }

    pub(crate) fn replace_dependencies(&self, node: NodeId, dependencies: &[NodeId]) {
        self.inner
            .graph
            .lock()
            .replace_dependencies(node, dependencies);
    }

    /// Decide whether a maybe-dirty node has to run again.
    ///
    /// Brings each dependency up to date, in the order it was read, and
    /// stops at the first one whose value changed after `node` was last
    /// verified.
    pub(crate) fn dependencies_changed(&self, node: NodeId) -> bool {
        let (dependencies, verified_at) = {
            let graph = self.inner.graph.lock();
            (graph.dependencies_of(node), graph.verified_at(node))
        };

        for dependency in dependencies {
            self.refresh_node(dependency);
            if self.inner.graph.lock().changed_at(dependency) > verified_at {
                return true;
            }
        }
        false
    }

    /// Refresh a computed node by ID. Signals have nothing to refresh.
    pub(crate) fn refresh_node(&self, node: NodeId) {
        let reactive = self.inner.reactives.lock().get(&node).and_then(Weak::upgrade);
        if let Some(reactive) = reactive {
            reactive.refresh();
        }
    }

    /// Register an invalidation callback on `node`.
    pub(crate) fn subscribe<F>(&self, node: NodeId, notify: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let subscriber = Subscriber::new(notify);
        let id = subscriber.id();
        self.inner
            .subscribers
            .lock()
            .entry(node)
            .or_default()
            .push(subscriber);
        Subscription::new(Arc::downgrade(&self.inner), node, id)
    }

    pub(crate) fn subscriber_count(&self, node: NodeId) -> usize {
        self.inner
            .subscribers
            .lock()
            .get(&node)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Propagate a committed write to `source`.
    ///
    /// This is the core update propagation mechanism.
    pub(crate) fn notify_write(&self, source: NodeId) {
        let invalidated = self.inner.graph.lock().record_write(source);

        let subscribers: Vec<Subscriber> = {
            let map = self.inner.subscribers.lock();
            std::iter::once(source)
                .chain(invalidated.iter().copied())
                .filter_map(|id| map.get(&id))
                .flatten()
                .cloned()
                .collect()
        };

        let effects: Vec<(NodeId, Weak<dyn Reactive>)> = {
            let graph = self.inner.graph.lock();
            let reactives = self.inner.reactives.lock();
            invalidated
                .iter()
                .filter(|id| graph.is_effect(**id))
                .filter_map(|id| reactives.get(id).map(|weak| (*id, weak.clone())))
                .collect()
        };

        trace!(
            source = source.raw(),
            subscribers = subscribers.len(),
            effects = effects.len(),
            "dispatching write"
        );

        {
            let mut batch = self.inner.batch.lock();
            if batch.depth > 0 {
                for subscriber in subscribers {
                    batch.subscribers.insert(subscriber.id(), subscriber);
                }
                for (id, effect) in effects {
                    batch.effects.insert(id, effect);
                }
                return;
            }
        }

        run_pending(subscribers, effects.into_iter().map(|(_, effect)| effect));
    }
}

fn run_pending(
    subscribers: impl IntoIterator<Item = Subscriber>,
    effects: impl IntoIterator<Item = Weak<dyn Reactive>>,
) {
    for subscriber in subscribers {
        subscriber.notify();
    }
    for effect in effects {
        if let Some(effect) = effect.upgrade() {
            effect.refresh();
        }
    }
}

/// Closes a batch, flushing deferred work when the outermost one ends.
struct BatchGuard<'a> {
    runtime: &'a Runtime,
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        let (subscribers, effects) = {
            let mut batch = self.runtime.inner.batch.lock();
            batch.depth -= 1;
            if batch.depth > 0 {
                return;
            }
            (
                std::mem::take(&mut batch.subscribers),
                std::mem::take(&mut batch.effects),
            )
        };

        // A panicking batch drops its deferred work. Skipped effects stay
        // dirty and run on the next write that reaches them.
        if std::thread::panicking() {
            return;
        }

        run_pending(subscribers.into_values(), effects.into_values());
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("node_count", &self.node_count())
            .field("revision", &self.revision())
            .finish()
    }
}
