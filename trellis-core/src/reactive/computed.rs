//! Computed Implementation
//!
//! A Computed is a cached derived value that re-evaluates only when its
//! dependencies change.
//!
//! # How Computed Values Work
//!
//! 1. On first read, the computed runs its function and caches the result.
//!
//! 2. When read again with no dependency changes, it returns the cache.
//!
//! 3. When a direct dependency changes, the computed is marked dirty; when
//!    a dependency further upstream changes, it is marked maybe dirty.
//!
//! 4. On next read, a maybe-dirty computed pulls its own dependencies up to
//!    date first. It only re-runs if one of them actually produced a new
//!    value.
//!
//! # Why This Matters
//!
//! - A signal changes
//! - 10 computed values depend on it
//! - Only the ones actually read will recompute
//! - A computed that recomputes to an equal value stops the chain there
//!
//! # Failure
//!
//! A panic in the computation propagates to the reader. The previous value
//! stays cached and the node is not marked clean (it keeps whichever of
//! dirty or maybe dirty it had), so the next read tries again.

use std::fmt::{self, Debug};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::graph::{DirtyState, NodeId, NodeKind};

use super::context::{FrameKind, ReactiveContext};
use super::runtime::{Reactive, Runtime};
use super::signal::{value_eq, EqualityFn};
use super::subscriber::Subscription;

struct ComputedInner<T> {
    id: NodeId,
    runtime: Runtime,
    compute: Box<dyn Fn() -> T + Send + Sync>,
    value: RwLock<Option<T>>,
    equals: EqualityFn<T>,
}

impl<T> ComputedInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn recompute(&self) {
        if ReactiveContext::is_evaluating(self.id) {
            panic!(
                "cycle detected: computed {} was read during its own evaluation",
                self.id.raw()
            );
        }

        let started_at = self.runtime.revision();
        let ctx = ReactiveContext::enter(self.id, FrameKind::Derived);
        let next = (self.compute)();
        let dependencies = ctx.finish();

        self.runtime.replace_dependencies(self.id, &dependencies);

        let changed = {
            let mut slot = self.value.write();
            let changed = match slot.as_ref() {
                Some(current) => !(self.equals)(current, &next),
                None => true,
            };
            if changed {
                *slot = Some(next);
            }
            changed
        };

        if changed {
            self.runtime.mark_output_changed(self.id);
        }
        self.runtime.mark_clean(self.id, started_at);
    }
}

impl<T> Reactive for ComputedInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn refresh(&self) {
        let started_at = self.runtime.revision();
        match self.runtime.dirty_state(self.id) {
            DirtyState::Clean if self.value.read().is_some() => {}
            DirtyState::MaybeDirty if !self.runtime.dependencies_changed(self.id) => {
                self.runtime.mark_clean(self.id, started_at);
            }
            _ => self.recompute(),
        }
    }
}

impl<T> Drop for ComputedInner<T> {
    fn drop(&mut self) {
        self.runtime.remove_node(self.id);
    }
}

/// A cached derived value.
///
/// # Example
///
/// ```rust
/// use trellis_core::reactive::{Computed, Runtime, Signal};
///
/// let rt = Runtime::new();
/// let count = Signal::new(&rt, 2);
/// let doubled = Computed::new(&rt, {
///     let count = count.clone();
///     move || count.get() * 2
/// });
///
/// assert_eq!(doubled.get(), 4);
/// count.set(5);
/// assert_eq!(doubled.get(), 10);
/// ```
pub struct Computed<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Arc<ComputedInner<T>>,
}

impl<T> Computed<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a computed value that treats `PartialEq`-equal results as
    /// unchanged.
    ///
    /// The computation is not run until the first read.
    pub fn new<F>(runtime: &Runtime, compute: F) -> Self
    where
        T: PartialEq,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::with_equality(runtime, compute, value_eq::<T>)
    }

    /// Create a computed value with a custom equality policy.
    pub fn with_equality<F>(runtime: &Runtime, compute: F, equals: EqualityFn<T>) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let inner = Arc::new(ComputedInner {
            id: runtime.add_node(NodeKind::Derived),
            runtime: runtime.clone(),
            compute: Box::new(compute),
            value: RwLock::new(None),
            equals,
        });
        let weak = Arc::downgrade(&inner);
        runtime.register_reactive(inner.id, weak);
        Self { inner }
    }

    /// The graph node backing this computed value.
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Get the current value, recomputing if necessary.
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Borrow the current value, recomputing if necessary.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        ReactiveContext::track_dependency(self.inner.id);
        self.read(f)
    }

    /// Get the current value without registering a dependency.
    pub fn get_untracked(&self) -> T {
        self.read(T::clone)
    }

    fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.refresh();
        let guard = self.inner.value.read();
        let value = guard
            .as_ref()
            .expect("a refreshed computed always holds a value");
        f(value)
    }

    /// Register a callback fired when this value is invalidated.
    ///
    /// The callback may fire even if the next evaluation turns out to
    /// produce an equal value.
    pub fn subscribe<F>(&self, notify: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.runtime.subscribe(self.inner.id, notify)
    }

    /// Current dirty state.
    pub fn state(&self) -> DirtyState {
        self.inner.runtime.dirty_state(self.inner.id)
    }

    /// Check if the computed value has ever been evaluated.
    pub fn has_value(&self) -> bool {
        self.inner.value.read().is_some()
    }
}

impl<T> Clone for Computed<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Computed<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("value", &*self.inner.value.read())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
