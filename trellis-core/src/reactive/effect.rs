//! Effect Implementation
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately to establish
//!    initial dependencies.
//!
//! 2. When a write invalidates the effect, the runtime refreshes it right
//!    away (or at the end of the enclosing batch).
//!
//! 3. A refresh of a maybe-dirty effect first checks whether any direct
//!    dependency really changed; if not, the function does not run.
//!
//! # Differences from Computed
//!
//! - Computed values return a value; effects do not.
//! - Computed values are lazy (compute on read); effects are eager.
//! - Effects may write to signals; computed values must not.
//!
//! An effect that writes one of its own dependencies is not re-entered. It
//! stays dirty and runs again on the next write that reaches it.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::graph::{DirtyState, NodeId, NodeKind};

use super::context::{FrameKind, ReactiveContext};
use super::runtime::{Reactive, Runtime};

struct EffectInner {
    id: NodeId,
    runtime: Runtime,
    run: Box<dyn Fn() + Send + Sync>,
    disposed: AtomicBool,
    run_count: AtomicUsize,
}

impl EffectInner {
    fn execute(&self) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }

        let started_at = self.runtime.revision();
        let ctx = ReactiveContext::enter(self.id, FrameKind::Effect);
        (self.run)();
        let dependencies = ctx.finish();

        self.runtime.replace_dependencies(self.id, &dependencies);
        self.runtime.mark_clean(self.id, started_at);
        self.run_count.fetch_add(1, Ordering::SeqCst);
    }
}

impl Reactive for EffectInner {
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn refresh(&self) {
        if self.disposed.load(Ordering::SeqCst) || ReactiveContext::is_evaluating(self.id) {
            return;
        }
        let started_at = self.runtime.revision();
        match self.runtime.dirty_state(self.id) {
            DirtyState::Clean => {}
            DirtyState::MaybeDirty if !self.runtime.dependencies_changed(self.id) => {
                self.runtime.mark_clean(self.id, started_at);
            }
            _ => self.execute(),
        }
    }
}

impl Drop for EffectInner {
    fn drop(&mut self) {
        self.runtime.remove_node(self.id);
    }
}

/// A side-effecting computation that runs when dependencies change.
///
/// Dropping the last handle disposes the effect.
///
/// # Example
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use trellis_core::reactive::{Effect, Runtime, Signal};
///
/// let rt = Runtime::new();
/// let count = Signal::new(&rt, 0);
/// let seen = Arc::new(Mutex::new(Vec::new()));
///
/// let _effect = Effect::new(&rt, {
///     let (count, seen) = (count.clone(), seen.clone());
///     move || seen.lock().unwrap().push(count.get())
/// });
///
/// count.set(5);
/// assert_eq!(*seen.lock().unwrap(), vec![0, 5]);
/// ```
pub struct Effect {
    inner: Arc<EffectInner>,
}

impl Effect {
    /// Create a new effect. The function runs immediately.
    pub fn new<F>(runtime: &Runtime, run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let effect = Self::new_lazy(runtime, run);
        effect.inner.execute();
        effect
    }

    /// Create a new effect without running it.
    ///
    /// It has no dependencies until `execute` is called.
    pub fn new_lazy<F>(runtime: &Runtime, run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let inner = Arc::new(EffectInner {
            id: runtime.add_node(NodeKind::Effect),
            runtime: runtime.clone(),
            run: Box::new(run),
            disposed: AtomicBool::new(false),
            run_count: AtomicUsize::new(0),
        });
        let weak = Arc::downgrade(&inner);
        runtime.register_reactive(inner.id, weak);
        Self { inner }
    }

    /// The graph node backing this effect.
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Run the effect now, regardless of its dirty state.
    pub fn execute(&self) {
        self.inner.execute();
    }

    /// Run the effect if a dependency changed since its last run.
    pub fn schedule(&self) {
        self.inner.refresh();
    }

    /// Dispose of the effect. It will not run again.
    pub fn dispose(&self) {
        if !self.inner.disposed.swap(true, Ordering::SeqCst) {
            self.inner.runtime.remove_node(self.inner.id);
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Number of times the effect has run.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.id)
            .field("run_count", &self.run_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
