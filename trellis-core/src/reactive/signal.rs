//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! is the source node for everything derived from it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read within a reactive context (computed/effect),
//!    the read is recorded as a dependency of that context.
//!
//! 2. When a signal is written, the new value is compared with the old one
//!    using the signal's equality policy. An equal write is dropped.
//!
//! 3. A committed write invalidates dependents through the runtime.
//!
//! # Thread Safety
//!
//! Signals are `Send + Sync`. The value is protected by a `RwLock`; the
//! lock is never held while dependents are notified.

use std::fmt::{self, Debug};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, trace};

use crate::graph::{NodeId, NodeKind};

use super::context::ReactiveContext;
use super::runtime::Runtime;
use super::subscriber::Subscription;

/// Decides whether two values are the same for change-notification purposes.
pub type EqualityFn<T> = fn(&T, &T) -> bool;

pub(crate) fn value_eq<T: PartialEq>(a: &T, b: &T) -> bool {
    a == b
}

pub(crate) fn never_eq<T>(_: &T, _: &T) -> bool {
    false
}

struct SignalInner<T> {
    id: NodeId,
    runtime: Runtime,
    value: RwLock<T>,
    equals: EqualityFn<T>,
}

impl<T> Drop for SignalInner<T> {
    fn drop(&mut self) {
        self.runtime.remove_node(self.id);
    }
}

/// A reactive signal holding a value of type T.
///
/// # Example
///
/// ```rust
/// use trellis_core::reactive::{Runtime, Signal};
///
/// let rt = Runtime::new();
/// let count = Signal::new(&rt, 0);
///
/// count.set(5);
/// count.update(|n| n + 1);
/// assert_eq!(count.get(), 6);
/// ```
pub struct Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Arc<SignalInner<T>>,
}

impl<T> Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a signal that notifies only when the value changes
    /// under `PartialEq`.
    pub fn new(runtime: &Runtime, value: T) -> Self
    where
        T: PartialEq,
    {
        Self::with_equality(runtime, value, value_eq::<T>)
    }

    /// Create a signal with a custom equality policy.
    pub fn with_equality(runtime: &Runtime, value: T, equals: EqualityFn<T>) -> Self {
        Self {
            inner: Arc::new(SignalInner {
                id: runtime.add_node(NodeKind::Source),
                runtime: runtime.clone(),
                value: RwLock::new(value),
                equals,
            }),
        }
    }

    /// Create a signal for which every write counts as a change.
    pub fn always_notify(runtime: &Runtime, value: T) -> Self {
        Self::with_equality(runtime, value, never_eq::<T>)
    }

    /// The graph node backing this signal.
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Get the current value, registering a dependency if called from
    /// inside a computed value or effect.
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Borrow the current value, registering a dependency.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        ReactiveContext::track_dependency(self.inner.id);
        f(&self.inner.value.read())
    }

    /// Get the current value without tracking dependencies.
    pub fn get_untracked(&self) -> T {
        self.inner.value.read().clone()
    }

    /// Replace the value.
    ///
    /// Dependents are notified only if the new value differs from the old
    /// one under this signal's equality policy.
    pub fn set(&self, value: T) {
        if ReactiveContext::is_computing() {
            error!(
                signal = self.inner.id.raw(),
                "signal written from inside a computed evaluation"
            );
            debug_assert!(false, "computed values must not write to signals");
        }

        {
            let mut guard = self.inner.value.write();
            if (self.inner.equals)(&guard, &value) {
                trace!(signal = self.inner.id.raw(), "write dropped: value unchanged");
                return;
            }
            *guard = value;
        }

        self.inner.runtime.notify_write(self.inner.id);
    }

    /// Replace the value with `f` applied to the current one.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = f(&self.inner.value.read());
        self.set(next);
    }

    /// Register a callback fired after every committed write.
    pub fn subscribe<F>(&self, notify: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.runtime.subscribe(self.inner.id, notify)
    }

    /// Number of registered invalidation callbacks.
    pub fn subscriber_count(&self) -> usize {
        self.inner.runtime.subscriber_count(self.inner.id)
    }
}

impl<T> Clone for Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn signal_get_and_set() {
        let rt = Runtime::new();
        let signal = Signal::new(&rt, 0);
        assert_eq!(signal.get(), 0);

        signal.set(42);
        assert_eq!(signal.get(), 42);
    }

    #[test]
    fn signal_update() {
        let rt = Runtime::new();
        let signal = Signal::new(&rt, 10);
        signal.update(|v| v + 5);
        assert_eq!(signal.get(), 15);
    }

    #[test]
    fn signal_notifies_subscribers_on_change_only() {
        let rt = Runtime::new();
        let signal = Signal::new(&rt, 0);
        let call_count = Arc::new(AtomicI32::new(0));
        let call_count_clone = call_count.clone();

        let _subscription = signal.subscribe(move || {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        signal.set(1);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);

        // Same value, no notification
        signal.set(1);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);

        signal.set(2);
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn always_notify_signal_reports_equal_writes() {
        let rt = Runtime::new();
        let signal = Signal::always_notify(&rt, "same");
        let call_count = Arc::new(AtomicI32::new(0));
        let call_count_clone = call_count.clone();

        let _subscription = signal.subscribe(move || {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        signal.set("same");
        signal.set("same");
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn custom_equality_policy() {
        let rt = Runtime::new();
        // Case-insensitive text
        let signal = Signal::with_equality(&rt, String::from("Milk"), |a, b| {
            a.eq_ignore_ascii_case(b)
        });
        let call_count = Arc::new(AtomicI32::new(0));
        let call_count_clone = call_count.clone();
        let _subscription = signal.subscribe(move || {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        signal.set(String::from("MILK"));
        assert_eq!(signal.get(), "Milk");
        assert_eq!(call_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let rt = Runtime::new();
        let signal = Signal::new(&rt, 0);
        let call_count = Arc::new(AtomicI32::new(0));
        let call_count_clone = call_count.clone();

        let subscription = signal.subscribe(move || {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(signal.subscriber_count(), 1);

        subscription.unsubscribe();
        signal.set(2);
        assert_eq!(call_count.load(Ordering::SeqCst), 0);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn signal_clone_shares_state() {
        let rt = Runtime::new();
        let signal1 = Signal::new(&rt, 0);
        let signal2 = signal1.clone();

        signal1.set(42);
        assert_eq!(signal2.get(), 42);
        assert_eq!(signal1.id(), signal2.id());
    }

    #[test]
    fn dropping_last_handle_removes_node() {
        let rt = Runtime::new();
        let signal = Signal::new(&rt, 0);
        assert_eq!(rt.node_count(), 1);

        drop(signal);
        assert_eq!(rt.node_count(), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "computed values must not write to signals")]
    fn set_inside_computed_is_rejected() {
        use crate::reactive::Computed;

        let rt = Runtime::new();
        let input = Signal::new(&rt, 1);
        let log = Signal::new(&rt, 0);
        let leaky = Computed::new(&rt, {
            let (input, log) = (input.clone(), log.clone());
            move || {
                let value = input.get();
                log.set(value);
                value
            }
        });

        leaky.get();
    }

    #[test]
    fn set_inside_untracked_block_of_an_effect_is_allowed() {
        use crate::reactive::{untrack, Effect};

        let rt = Runtime::new();
        let input = Signal::new(&rt, 1);
        let log = Signal::new(&rt, 0);
        let _effect = Effect::new(&rt, {
            let (input, log) = (input.clone(), log.clone());
            move || {
                let value = input.get();
                untrack(|| log.set(value));
            }
        });

        input.set(4);
        assert_eq!(log.get(), 4);
    }
}
