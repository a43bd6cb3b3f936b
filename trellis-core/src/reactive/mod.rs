//! Reactive Primitives
//!
//! This module implements the core reactive system: signals, computed
//! values and effects. Every store in this crate is built from them.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! within a tracking context (such as a computed value or effect), the read
//! is recorded as a dependency. When the value changes, dependents are
//! invalidated.
//!
//! ## Computed
//!
//! A Computed is a derived value that caches its result. It re-evaluates
//! lazily: only when read, and only if one of its dependencies changed.
//! Computed functions must be pure and must not write to signals.
//!
//! ## Effects
//!
//! An Effect is a side-effecting computation that re-runs whenever its
//! dependencies change. Effects connect reactive state to the outside
//! world, such as a renderer.
//!
//! # Implementation Notes
//!
//! The reactive system uses a thread-local tracking context to detect
//! dependencies automatically. The dependency graph itself lives in an
//! explicit [`Runtime`] that is passed to every constructor.

mod computed;
mod context;
mod effect;
mod runtime;
mod signal;
mod subscriber;

pub use computed::Computed;
pub use context::{untrack, FrameKind, ReactiveContext};
pub use effect::Effect;
pub use runtime::{Reactive, Runtime};
pub use signal::{EqualityFn, Signal};
pub use subscriber::{Subscriber, SubscriberId, Subscription};
