//! Reactive Context
//!
//! The reactive context tracks which computation is currently running.
//! This enables automatic dependency tracking: when a signal or computed
//! value is read, the current computation records it as a dependency.
//!
//! # Implementation
//!
//! We use a thread-local stack of frames. Entering a computed or effect
//! evaluation pushes a frame; the guard pops it when the evaluation ends,
//! including when it unwinds from a panic.
//!
//! Nested frames are independent: a computed read from inside another
//! computed collects its own dependencies, and only the inner computed
//! itself is recorded in the outer frame.

use std::cell::RefCell;

use smallvec::SmallVec;

use crate::graph::NodeId;

/// Dependencies collected during one evaluation.
pub type Dependencies = SmallVec<[NodeId; 8]>;

/// What kind of evaluation a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// A computed value. Must not write to signals.
    Derived,
    /// An effect. May write to signals.
    Effect,
    /// An `untrack` scope. Reads register nothing.
    Untracked,
}

#[derive(Debug)]
struct Frame {
    owner: Option<NodeId>,
    kind: FrameKind,
    dependencies: Dependencies,
}

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// Guard that pops its frame when dropped.
#[must_use = "dropping the context ends dependency tracking immediately"]
pub struct ReactiveContext {
    owner: Option<NodeId>,
    finished: bool,
}

impl ReactiveContext {
    /// Enter a tracking frame for `owner`.
    pub fn enter(owner: NodeId, kind: FrameKind) -> Self {
        Self::push(Some(owner), kind)
    }

    /// Enter a frame in which reads are not tracked.
    pub fn enter_untracked() -> Self {
        Self::push(None, FrameKind::Untracked)
    }

    fn push(owner: Option<NodeId>, kind: FrameKind) -> Self {
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(Frame {
                owner,
                kind,
                dependencies: Dependencies::new(),
            });
        });

        Self {
            owner,
            finished: false,
        }
    }

    /// Leave the frame and return the dependencies read while it was active.
    pub fn finish(mut self) -> Dependencies {
        self.finished = true;
        self.pop()
            .map(|frame| frame.dependencies)
            .unwrap_or_default()
    }

    fn pop(&self) -> Option<Frame> {
        let popped = CONTEXT_STACK.with(|stack| stack.borrow_mut().pop());

        if let Some(frame) = &popped {
            debug_assert_eq!(
                frame.owner, self.owner,
                "ReactiveContext mismatch: expected {:?}, got {:?}",
                self.owner, frame.owner
            );
        }
        popped
    }

    /// Check if a tracking frame is active.
    pub fn is_tracking() -> bool {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|frame| frame.kind != FrameKind::Untracked)
                .unwrap_or(false)
        })
    }

    /// The node whose evaluation is currently running, if any.
    pub fn current_owner() -> Option<NodeId> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().and_then(|frame| frame.owner))
    }

    /// True while a computed value is being evaluated on this thread.
    pub fn is_computing() -> bool {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|frame| frame.kind == FrameKind::Derived)
                .unwrap_or(false)
        })
    }

    /// True if `node` has a frame anywhere on this thread's stack.
    ///
    /// A node found here while being asked to evaluate again is a cycle.
    pub fn is_evaluating(node: NodeId) -> bool {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .iter()
                .any(|frame| frame.owner == Some(node))
        })
    }

    /// Record a read of `node` in the innermost frame.
    pub fn track_dependency(node: NodeId) {
        CONTEXT_STACK.with(|stack| {
            if let Some(frame) = stack.borrow_mut().last_mut() {
                if frame.kind != FrameKind::Untracked && !frame.dependencies.contains(&node) {
                    frame.dependencies.push(node);
                }
            }
        });
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        if !self.finished {
            self.pop();
        }
    }
}

/// Run `f` without registering any of its reads as dependencies.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let _ctx = ReactiveContext::enter_untracked();
    f()
}
