//! Counter store.

use crate::reactive::{Computed, Runtime, Signal};

/// A single integer and a few values derived from it.
#[derive(Debug, Clone)]
pub struct CounterStore {
    count: Signal<i64>,
    doubled: Computed<i64>,
    is_even: Computed<bool>,
    is_positive: Computed<bool>,
}

/// Snapshot for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterView {
    pub count: i64,
    pub doubled: i64,
    pub is_even: bool,
    pub is_positive: bool,
}

impl CounterStore {
    pub fn new(runtime: &Runtime) -> Self {
        let count = Signal::new(runtime, 0_i64);

        let doubled = Computed::new(runtime, {
            let count = count.clone();
            move || count.get() * 2
        });
        let is_even = Computed::new(runtime, {
            let count = count.clone();
            move || count.get() % 2 == 0
        });
        let is_positive = Computed::new(runtime, {
            let count = count.clone();
            move || count.get() > 0
        });

        Self {
            count,
            doubled,
            is_even,
            is_positive,
        }
    }

    pub fn count(&self) -> i64 {
        self.count.get()
    }

    pub fn doubled(&self) -> i64 {
        self.doubled.get()
    }

    pub fn is_even(&self) -> bool {
        self.is_even.get()
    }

    pub fn is_positive(&self) -> bool {
        self.is_positive.get()
    }

    pub fn increment(&self) {
        self.count.update(|count| count.saturating_add(1));
    }

    pub fn decrement(&self) {
        self.count.update(|count| count.saturating_sub(1));
    }

    pub fn reset(&self) {
        self.count.set(0);
    }

    /// Tracked snapshot of every value.
    pub fn view(&self) -> CounterView {
        CounterView {
            count: self.count(),
            doubled: self.doubled(),
            is_even: self.is_even(),
            is_positive: self.is_positive(),
        }
    }
}
