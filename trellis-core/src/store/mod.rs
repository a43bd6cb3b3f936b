//! Stores
//!
//! Each store owns its signals and exposes operations that keep its
//! invariants. Stores are constructed against a [`Runtime`] handle and passed
//! to whoever needs them; there is no global instance.
//!
//! [`Runtime`]: crate::reactive::Runtime

pub mod counter;
pub mod domain;
pub mod home;
pub mod todo;

pub use counter::{CounterStore, CounterView};
pub use domain::{to_entity_map, DomainState, DomainStore, DomainView, LoadOutcome, LoadStatus};
pub use home::{ExampleCard, HomeStore, HomeView};
pub use todo::{filtered_view, Todo, TodoFilter, TodoStore, TodoView};
