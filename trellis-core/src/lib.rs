//! Trellis Core
//!
//! A small reactive state library and the sample stores built on it:
//!
//! - `reactive`: signals, computed values, effects and batching
//! - `graph`: the dependency graph behind propagation
//! - `store`: counter, todo list, home page and a domain store template
//! - `access`: data access over HTTP with normalized errors
//! - `routes`: the page table and a reactive navigator
//! - `view`: binding view models to renderers
//!
//! # Example
//!
//! ```rust
//! use trellis_core::reactive::{Computed, Runtime, Signal};
//!
//! let rt = Runtime::new();
//! let count = Signal::new(&rt, 2);
//! let doubled = Computed::new(&rt, {
//!     let count = count.clone();
//!     move || count.get() * 2
//! });
//!
//! assert_eq!(doubled.get(), 4);
//! count.set(5);
//! assert_eq!(doubled.get(), 10);
//! ```

pub mod access;
pub mod config;
pub mod graph;
pub mod reactive;
pub mod routes;
pub mod store;
pub mod view;

pub use config::{ClientConfig, ConfigError};
pub use reactive::{untrack, Computed, Effect, Runtime, Signal, Subscription};
pub use routes::{Navigator, Route};
pub use view::{Renderer, ViewBinder};
