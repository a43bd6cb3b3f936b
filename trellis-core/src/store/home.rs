//! Home page view model.

use crate::reactive::{Runtime, Signal};
use crate::routes::Route;

/// A link to one of the example pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleCard {
    pub title: &'static str,
    pub description: &'static str,
    pub route: Route,
}

impl ExampleCard {
    pub fn href(&self) -> &'static str {
        self.route.path()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeView {
    pub heading: &'static str,
    pub cards: Vec<ExampleCard>,
    pub badges: Vec<String>,
}

/// Static content plus the version badges, which are signals so a host
/// can fill them in at runtime.
#[derive(Debug, Clone)]
pub struct HomeStore {
    runtime_version: Signal<String>,
    language_version: Signal<String>,
}

impl HomeStore {
    pub fn new(runtime: &Runtime) -> Self {
        Self {
            runtime_version: Signal::new(runtime, env!("CARGO_PKG_VERSION").to_owned()),
            language_version: Signal::new(runtime, String::from("2021")),
        }
    }

    pub fn set_runtime_version(&self, version: impl Into<String>) {
        self.runtime_version.set(version.into());
    }

    pub fn set_language_version(&self, version: impl Into<String>) {
        self.language_version.set(version.into());
    }

    pub fn cards() -> Vec<ExampleCard> {
        vec![
            ExampleCard {
                title: "Counter (Signals)",
                description: "Basic signal-based state management with computed values",
                route: Route::Counter,
            },
            ExampleCard {
                title: "Todo List (State)",
                description: "Complex state management with CRUD operations",
                route: Route::Todo,
            },
        ]
    }

    pub fn view(&self) -> HomeView {
        HomeView {
            heading: "Welcome to the Trellis state management demo",
            cards: Self::cards(),
            badges: vec![
                format!("Trellis {}", self.runtime_version.get()),
                format!("Rust {}", self.language_version.get()),
                String::from("Signals"),
            ],
        }
    }
}
