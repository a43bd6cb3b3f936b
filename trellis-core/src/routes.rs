//! Route table.
//!
//! Three pages, addressed by path. Anything unrecognized lands on the home
//! page, so resolution never fails.

use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::debug;

use crate::reactive::{Runtime, Signal};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Route {
    #[default]
    Home,
    Counter,
    Todo,
}

impl Route {
    /// Resolve a path. Leading and trailing slashes are ignored; unknown
    /// paths fall back to [`Route::Home`].
    pub fn resolve(path: &str) -> Self {
        let segment = path.trim_matches('/');
        if segment.is_empty() {
            return Route::Home;
        }
        segment.parse().unwrap_or_else(|_| {
            debug!(path, "unknown route, falling back to home");
            Route::Home
        })
    }

    /// Canonical path.
    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Counter => "/counter",
            Route::Todo => "/todo",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::Counter => "Counter",
            Route::Todo => "Todo List",
        }
    }

    pub fn all() -> impl Iterator<Item = Route> {
        Route::iter()
    }
}

/// Holds the current route as reactive state.
#[derive(Debug, Clone)]
pub struct Navigator {
    current: Signal<Route>,
}

impl Navigator {
    pub fn new(runtime: &Runtime) -> Self {
        Self {
            current: Signal::new(runtime, Route::Home),
        }
    }

    /// Tracked read of the current route.
    pub fn current(&self) -> Route {
        self.current.get()
    }

    pub fn signal(&self) -> &Signal<Route> {
        &self.current
    }

    /// Resolve `path` and make it current.
    pub fn navigate(&self, path: &str) -> Route {
        let route = Route::resolve(path);
        debug!(path, %route, "navigate");
        self.current.set(route);
        route
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Effect;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn resolves_known_paths() {
        assert_eq!(Route::resolve("/"), Route::Home);
        assert_eq!(Route::resolve(""), Route::Home);
        assert_eq!(Route::resolve("/counter"), Route::Counter);
        assert_eq!(Route::resolve("todo/"), Route::Todo);
        assert_eq!(Route::resolve("//todo//"), Route::Todo);
    }

    #[test]
    fn unknown_paths_fall_back_to_home() {
        assert_eq!(Route::resolve("/settings"), Route::Home);
        assert_eq!(Route::resolve("/todo/42"), Route::Home);
        assert_eq!(Route::resolve("/Counter"), Route::Home);
    }

    #[test]
    fn paths_round_trip() {
        for route in Route::all() {
            assert_eq!(Route::resolve(route.path()), route);
        }
        assert_eq!(Route::all().count(), 3);
    }

    #[test]
    fn navigation_notifies_observers_once_per_change() {
        let rt = Runtime::new();
        let nav = Navigator::new(&rt);
        let renders = Arc::new(AtomicUsize::new(0));

        let _effect = Effect::new(&rt, {
            let nav = nav.clone();
            let renders = renders.clone();
            move || {
                nav.current();
                renders.fetch_add(1, Ordering::SeqCst);
            }
        });

        assert_eq!(nav.navigate("/counter"), Route::Counter);
        nav.navigate("counter/");
        nav.navigate("/nowhere");

        assert_eq!(nav.signal().get_untracked(), Route::Home);
        assert_eq!(renders.load(Ordering::SeqCst), 3);
    }
}
