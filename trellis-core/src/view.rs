//! View Binding
//!
//! Connects reactive state to an external renderer. A binder owns a
//! computed view model and an effect that hands the model to the renderer
//! whenever it changes. The core never knows what rendering means.

use std::fmt;

use parking_lot::Mutex;
use tracing::debug;

use crate::reactive::{Computed, Effect, Runtime};

/// Something that can display a view model.
pub trait Renderer<V>: Send + 'static {
    fn render(&mut self, view: &V);
}

impl<V, F> Renderer<V> for F
where
    F: FnMut(&V) + Send + 'static,
{
    fn render(&mut self, view: &V) {
        self(view)
    }
}

/// Keeps a renderer in sync with a view model derived from signals.
///
/// The view function is evaluated with dependency tracking; the renderer
/// only runs when the resulting model differs from the last one rendered.
/// Dropping the binder stops rendering.
pub struct ViewBinder<V>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    model: Computed<V>,
    effect: Effect,
}

impl<V> ViewBinder<V>
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    /// Bind `view` to `renderer`. Renders once immediately.
    pub fn bind<F, R>(runtime: &Runtime, view: F, renderer: R) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        R: Renderer<V>,
    {
        let model = Computed::new(runtime, view);
        let renderer = Mutex::new(renderer);

        let effect = Effect::new(runtime, {
            let model = model.clone();
            move || {
                model.with(|view| renderer.lock().render(view));
            }
        });
        debug!(effect = effect.id().raw(), "view bound");

        Self { model, effect }
    }

    /// The current view model.
    pub fn current(&self) -> V {
        self.model.get_untracked()
    }

    /// Number of times the renderer has been called.
    pub fn render_count(&self) -> usize {
        self.effect.run_count()
    }

    /// Stop rendering.
    pub fn unbind(self) {
        self.effect.dispose();
    }
}

impl<V> fmt::Debug for ViewBinder<V>
where
    V: Clone + PartialEq + Send + Sync + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewBinder")
            .field("model", &self.model)
            .field("effect", &self.effect)
            .finish()
    }
}
