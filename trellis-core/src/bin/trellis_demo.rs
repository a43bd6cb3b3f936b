//! Scripted walk through the sample stores.
//!
//! ```text
//! trellis-demo [config.toml] [scope-id]
//! ```
//!
//! Renders each page as text whenever its view model changes, then loads a
//! domain scope over HTTP and prints the resulting state. Set `RUST_LOG` to
//! see the store and graph logs.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;
use trellis_core::access::{DomainDataAccess, HttpTransport};
use trellis_core::config::{ClientConfig, ConfigError};
use trellis_core::reactive::Runtime;
use trellis_core::routes::{Navigator, Route};
use trellis_core::store::{
    CounterStore, CounterView, DomainStore, HomeStore, HomeView, TodoFilter, TodoStore, TodoView,
};
use trellis_core::view::ViewBinder;

fn render_home(view: &HomeView) {
    println!("== {}", view.heading);
    for card in &view.cards {
        println!("   [{}] {} -> {}", card.title, card.description, card.href());
    }
    println!("   {}", view.badges.join(" | "));
}

fn render_counter(view: &CounterView) {
    println!(
        "   count={} doubled={} even={} positive={}",
        view.count, view.doubled, view.is_even, view.is_positive
    );
}

fn render_todos(view: &TodoView) {
    println!(
        "   [{}] total={} active={} completed={}",
        view.filter, view.total, view.active, view.completed
    );
    match view.empty_message {
        Some(message) => println!("     {message}"),
        None => {
            for todo in &view.visible {
                let mark = if todo.completed { 'x' } else { ' ' };
                println!("     [{mark}] #{} {}", todo.id, todo.text);
            }
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), ConfigError> {
    init_tracing();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    let scope = args.next().unwrap_or_else(|| String::from("default"));
    info!(base_url = %config.base_url, timeout_ms = config.timeout_ms, "config loaded");

    let rt = Runtime::new();
    let nav = Navigator::new(&rt);

    let home = HomeStore::new(&rt);
    let _home_view = ViewBinder::bind(
        &rt,
        {
            let home = home.clone();
            move || home.view()
        },
        render_home,
    );

    for path in ["/counter", "/todo", "/missing"] {
        let route = nav.navigate(path);
        println!("-> {path} resolves to {} ({})", route.path(), route.title());
    }

    nav.navigate(Route::Counter.path());
    println!("== {}", nav.current().title());
    let counter = CounterStore::new(&rt);
    let counter_view = ViewBinder::bind(
        &rt,
        {
            let counter = counter.clone();
            move || counter.view()
        },
        render_counter,
    );
    counter.increment();
    counter.increment();
    counter.decrement();
    counter.reset();
    counter_view.unbind();

    nav.navigate(Route::Todo.path());
    println!("== {}", nav.current().title());
    let todos = TodoStore::new(&rt);
    let todo_view = ViewBinder::bind(
        &rt,
        {
            let todos = todos.clone();
            move || todos.view()
        },
        render_todos,
    );
    rt.batch(|| {
        todos.add("Buy milk");
        todos.add("Walk the dog");
        todos.add("   ");
    });
    todos.set_draft("Write docs");
    todos.add_draft();
    todos.toggle(1);
    todos.set_filter(TodoFilter::Active);
    todos.set_filter(TodoFilter::Completed);
    todos.clear_completed();
    info!(renders = todo_view.render_count(), "todo script finished");

    let access = DomainDataAccess::new(HttpTransport::new(&config)?);
    let domain = DomainStore::new(&rt, Arc::new(access));
    println!("== domain scope {scope:?}");
    let outcome = domain.load(&scope).await;
    let view = domain.view();
    println!(
        "   outcome={outcome:?} status={} error={:?} entities={}",
        view.status,
        view.error,
        view.entities.len()
    );
    for entity in &view.entities {
        println!("     {} {}", entity.id, entity.name);
    }

    Ok(())
}
