//! Todo list store.
//!
//! The list is only ever replaced wholesale: every operation builds a new
//! `Vec` from the old one and writes it back, so readers never observe a
//! half-applied change. Counts are derived, never stored.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use tracing::debug;

use crate::reactive::{Computed, Runtime, Signal};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: u64,
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TodoFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TodoFilter {
    pub fn matches(self, todo: &Todo) -> bool {
        match self {
            TodoFilter::All => true,
            TodoFilter::Active => !todo.completed,
            TodoFilter::Completed => todo.completed,
        }
    }

    /// What to show when nothing passes the filter.
    pub fn empty_message(self) -> &'static str {
        match self {
            TodoFilter::All => "No todos yet. Add one above!",
            TodoFilter::Active => "No active todos",
            TodoFilter::Completed => "No completed todos",
        }
    }
}

/// Todos passing `filter`, in insertion order.
pub fn filtered_view(todos: &[Todo], filter: TodoFilter) -> Vec<Todo> {
    todos
        .iter()
        .filter(|todo| filter.matches(todo))
        .cloned()
        .collect()
}

/// Snapshot for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoView {
    pub draft: String,
    pub can_add: bool,
    pub filter: TodoFilter,
    pub visible: Vec<Todo>,
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub has_completed: bool,
    pub empty_message: Option<&'static str>,
}

#[derive(Debug, Clone)]
pub struct TodoStore {
    todos: Signal<Vec<Todo>>,
    draft: Signal<String>,
    filter: Signal<TodoFilter>,
    next_id: Arc<AtomicU64>,

    total: Computed<usize>,
    active: Computed<usize>,
    completed: Computed<usize>,
    filtered: Computed<Vec<Todo>>,
    can_add: Computed<bool>,
}

impl TodoStore {
    pub fn new(runtime: &Runtime) -> Self {
        let todos = Signal::new(runtime, Vec::<Todo>::new());
        let draft = Signal::new(runtime, String::new());
        let filter = Signal::new(runtime, TodoFilter::All);

        let total = Computed::new(runtime, {
            let todos = todos.clone();
            move || todos.with(Vec::len)
        });
        let active = Computed::new(runtime, {
            let todos = todos.clone();
            move || todos.with(|todos| todos.iter().filter(|t| !t.completed).count())
        });
        let completed = Computed::new(runtime, {
            let todos = todos.clone();
            move || todos.with(|todos| todos.iter().filter(|t| t.completed).count())
        });
        let filtered = Computed::new(runtime, {
            let todos = todos.clone();
            let filter = filter.clone();
            move || {
                let filter = filter.get();
                todos.with(|todos| filtered_view(todos, filter))
            }
        });
        let can_add = Computed::new(runtime, {
            let draft = draft.clone();
            move || draft.with(|draft| !draft.trim().is_empty())
        });

        Self {
            todos,
            draft,
            filter,
            next_id: Arc::new(AtomicU64::new(1)),
            total,
            active,
            completed,
            filtered,
            can_add,
        }
    }

    /// Append a todo. Blank text is ignored. Returns the new id.
    pub fn add(&self, text: &str) -> Option<u64> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let todo = Todo {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            text: text.to_owned(),
            completed: false,
            created_at: Utc::now(),
        };
        let id = todo.id;
        debug!(id, "todo added");

        self.todos.update(|todos| {
            let mut next = todos.clone();
            next.push(todo);
            next
        });
        Some(id)
    }

    /// Add the current draft and clear it.
    pub fn add_draft(&self) -> Option<u64> {
        let id = self.add(&self.draft.get_untracked())?;
        self.draft.set(String::new());
        Some(id)
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        self.draft.set(text.into());
    }

    pub fn toggle(&self, id: u64) {
        if !self.contains(id) {
            return;
        }
        self.todos.update(|todos| {
            todos
                .iter()
                .map(|todo| {
                    if todo.id == id {
                        Todo {
                            completed: !todo.completed,
                            ..todo.clone()
                        }
                    } else {
                        todo.clone()
                    }
                })
                .collect()
        });
    }

    pub fn delete(&self, id: u64) {
        if !self.contains(id) {
            return;
        }
        self.todos
            .update(|todos| todos.iter().filter(|todo| todo.id != id).cloned().collect());
        debug!(id, "todo deleted");
    }

    pub fn clear_completed(&self) {
        self.todos.update(|todos| filtered_view(todos, TodoFilter::Active));
    }

    pub fn set_filter(&self, filter: TodoFilter) {
        self.filter.set(filter);
    }

    fn contains(&self, id: u64) -> bool {
        self.todos
            .with(|todos| todos.iter().any(|todo| todo.id == id))
    }

    pub fn todos(&self) -> Vec<Todo> {
        self.todos.get()
    }

    pub fn filtered_view(&self, filter: TodoFilter) -> Vec<Todo> {
        self.todos.with(|todos| filtered_view(todos, filter))
    }

    /// Todos passing the current filter.
    pub fn filtered(&self) -> Vec<Todo> {
        self.filtered.get()
    }

    pub fn filter(&self) -> TodoFilter {
        self.filter.get()
    }

    pub fn draft(&self) -> String {
        self.draft.get()
    }

    pub fn can_add(&self) -> bool {
        self.can_add.get()
    }

    pub fn total(&self) -> usize {
        self.total.get()
    }

    pub fn active(&self) -> usize {
        self.active.get()
    }

    pub fn completed(&self) -> usize {
        self.completed.get()
    }

    pub fn has_completed(&self) -> bool {
        self.completed() > 0
    }

    /// `Some` only when the filtered list is empty.
    pub fn empty_message(&self) -> Option<&'static str> {
        let filter = self.filter();
        self.filtered
            .with(Vec::is_empty)
            .then(|| filter.empty_message())
    }

    /// Tracked snapshot of everything the todo page shows.
    pub fn view(&self) -> TodoView {
        TodoView {
            draft: self.draft(),
            can_add: self.can_add(),
            filter: self.filter(),
            visible: self.filtered(),
            total: self.total(),
            active: self.active(),
            completed: self.completed(),
            has_completed: self.has_completed(),
            empty_message: self.empty_message(),
        }
    }
}
