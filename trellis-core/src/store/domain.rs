//! Domain store.
//!
//! Keeps a keyed collection of [`DomainEntity`] values loaded through a
//! [`DataAccess`], plus load status, the last error and a selection.
//!
//! # Switch-to-latest
//!
//! Every [`DomainStore::load`] takes a fresh generation number before it
//! goes out. When the response arrives, it is applied only if no newer
//! load (or [`DomainStore::reset`]) has started in the meantime. Older
//! responses are dropped on arrival; the requests themselves still run to
//! completion.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::Display;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::access::{DataAccess, DomainChanges, DomainEntity};
use crate::reactive::{Computed, Runtime, Signal};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Everything the store holds. Entities keep the order they arrived in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainState {
    pub load_status: LoadStatus,
    pub error: Option<String>,
    pub selected_id: Option<String>,
    pub entities_by_id: IndexMap<String, DomainEntity>,
}

/// What happened to a load's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    Superseded,
}

/// Snapshot for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainView {
    pub status: LoadStatus,
    pub error: Option<String>,
    pub entities: Vec<DomainEntity>,
    pub selected: Option<DomainEntity>,
}

/// Key entities by id. A repeated id keeps its first position and its
/// last value.
pub fn to_entity_map(entities: Vec<DomainEntity>) -> IndexMap<String, DomainEntity> {
    entities
        .into_iter()
        .map(|entity| (entity.id.clone(), entity))
        .collect()
}

pub struct DomainStore<A> {
    access: Arc<A>,
    state: Signal<DomainState>,
    generation: AtomicU64,

    is_loading: Computed<bool>,
    has_error: Computed<bool>,
    entities: Computed<Vec<DomainEntity>>,
    selected_entity: Computed<Option<DomainEntity>>,
}

impl<A: DataAccess> DomainStore<A> {
    pub fn new(runtime: &Runtime, access: Arc<A>) -> Self {
        let state = Signal::new(runtime, DomainState::default());

        let is_loading = Computed::new(runtime, {
            let state = state.clone();
            move || state.with(|s| s.load_status == LoadStatus::Loading)
        });
        let has_error = Computed::new(runtime, {
            let state = state.clone();
            move || state.with(|s| s.load_status == LoadStatus::Error)
        });
        let entities = Computed::new(runtime, {
            let state = state.clone();
            move || state.with(|s| s.entities_by_id.values().cloned().collect())
        });
        let selected_entity = Computed::new(runtime, {
            let state = state.clone();
            move || {
                state.with(|s| {
                    s.selected_id
                        .as_ref()
                        .and_then(|id| s.entities_by_id.get(id))
                        .cloned()
                })
            }
        });

        Self {
            access,
            state,
            generation: AtomicU64::new(0),
            is_loading,
            has_error,
            entities,
            selected_entity,
        }
    }

    fn patch(&self, f: impl FnOnce(&mut DomainState)) {
        self.state.update(|state| {
            let mut next = state.clone();
            f(&mut next);
            next
        });
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Load the entities of `scope_id`, replacing the whole collection on
    /// success. Failures are recorded in the state, never returned.
    pub async fn load(&self, scope_id: &str) -> LoadOutcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.patch(|state| {
            state.load_status = LoadStatus::Loading;
            state.error = None;
        });
        debug!(scope_id, generation, "load started");

        let result = self.access.load(scope_id).await;

        if !self.is_current(generation) {
            debug!(scope_id, generation, "load superseded, response discarded");
            return LoadOutcome::Superseded;
        }

        match result {
            Ok(entities) => {
                debug!(scope_id, generation, count = entities.len(), "load succeeded");
                self.patch(|state| {
                    state.load_status = LoadStatus::Success;
                    state.entities_by_id = to_entity_map(entities);
                });
            }
            Err(err) => {
                warn!(scope_id, generation, error = %err, "load failed");
                self.patch(|state| {
                    state.load_status = LoadStatus::Error;
                    state.error = Some(err.to_string());
                });
            }
        }
        LoadOutcome::Applied
    }

    /// Start a load on the tokio runtime.
    pub fn spawn_load(self: &Arc<Self>, scope_id: impl Into<String>) -> JoinHandle<LoadOutcome> {
        let store = Arc::clone(self);
        let scope_id = scope_id.into();
        tokio::spawn(async move { store.load(&scope_id).await })
    }

    /// Set the selection. Does not fetch anything.
    pub fn select(&self, id: Option<&str>) {
        let id = id.map(str::to_owned);
        self.patch(|state| state.selected_id = id);
    }

    /// Back to the initial state. Loads still in flight are discarded.
    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.set(DomainState::default());
        debug!("store reset");
    }

    /// Drop an entity locally. Clears the selection if it pointed at it.
    pub fn remove(&self, id: &str) {
        self.patch(|state| {
            if state.entities_by_id.shift_remove(id).is_some()
                && state.selected_id.as_deref() == Some(id)
            {
                state.selected_id = None;
            }
        });
    }

    /// Apply `changes` to a local entity. Unknown ids are ignored.
    pub fn update(&self, id: &str, changes: &DomainChanges) {
        self.patch(|state| {
            if let Some(entity) = state.entities_by_id.get_mut(id) {
                *entity = changes.apply_to(entity);
            }
        });
    }

    pub fn state(&self) -> DomainState {
        self.state.get()
    }

    pub fn load_status(&self) -> LoadStatus {
        self.state.with(|s| s.load_status)
    }

    pub fn error(&self) -> Option<String> {
        self.state.with(|s| s.error.clone())
    }

    pub fn selected_id(&self) -> Option<String> {
        self.state.with(|s| s.selected_id.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading.get()
    }

    pub fn has_error(&self) -> bool {
        self.has_error.get()
    }

    pub fn entities(&self) -> Vec<DomainEntity> {
        self.entities.get()
    }

    pub fn selected_entity(&self) -> Option<DomainEntity> {
        self.selected_entity.get()
    }

    pub fn access(&self) -> &A {
        &self.access
    }

    pub fn view(&self) -> DomainView {
        DomainView {
            status: self.load_status(),
            error: self.error(),
            entities: self.entities(),
            selected: self.selected_entity(),
        }
    }
}

impl<A> std::fmt::Debug for DomainStore<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainStore")
            .field("state", &self.state)
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{AccessError, NewDomainEntity};
    use parking_lot::Mutex;
    use std::future::{ready, Future};

    fn entity(id: &str, name: &str) -> DomainEntity {
        DomainEntity {
            id: id.into(),
            name: name.into(),
            description: None,
        }
    }

    /// Answers `load` immediately, either with entities or an HTTP status.
    struct FixedAccess {
        reply: Mutex<Result<Vec<DomainEntity>, u16>>,
    }

    impl FixedAccess {
        fn ok(entities: Vec<DomainEntity>) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Ok(entities)),
            })
        }

        fn status(status: u16) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Err(status)),
            })
        }
    }

    impl DataAccess for FixedAccess {
        fn load(
            &self,
            _scope_id: &str,
        ) -> impl Future<Output = Result<Vec<DomainEntity>, AccessError>> + Send {
            let reply = self
                .reply
                .lock()
                .clone()
                .map_err(|status| crate::access::handle_error(Some(status), ""));
            ready(reply)
        }

        fn get_by_id(
            &self,
            _id: &str,
        ) -> impl Future<Output = Result<DomainEntity, AccessError>> + Send {
            ready(Err(AccessError::NotFound))
        }

        fn create(
            &self,
            _entity: NewDomainEntity,
        ) -> impl Future<Output = Result<DomainEntity, AccessError>> + Send {
            ready(Err(AccessError::NotFound))
        }

        fn update(
            &self,
            _id: &str,
            _changes: DomainChanges,
        ) -> impl Future<Output = Result<DomainEntity, AccessError>> + Send {
            ready(Err(AccessError::NotFound))
        }

        fn delete(&self, _id: &str) -> impl Future<Output = Result<(), AccessError>> + Send {
            ready(Err(AccessError::NotFound))
        }
    }

    #[test]
    fn starts_idle_and_empty() {
        let store = DomainStore::new(&Runtime::new(), FixedAccess::ok(vec![]));
        assert_eq!(store.state(), DomainState::default());
        assert!(!store.is_loading());
        assert!(!store.has_error());
        assert_eq!(store.selected_entity(), None);
    }

    #[tokio::test]
    async fn successful_load_replaces_collection_in_order() {
        let access = FixedAccess::ok(vec![entity("b", "Beta"), entity("a", "Alpha")]);
        let store = DomainStore::new(&Runtime::new(), access.clone());

        assert_eq!(store.load("team").await, LoadOutcome::Applied);
        assert_eq!(store.load_status(), LoadStatus::Success);
        let ids: Vec<_> = store.entities().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, ["b", "a"]);

        *access.reply.lock() = Ok(vec![entity("c", "Gamma")]);
        store.load("team").await;
        assert_eq!(store.entities(), vec![entity("c", "Gamma")]);
    }

    #[tokio::test]
    async fn not_found_is_recorded_as_error() {
        let store = DomainStore::new(&Runtime::new(), FixedAccess::status(404));

        store.load("missing").await;
        assert_eq!(store.load_status(), LoadStatus::Error);
        assert_eq!(store.error().as_deref(), Some("Resource not found."));
        assert!(store.has_error());
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn new_load_clears_previous_error() {
        let access = FixedAccess::status(500);
        let store = DomainStore::new(&Runtime::new(), access.clone());
        store.load("s").await;
        assert!(store.has_error());

        *access.reply.lock() = Ok(vec![]);
        store.load("s").await;
        assert_eq!(store.error(), None);
        assert_eq!(store.load_status(), LoadStatus::Success);
    }

    #[tokio::test]
    async fn selection_is_a_lookup() {
        let access = FixedAccess::ok(vec![entity("a", "Alpha"), entity("b", "Beta")]);
        let store = DomainStore::new(&Runtime::new(), access);

        store.select(Some("b"));
        assert_eq!(store.selected_entity(), None);

        store.load("s").await;
        assert_eq!(store.selected_entity(), Some(entity("b", "Beta")));

        store.select(Some("zzz"));
        assert_eq!(store.selected_id().as_deref(), Some("zzz"));
        assert_eq!(store.selected_entity(), None);

        store.select(None);
        assert_eq!(store.selected_id(), None);
    }

    #[tokio::test]
    async fn removing_selected_entity_clears_selection() {
        let access = FixedAccess::ok(vec![entity("a", "Alpha"), entity("b", "Beta")]);
        let store = DomainStore::new(&Runtime::new(), access);
        store.load("s").await;

        store.select(Some("a"));
        store.remove("b");
        assert_eq!(store.selected_id().as_deref(), Some("a"));

        store.remove("a");
        assert_eq!(store.selected_id(), None);
        assert_eq!(store.selected_entity(), None);
        assert!(store.entities().is_empty());
    }

    #[tokio::test]
    async fn local_update_keeps_key_and_position() {
        let access = FixedAccess::ok(vec![entity("a", "Alpha"), entity("b", "Beta")]);
        let store = DomainStore::new(&Runtime::new(), access);
        store.load("s").await;

        let changes = DomainChanges {
            name: Some("Alpha prime".into()),
            ..DomainChanges::default()
        };
        store.update("a", &changes);
        store.update("nope", &changes);

        let state = store.state();
        assert_eq!(state.entities_by_id.len(), 2);
        assert_eq!(
            state.entities_by_id.get_index(0).map(|(_, e)| e.name.as_str()),
            Some("Alpha prime")
        );
        for (key, entity) in &state.entities_by_id {
            assert_eq!(key, &entity.id);
        }
    }

    #[tokio::test]
    async fn reset_restores_initial_state() {
        let store = DomainStore::new(
            &Runtime::new(),
            FixedAccess::ok(vec![entity("a", "Alpha")]),
        );
        store.load("s").await;
        store.select(Some("a"));

        store.reset();
        assert_eq!(store.state(), DomainState::default());
    }

    #[test]
    fn entity_map_keys_match_ids() {
        let map = to_entity_map(vec![
            entity("a", "first"),
            entity("b", "Beta"),
            entity("a", "second"),
        ]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get_index(0).map(|(k, _)| k.as_str()), Some("a"));
        assert_eq!(map["a"].name, "second");
    }
}
