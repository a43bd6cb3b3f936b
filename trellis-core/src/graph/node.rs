//! Graph Nodes
//!
//! This module defines the node types that live in the dependency graph.

use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexSet;

/// Unique identifier for a node in the dependency graph.
///
/// Signals, computed values and effects all draw their identity from the
/// same counter, so an ID never collides across node kinds or runtimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// The kind of node in the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A source node (signal). These are the roots of the graph.
    /// They have no dependencies, only dependents.
    Source,

    /// A derived node (computed). These have dependencies and may have
    /// dependents. They cache their value.
    Derived,

    /// An effect node. These are leaves of the graph: they have
    /// dependencies but nothing reads from them.
    Effect,
}

/// Dirty state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyState {
    /// The node's value is up-to-date.
    Clean,

    /// The node might need to recompute. A transitive dependency changed,
    /// but we have not yet verified whether its direct inputs are different.
    MaybeDirty,

    /// The node definitely needs to recompute. A direct input changed.
    Dirty,
}

/// A node in the dependency graph.
#[derive(Debug)]
pub struct Node {
    /// Unique identifier for this node.
    id: NodeId,

    /// What kind of node this is.
    kind: NodeKind,

    /// Current dirty state.
    dirty: DirtyState,

    /// Revision at which this node's observable value last changed.
    changed_at: u64,

    /// Revision at which this node was last confirmed up-to-date.
    verified_at: u64,

    /// Nodes that this node depends on (parents in the DAG), in the order
    /// they were first read during the last evaluation.
    dependencies: IndexSet<NodeId>,

    /// Nodes that depend on this node (children in the DAG).
    dependents: IndexSet<NodeId>,
}

impl Node {
    /// Create a new node with a fresh ID.
    pub fn new(kind: NodeKind) -> Self {
        Self::with_id(NodeId::new(), kind)
    }

    /// Create a node for an ID allocated elsewhere.
    pub fn with_id(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            dirty: match kind {
                NodeKind::Source => DirtyState::Clean,
                // Start dirty to ensure the first read computes.
                NodeKind::Derived | NodeKind::Effect => DirtyState::Dirty,
            },
            changed_at: 0,
            verified_at: 0,
            dependencies: IndexSet::new(),
            dependents: IndexSet::new(),
        }
    }

    /// Create a new source (signal) node.
    pub fn source() -> Self {
        Self::new(NodeKind::Source)
    }

    /// Create a new derived (computed) node.
    pub fn derived() -> Self {
        Self::new(NodeKind::Derived)
    }

    /// Create a new effect node.
    pub fn effect() -> Self {
        Self::new(NodeKind::Effect)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn dirty_state(&self) -> DirtyState {
        self.dirty
    }

    pub fn is_clean(&self) -> bool {
        self.dirty == DirtyState::Clean
    }

    /// Mark the node as clean, verified as of `revision`.
    pub fn mark_clean(&mut self, revision: u64) {
        self.dirty = DirtyState::Clean;
        self.verified_at = revision;
    }

    /// Mark the node as maybe dirty. Only a clean node is downgraded;
    /// a dirty node stays dirty.
    pub fn mark_maybe_dirty(&mut self) {
        if self.dirty == DirtyState::Clean {
            self.dirty = DirtyState::MaybeDirty;
        }
    }

    /// Mark the node as definitely dirty (needs recomputation).
    pub fn mark_dirty(&mut self) {
        self.dirty = DirtyState::Dirty;
    }

    pub fn changed_at(&self) -> u64 {
        self.changed_at
    }

    /// Record that the node's value changed at `revision`.
    pub fn mark_changed(&mut self, revision: u64) {
        self.changed_at = revision;
    }

    pub fn verified_at(&self) -> u64 {
        self.verified_at
    }

    /// Add a dependency (a node that this node reads from).
    pub fn add_dependency(&mut self, node_id: NodeId) {
        self.dependencies.insert(node_id);
    }

    pub fn remove_dependency(&mut self, node_id: NodeId) {
        self.dependencies.shift_remove(&node_id);
    }

    pub fn dependencies(&self) -> &IndexSet<NodeId> {
        &self.dependencies
    }

    /// Add a dependent (a node that reads from this node).
    pub fn add_dependent(&mut self, node_id: NodeId) {
        self.dependents.insert(node_id);
    }

    pub fn remove_dependent(&mut self, node_id: NodeId) {
        self.dependents.shift_remove(&node_id);
    }

    pub fn dependents(&self) -> &IndexSet<NodeId> {
        &self.dependents
    }

    /// Clear all dependencies, returning the previous set.
    pub fn take_dependencies(&mut self) -> IndexSet<NodeId> {
        std::mem::take(&mut self.dependencies)
    }
}
