//! Dependency Graph
//!
//! This module implements the computational dependency graph that tracks
//! relationships between signals, computed values and effects.
//!
//! # Overview
//!
//! The dependency graph is a directed acyclic graph (DAG) where:
//!
//! - Nodes represent reactive values (signals) or computations (computed
//!   values, effects)
//! - Edges represent dependencies: if A reads B, there is an edge from B to A
//!
//! When a signal changes, we traverse the graph to find all affected nodes
//! and mark them as dirty. Derived nodes are then pulled up to date lazily,
//! on their next read.
//!
//! # Design Decisions
//!
//! 1. We use a centralized graph per runtime rather than distributed linked
//!    lists because it enables topological ordering of effect runs and keeps
//!    dynamic re-subscription a single `replace_dependencies` call.
//!
//! 2. The graph is indexed by node ID for O(1) lookups.
//!
//! 3. We maintain both forward (dependencies) and reverse (dependents) edges
//!    to enable efficient traversal in both directions.

mod node;
mod propagation;

pub use node::{DirtyState, Node, NodeId, NodeKind};
pub use propagation::DependencyGraph;
