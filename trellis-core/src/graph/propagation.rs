//! Dependency Graph and Change Propagation
//!
//! The graph owns every node of a runtime and decides which nodes a write
//! invalidates.
//!
//! # Algorithm
//!
//! 1. A write bumps the graph revision and stamps the source's `changed_at`.
//! 2. Direct dependents of the source are marked `Dirty`.
//! 3. Everything reachable beyond them is marked `MaybeDirty`.
//! 4. Nodes that were clean before the write are returned in topological
//!    order so callers can notify listeners and schedule effects.
//!
//! Nothing is recomputed here. Derived nodes are pulled up to date when
//! read, which lets a `MaybeDirty` node skip its computation entirely if
//! none of its direct inputs actually changed.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::trace;

use super::node::{DirtyState, Node, NodeId, NodeKind};

/// The dependency graph for one runtime.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// All nodes in the graph, indexed by ID.
    nodes: HashMap<NodeId, Node>,

    /// Monotonic write counter. Starts at zero; the first write is revision 1.
    revision: u64,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the graph.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id();
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node from the graph, dropping every edge that touches it.
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(&node_id)?;

        for dep_id in node.dependencies() {
            if let Some(dep) = self.nodes.get_mut(dep_id) {
                dep.remove_dependent(node_id);
            }
        }

        for dependent_id in node.dependents() {
            if let Some(dependent) = self.nodes.get_mut(dependent_id) {
                dependent.remove_dependency(node_id);
            }
        }

        Some(node)
    }

    pub fn get_node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    pub fn get_node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Add a dependency edge: `dependent` reads from `dependency`.
    ///
    /// Edges to nodes outside this graph are ignored.
    pub fn add_edge(&mut self, dependency: NodeId, dependent: NodeId) {
        if !self.nodes.contains_key(&dependency) || !self.nodes.contains_key(&dependent) {
            return;
        }
        if let Some(dep_node) = self.nodes.get_mut(&dependency) {
            dep_node.add_dependent(dependent);
        }
        if let Some(dependent_node) = self.nodes.get_mut(&dependent) {
            dependent_node.add_dependency(dependency);
        }
    }

    pub fn remove_edge(&mut self, dependency: NodeId, dependent: NodeId) {
        if let Some(dep_node) = self.nodes.get_mut(&dependency) {
            dep_node.remove_dependent(dependent);
        }
        if let Some(dependent_node) = self.nodes.get_mut(&dependent) {
            dependent_node.remove_dependency(dependency);
        }
    }

    /// Replace the full dependency set of `node_id`.
    ///
    /// Called after every evaluation: dependencies are dynamic, so the
    /// edges from the previous run are dropped before the new ones go in.
    pub fn replace_dependencies(&mut self, node_id: NodeId, dependencies: &[NodeId]) {
        let previous = match self.nodes.get_mut(&node_id) {
            Some(node) => node.take_dependencies(),
            None => return,
        };

        for dep_id in previous {
            if let Some(dep) = self.nodes.get_mut(&dep_id) {
                dep.remove_dependent(node_id);
            }
        }

        for &dep_id in dependencies {
            if dep_id != node_id {
                self.add_edge(dep_id, node_id);
            }
        }
    }

    /// Dependencies of a node, in no particular order.
    pub fn dependencies_of(&self, node_id: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node_id)
            .map(|node| node.dependencies().iter().copied().collect())
            .unwrap_or_default()
    }

    /// Current revision.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Dirty state of a node. Unknown nodes report `Dirty` so callers
    /// never trust a cache the graph no longer vouches for.
    pub fn dirty_state(&self, node_id: NodeId) -> DirtyState {
        self.nodes
            .get(&node_id)
            .map(Node::dirty_state)
            .unwrap_or(DirtyState::Dirty)
    }

    pub fn changed_at(&self, node_id: NodeId) -> u64 {
        self.nodes.get(&node_id).map(Node::changed_at).unwrap_or(0)
    }

    pub fn verified_at(&self, node_id: NodeId) -> u64 {
        self.nodes.get(&node_id).map(Node::verified_at).unwrap_or(0)
    }

    /// Mark a node clean after an evaluation that started at `as_of`.
    ///
    /// Writes that landed during the evaluation only matter if they hit one
    /// of the node's own dependencies. In that case the node stays dirty so
    /// it evaluates again, and `false` is returned.
    pub fn mark_clean(&mut self, node_id: NodeId, as_of: u64) -> bool {
        let current = self.revision;
        let raced = self
            .dependencies_of(node_id)
            .into_iter()
            .any(|dep_id| self.changed_at(dep_id) > as_of);

        match self.nodes.get_mut(&node_id) {
            Some(node) if raced => {
                node.mark_dirty();
                false
            }
            Some(node) => {
                node.mark_clean(current);
                true
            }
            None => false,
        }
    }

    /// Record that a derived node produced a new value.
    pub fn mark_output_changed(&mut self, node_id: NodeId) {
        let revision = self.revision;
        if let Some(node) = self.nodes.get_mut(&node_id) {
            node.mark_changed(revision);
        }
    }

    /// Record a write to `source_id` and propagate dirty flags.
    ///
    /// Returns the nodes that went from clean to invalid, plus every
    /// reached effect that was still invalid from an earlier write, in
    /// topological order (dependencies before dependents).
    pub fn record_write(&mut self, source_id: NodeId) -> Vec<NodeId> {
        self.revision += 1;
        let revision = self.revision;

        let direct: Vec<NodeId> = match self.nodes.get_mut(&source_id) {
            Some(source) => {
                source.mark_changed(revision);
                source.dependents().iter().copied().collect()
            }
            None => return Vec::new(),
        };

        let mut invalidated = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();

        for node_id in direct {
            visited.insert(node_id);
            if let Some(node) = self.nodes.get_mut(&node_id) {
                if node.is_clean() || node.kind() == NodeKind::Effect {
                    invalidated.push(node_id);
                }
                node.mark_dirty();
                queue.extend(node.dependents().iter().copied());
            }
        }

        // BFS to propagate maybe-dirty status
        while let Some(node_id) = queue.pop_front() {
            if !visited.insert(node_id) {
                continue;
            }

            if let Some(node) = self.nodes.get_mut(&node_id) {
                if node.is_clean() || node.kind() == NodeKind::Effect {
                    invalidated.push(node_id);
                }
                node.mark_maybe_dirty();
                queue.extend(node.dependents().iter().copied());
            }
        }

        trace!(
            source = source_id.raw(),
            revision,
            invalidated = invalidated.len(),
            "propagated write"
        );

        self.topological_sort(invalidated)
    }

    /// Perform a topological sort of the given nodes.
    ///
    /// Returns nodes in order such that dependencies come before dependents.
    fn topological_sort(&self, nodes: Vec<NodeId>) -> Vec<NodeId> {
        let node_set: HashSet<_> = nodes.iter().copied().collect();
        let mut in_degree: HashMap<NodeId, usize> = HashMap::new();
        let mut result = Vec::with_capacity(nodes.len());
        let mut queue = VecDeque::new();

        // Calculate in-degrees (only counting edges within the node set)
        for &node_id in &nodes {
            if let Some(node) = self.nodes.get(&node_id) {
                let degree = node
                    .dependencies()
                    .iter()
                    .filter(|d| node_set.contains(d))
                    .count();
                in_degree.insert(node_id, degree);
                if degree == 0 {
                    queue.push_back(node_id);
                }
            }
        }

        // Kahn's algorithm
        while let Some(node_id) = queue.pop_front() {
            result.push(node_id);

            if let Some(node) = self.nodes.get(&node_id) {
                for &dependent_id in node.dependents() {
                    if let Some(degree) = in_degree.get_mut(&dependent_id) {
                        *degree = degree.saturating_sub(1);
                        if *degree == 0 {
                            queue.push_back(dependent_id);
                        }
                    }
                }
            }
        }

        result
    }

    /// Whether `node_id` is an effect node.
    pub fn is_effect(&self, node_id: NodeId) -> bool {
        self.nodes
            .get(&node_id)
            .map(|node| node.kind() == NodeKind::Effect)
            .unwrap_or(false)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_chain(graph: &mut DependencyGraph) -> (NodeId, NodeId, NodeId) {
        // source -> derived1 -> derived2
        let source_id = graph.add_node(Node::source());
        let derived1_id = graph.add_node(Node::derived());
        let derived2_id = graph.add_node(Node::derived());

        graph.add_edge(source_id, derived1_id);
        graph.add_edge(derived1_id, derived2_id);

        graph.mark_clean(derived1_id, 0);
        graph.mark_clean(derived2_id, 0);
        (source_id, derived1_id, derived2_id)
    }

    #[test]
    fn add_and_remove_nodes() {
        let mut graph = DependencyGraph::new();

        let id1 = graph.add_node(Node::source());
        let id2 = graph.add_node(Node::derived());
        graph.add_edge(id1, id2);
        assert_eq!(graph.node_count(), 2);

        graph.remove_node(id1);
        assert_eq!(graph.node_count(), 1);
        assert!(graph.get_node(id1).is_none());
        assert!(graph.dependencies_of(id2).is_empty());
    }

    #[test]
    fn add_and_remove_edges() {
        let mut graph = DependencyGraph::new();

        let source_id = graph.add_node(Node::source());
        let derived_id = graph.add_node(Node::derived());

        graph.add_edge(source_id, derived_id);
        assert!(graph
            .get_node(source_id)
            .unwrap()
            .dependents()
            .contains(&derived_id));
        assert_eq!(graph.dependencies_of(derived_id), vec![source_id]);

        graph.remove_edge(source_id, derived_id);
        assert!(graph.get_node(source_id).unwrap().dependents().is_empty());
        assert!(graph.dependencies_of(derived_id).is_empty());
    }

    #[test]
    fn edges_to_unknown_nodes_are_ignored() {
        let mut graph = DependencyGraph::new();
        let derived_id = graph.add_node(Node::derived());

        graph.add_edge(NodeId::new(), derived_id);
        assert!(graph.dependencies_of(derived_id).is_empty());
    }

    #[test]
    fn replace_dependencies_drops_stale_edges() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_node(Node::source());
        let b = graph.add_node(Node::source());
        let derived = graph.add_node(Node::derived());

        graph.replace_dependencies(derived, &[a]);
        assert_eq!(graph.dependencies_of(derived), vec![a]);

        graph.replace_dependencies(derived, &[b]);
        assert_eq!(graph.dependencies_of(derived), vec![b]);
        assert!(graph.get_node(a).unwrap().dependents().is_empty());
    }

    #[test]
    fn write_marks_direct_dirty_and_transitive_maybe_dirty() {
        let mut graph = DependencyGraph::new();
        let (source_id, derived1_id, derived2_id) = clean_chain(&mut graph);

        let invalidated = graph.record_write(source_id);

        assert_eq!(invalidated, vec![derived1_id, derived2_id]);
        assert_eq!(graph.dirty_state(derived1_id), DirtyState::Dirty);
        assert_eq!(graph.dirty_state(derived2_id), DirtyState::MaybeDirty);
        assert_eq!(graph.revision(), 1);
        assert_eq!(graph.changed_at(source_id), 1);
    }

    #[test]
    fn already_invalid_nodes_are_not_reported_twice() {
        let mut graph = DependencyGraph::new();
        let (source_id, _, _) = clean_chain(&mut graph);

        assert_eq!(graph.record_write(source_id).len(), 2);
        assert!(graph.record_write(source_id).is_empty());
    }

    #[test]
    fn mark_clean_refuses_when_a_dependency_changed() {
        let mut graph = DependencyGraph::new();
        let (source_id, derived1_id, _) = clean_chain(&mut graph);

        let started_at = graph.revision();
        graph.record_write(source_id);
        assert!(!graph.mark_clean(derived1_id, started_at));

        assert_eq!(graph.dirty_state(derived1_id), DirtyState::Dirty);
    }

    #[test]
    fn unrelated_writes_do_not_block_mark_clean() {
        let mut graph = DependencyGraph::new();
        let (_, derived1_id, _) = clean_chain(&mut graph);
        let unrelated = graph.add_node(Node::source());

        let started_at = graph.revision();
        graph.record_write(unrelated);
        assert!(graph.mark_clean(derived1_id, started_at));

        assert_eq!(graph.dirty_state(derived1_id), DirtyState::Clean);
        assert_eq!(graph.verified_at(derived1_id), graph.revision());
    }

    #[test]
    fn invalid_effects_are_reported_again() {
        let mut graph = DependencyGraph::new();
        let source = graph.add_node(Node::source());
        let effect = graph.add_node(Node::effect());
        graph.replace_dependencies(effect, &[source]);
        graph.mark_clean(effect, 0);

        assert_eq!(graph.record_write(source), vec![effect]);
        // Still dirty: the next write schedules it again
        assert_eq!(graph.record_write(source), vec![effect]);
    }

    #[test]
    fn diamond_is_sorted_topologically() {
        let mut graph = DependencyGraph::new();
        let source = graph.add_node(Node::source());
        let left = graph.add_node(Node::derived());
        let right = graph.add_node(Node::derived());
        let sink = graph.add_node(Node::effect());

        graph.replace_dependencies(left, &[source]);
        graph.replace_dependencies(right, &[source]);
        graph.replace_dependencies(sink, &[left, right]);
        for id in [left, right, sink] {
            graph.mark_clean(id, 0);
        }

        let order = graph.record_write(source);
        assert_eq!(order.len(), 3);
        assert_eq!(order.last(), Some(&sink));
        assert!(graph.is_effect(sink));
    }
}
