//! Module dependency graph
//!
//! Holds one node per module id ever observed during graph construction,
//! including ids referenced only as a dependency. Edges are plain ids looked
//! up through the node arena, so a missing dependency is naturally
//! expressible without weak-reference machinery; `is_dependency_satisfied`
//! reports a vanished target as unsatisfied instead of failing.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::module::identity::ModuleId;
use crate::module::traits::{LifecycleState, ModuleError};

/// One node per distinct module id observed during graph construction.
#[derive(Debug, Clone)]
pub struct ModuleNode {
    id: ModuleId,
    state: LifecycleState,
    dependencies: Vec<ModuleId>,
}

impl ModuleNode {
    pub fn id(&self) -> &ModuleId {
        &self.id
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Declared direct dependencies, in declaration order, deduplicated.
    pub fn dependencies(&self) -> &[ModuleId] {
        &self.dependencies
    }
}

/// Dependency graph over module ids.
///
/// Enumeration is stable in insertion order. Mutating the graph while
/// iterating it is undefined; callers snapshot [`DependencyGraph::ids`] when
/// they need to mutate mid-walk.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    nodes: HashMap<ModuleId, ModuleNode>,
    /// Insertion order for stable enumeration
    order: Vec<ModuleId>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotently ensure a node exists for `id` and record its dependency
    /// edges. Dependency ids not seen before materialize as placeholder
    /// nodes in state `Unknown`.
    ///
    /// Re-adding an existing id is expected (duplicate discovery across
    /// containers) and logged as a warning, not an error; any new edges are
    /// still recorded.
    pub fn add_or_update(&mut self, id: ModuleId, dependencies: &[ModuleId]) {
        if self.nodes.contains_key(&id) {
            warn!("{}", ModuleError::DuplicateDeclaration(id.clone()));
        } else {
            self.insert_node(id.clone());
        }

        for dep in dependencies {
            if !self.nodes.contains_key(dep) {
                debug!("Materializing placeholder node for dependency {}", dep);
                self.insert_node(dep.clone());
            }
            if let Some(node) = self.nodes.get_mut(&id) {
                if !node.dependencies.contains(dep) {
                    node.dependencies.push(dep.clone());
                }
            }
        }
    }

    fn insert_node(&mut self, id: ModuleId) {
        self.order.push(id.clone());
        self.nodes.insert(
            id.clone(),
            ModuleNode {
                id,
                state: LifecycleState::Unknown,
                dependencies: Vec::new(),
            },
        );
    }

    /// Set the state of an existing node. Unknown ids warn and no-op, and
    /// `Error` is absorbing: once a node errors it never leaves that state.
    pub fn set_state(&mut self, id: &ModuleId, state: LifecycleState) {
        match self.nodes.get_mut(id) {
            Some(node) => {
                if node.state == LifecycleState::Error && state != LifecycleState::Error {
                    warn!(
                        "Ignoring transition of errored module {} to {:?}",
                        id, state
                    );
                    return;
                }
                debug!("Module {}: {:?} -> {:?}", id, node.state, state);
                node.state = state;
            }
            None => warn!("setState for unknown module {} ignored", id),
        }
    }

    pub fn state(&self, id: &ModuleId) -> Option<LifecycleState> {
        self.nodes.get(id).map(|node| node.state)
    }

    pub fn node(&self, id: &ModuleId) -> Option<&ModuleNode> {
        self.nodes.get(id)
    }

    /// Direct-dependency check only: true iff every direct dependency of
    /// `id` has a node and that node is in `{Loaded, Mounted, Initialized}`.
    /// Transitive satisfaction is the orchestrator's ordering concern, not
    /// the graph's.
    pub fn is_dependency_satisfied(&self, id: &ModuleId) -> bool {
        let Some(node) = self.nodes.get(id) else {
            return false;
        };
        node.dependencies.iter().all(|dep| {
            self.nodes
                .get(dep)
                .map(|d| d.state.satisfies_dependants())
                .unwrap_or(false)
        })
    }

    /// Global precondition for the mount phase: every node independently
    /// satisfies [`DependencyGraph::is_dependency_satisfied`] at this
    /// snapshot. Does not by itself guarantee a valid mount order.
    pub fn is_graph_ready(&self) -> bool {
        self.order.iter().all(|id| self.is_dependency_satisfied(id))
    }

    /// Nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Snapshot of all ids in enumeration order.
    pub fn ids(&self) -> Vec<ModuleId> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Release all nodes. Safe to call multiple times.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.order.clear();
    }
}
