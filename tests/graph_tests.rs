//! Dependency graph contract tests

use modhost::module::identity::ModuleId;
use modhost::module::registry::graph::DependencyGraph;
use modhost::module::traits::LifecycleState;

fn id(raw: &str) -> ModuleId {
    ModuleId::parse(raw)
}

#[test]
fn node_without_dependencies_is_always_satisfied() {
    let mut graph = DependencyGraph::new();
    graph.add_or_update(id("a"), &[]);

    for state in [
        LifecycleState::Unknown,
        LifecycleState::Loaded,
        LifecycleState::Mounted,
        LifecycleState::Initialized,
        LifecycleState::Error,
    ] {
        graph.set_state(&id("a"), state);
        assert!(graph.is_dependency_satisfied(&id("a")));
    }
}

#[test]
fn unknown_dependency_disqualifies() {
    let mut graph = DependencyGraph::new();
    graph.add_or_update(id("a"), &[id("b")]);

    // b exists only as an Unknown placeholder
    assert_eq!(graph.state(&id("b")), Some(LifecycleState::Unknown));
    assert!(!graph.is_dependency_satisfied(&id("a")));
    assert!(!graph.is_graph_ready());
}

#[test]
fn loaded_mounted_initialized_dependencies_satisfy() {
    let mut graph = DependencyGraph::new();
    graph.add_or_update(id("a"), &[id("b")]);
    graph.add_or_update(id("b"), &[]);

    for state in [
        LifecycleState::Loaded,
        LifecycleState::Mounted,
        LifecycleState::Initialized,
    ] {
        graph.set_state(&id("b"), state);
        assert!(graph.is_dependency_satisfied(&id("a")));
    }
}

#[test]
fn disqualifying_dependency_states() {
    for state in [
        LifecycleState::Shutdown,
        LifecycleState::Unloaded,
        LifecycleState::Error,
    ] {
        let mut fresh = DependencyGraph::new();
        fresh.add_or_update(id("a"), &[id("b")]);
        fresh.add_or_update(id("b"), &[]);
        fresh.set_state(&id("b"), state);
        assert!(
            !fresh.is_dependency_satisfied(&id("a")),
            "state {:?} should disqualify",
            state
        );
    }
}

#[test]
fn add_or_update_is_idempotent() {
    let mut graph = DependencyGraph::new();
    graph.add_or_update(id("a"), &[id("b"), id("c")]);
    graph.add_or_update(id("a"), &[id("b"), id("c")]);

    assert_eq!(graph.len(), 3);
    let node = graph.node(&id("a")).unwrap();
    assert_eq!(node.dependencies(), &[id("b"), id("c")]);
}

#[test]
fn re_adding_merges_new_edges() {
    let mut graph = DependencyGraph::new();
    graph.add_or_update(id("a"), &[id("b")]);
    graph.add_or_update(id("a"), &[id("c")]);

    let node = graph.node(&id("a")).unwrap();
    assert_eq!(node.dependencies(), &[id("b"), id("c")]);
}

#[test]
fn re_adding_does_not_reset_state() {
    let mut graph = DependencyGraph::new();
    graph.add_or_update(id("a"), &[]);
    graph.set_state(&id("a"), LifecycleState::Loaded);
    graph.add_or_update(id("a"), &[]);
    assert_eq!(graph.state(&id("a")), Some(LifecycleState::Loaded));
}

#[test]
fn set_state_for_unknown_id_is_a_noop() {
    let mut graph = DependencyGraph::new();
    graph.set_state(&id("ghost"), LifecycleState::Loaded);
    assert!(graph.is_empty());
    assert_eq!(graph.state(&id("ghost")), None);
}

#[test]
fn error_state_is_absorbing() {
    let mut graph = DependencyGraph::new();
    graph.add_or_update(id("a"), &[]);
    graph.set_state(&id("a"), LifecycleState::Loaded);
    graph.set_state(&id("a"), LifecycleState::Error);
    graph.set_state(&id("a"), LifecycleState::Mounted);
    assert_eq!(graph.state(&id("a")), Some(LifecycleState::Error));
}

#[test]
fn graph_ready_when_all_nodes_satisfied() {
    let mut graph = DependencyGraph::new();
    graph.add_or_update(id("a"), &[id("b")]);
    graph.add_or_update(id("b"), &[]);
    graph.set_state(&id("a"), LifecycleState::Loaded);
    graph.set_state(&id("b"), LifecycleState::Loaded);
    assert!(graph.is_graph_ready());
}

#[test]
fn enumeration_order_is_stable() {
    let mut graph = DependencyGraph::new();
    graph.add_or_update(id("c"), &[]);
    graph.add_or_update(id("a"), &[id("d")]);
    graph.add_or_update(id("b"), &[]);

    // d materialized as a placeholder while adding a
    assert_eq!(graph.ids(), vec![id("c"), id("a"), id("d"), id("b")]);
    let iterated: Vec<_> = graph.iter().map(|node| node.id().clone()).collect();
    assert_eq!(iterated, graph.ids());
}

#[test]
fn clear_is_idempotent() {
    let mut graph = DependencyGraph::new();
    graph.add_or_update(id("a"), &[id("b")]);
    graph.clear();
    assert!(graph.is_empty());
    graph.clear();
    assert!(graph.is_empty());
}
