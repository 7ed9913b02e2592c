//! Graph algorithms for workflow execution
//!
//! Cycle detection, topological ordering, upstream-closure computation for
//! partial runs, and pure output propagation. All walks are O(V+E) over
//! adjacency lists built from the edge list.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::types::{HandleId, NodeId, WorkflowGraph};
use crate::validation::ValidationError;

/// Detect whether the graph contains a directed cycle.
///
/// Depth-first search with an explicit recursion stack; a back-edge into
/// the stack is a cycle. A node with an edge to itself counts as a
/// one-node cycle.
pub fn detect_cycle(graph: &WorkflowGraph) -> bool {
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for node in &graph.nodes {
        adjacency.entry(&node.id).or_default();
    }
    for edge in &graph.edges {
        adjacency.entry(&edge.source).or_default().push(&edge.target);
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut on_stack: HashSet<&str> = HashSet::new();

    for node in &graph.nodes {
        if !visited.contains(node.id.as_str())
            && dfs_finds_cycle(&node.id, &adjacency, &mut visited, &mut on_stack)
        {
            return true;
        }
    }
    false
}

fn dfs_finds_cycle<'a>(
    node: &'a str,
    adjacency: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    on_stack: &mut HashSet<&'a str>,
) -> bool {
    visited.insert(node);
    on_stack.insert(node);

    if let Some(neighbors) = adjacency.get(node) {
        for &next in neighbors {
            if on_stack.contains(next) {
                return true;
            }
            if !visited.contains(next) && dfs_finds_cycle(next, adjacency, visited, on_stack) {
                return true;
            }
        }
    }

    on_stack.remove(node);
    false
}

/// Compute a topological execution order using Kahn's algorithm.
///
/// The queue is seeded in input node order and drained FIFO, so the result
/// is deterministic for a fixed node order. If fewer nodes come out than
/// went in, the graph contains a cycle and the sort fails; this check is
/// what the orchestrator relies on, independently of [`detect_cycle`].
pub fn topological_sort(graph: &WorkflowGraph) -> Result<Vec<NodeId>, ValidationError> {
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();

    for node in &graph.nodes {
        in_degree.insert(&node.id, 0);
        adjacency.insert(&node.id, Vec::new());
    }
    for edge in &graph.edges {
        if let Some(adj) = adjacency.get_mut(edge.source.as_str()) {
            adj.push(&edge.target);
        }
        if let Some(degree) = in_degree.get_mut(edge.target.as_str()) {
            *degree += 1;
        }
    }

    // Seed in input order, not map order, to keep ties deterministic.
    let mut queue: VecDeque<&str> = graph
        .nodes
        .iter()
        .filter(|n| in_degree.get(n.id.as_str()) == Some(&0))
        .map(|n| n.id.as_str())
        .collect();

    let mut order = Vec::with_capacity(graph.nodes.len());

    while let Some(node) = queue.pop_front() {
        order.push(node.to_string());

        if let Some(neighbors) = adjacency.get(node) {
            for &next in neighbors {
                if let Some(degree) = in_degree.get_mut(next) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(next);
                    }
                }
            }
        }
    }

    if order.len() < graph.nodes.len() {
        return Err(ValidationError::CycleDetected);
    }
    Ok(order)
}

/// Compute the set of nodes required to run `selected`: the selection plus
/// every upstream dependency reachable through incoming edges.
pub fn execution_subset<'a, I>(graph: &WorkflowGraph, selected: I) -> HashSet<NodeId>
where
    I: IntoIterator<Item = &'a NodeId>,
{
    let mut required: HashSet<NodeId> = HashSet::new();
    let mut frontier: VecDeque<NodeId> = selected.into_iter().cloned().collect();

    while let Some(node_id) = frontier.pop_front() {
        if !required.insert(node_id.clone()) {
            continue;
        }
        for edge in graph.incoming_edges(&node_id) {
            if !required.contains(&edge.source) {
                frontier.push_back(edge.source.clone());
            }
        }
    }
    required
}

/// One downstream write produced by propagating a node's outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Propagation {
    /// Node receiving the value
    pub target: NodeId,
    /// Input handle the value lands on
    pub target_handle: HandleId,
    /// The propagated value
    pub value: serde_json::Value,
}

/// Map a node's outputs through its outgoing edges.
///
/// Pure: returns the (target, handle, value) writes without touching the
/// graph, so result distribution stays decoupled from any UI or store.
/// Edges whose source handle has no corresponding output are skipped.
pub fn propagate(
    graph: &WorkflowGraph,
    node_id: &str,
    outputs: &HashMap<HandleId, serde_json::Value>,
) -> Vec<Propagation> {
    let mut writes = Vec::new();
    for edge in graph.outgoing_edges(node_id) {
        match outputs.get(&edge.source_handle) {
            Some(value) => writes.push(Propagation {
                target: edge.target.clone(),
                target_handle: edge.target_handle.clone(),
                value: value.clone(),
            }),
            None => {
                log::debug!(
                    "propagate: node '{}' produced no output for handle '{}' (edge '{}')",
                    node_id,
                    edge.source_handle,
                    edge.id
                );
            }
        }
    }
    writes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::WorkflowBuilder;

    fn diamond() -> WorkflowGraph {
        // a -> b -> d, a -> c -> d
        WorkflowBuilder::new("wf", "Diamond")
            .add_node("a", "text-input")
            .add_node("b", "llm")
            .add_node("c", "llm")
            .add_node("d", "text-output")
            .add_edge("a", "text", "b", "prompt")
            .add_edge("a", "text", "c", "prompt")
            .add_edge("b", "text", "d", "text")
            .add_edge("c", "text", "d", "text")
            .build()
    }

    #[test]
    fn test_detect_cycle_acyclic() {
        assert!(!detect_cycle(&diamond()));
    }

    #[test]
    fn test_detect_cycle_two_nodes() {
        let graph = WorkflowBuilder::new("wf", "Cyclic")
            .add_node("a", "llm")
            .add_node("b", "llm")
            .add_edge("a", "text", "b", "prompt")
            .add_edge("b", "text", "a", "prompt")
            .build();
        assert!(detect_cycle(&graph));
    }

    #[test]
    fn test_detect_cycle_self_loop() {
        let graph = WorkflowBuilder::new("wf", "SelfLoop")
            .add_node("a", "llm")
            .add_edge("a", "text", "a", "prompt")
            .build();
        assert!(detect_cycle(&graph));
    }

    #[test]
    fn test_topological_sort_respects_edges() {
        let graph = diamond();
        let order = topological_sort(&graph).unwrap();
        assert_eq!(order.len(), 4);

        let pos = |id: &str| order.iter().position(|n| n == id).unwrap();
        for edge in &graph.edges {
            assert!(
                pos(&edge.source) < pos(&edge.target),
                "edge {} -> {} violated",
                edge.source,
                edge.target
            );
        }
    }

    #[test]
    fn test_topological_sort_is_deterministic() {
        let graph = diamond();
        let first = topological_sort(&graph).unwrap();
        for _ in 0..5 {
            assert_eq!(topological_sort(&graph).unwrap(), first);
        }
        // Independent roots keep input order
        assert_eq!(first[0], "a");
        assert_eq!(first[1], "b");
        assert_eq!(first[2], "c");
    }

    #[test]
    fn test_topological_sort_rejects_cycle() {
        let graph = WorkflowBuilder::new("wf", "Cyclic")
            .add_node("a", "llm")
            .add_node("b", "llm")
            .add_edge("a", "text", "b", "prompt")
            .add_edge("b", "text", "a", "prompt")
            .build();
        assert!(matches!(
            topological_sort(&graph),
            Err(ValidationError::CycleDetected)
        ));
    }

    #[test]
    fn test_topological_sort_rejects_self_loop() {
        let graph = WorkflowBuilder::new("wf", "SelfLoop")
            .add_node("a", "llm")
            .add_edge("a", "text", "a", "prompt")
            .build();
        assert!(topological_sort(&graph).is_err());
    }

    #[test]
    fn test_execution_subset_includes_upstream() {
        let graph = diamond();
        let selected = vec!["d".to_string()];
        let subset = execution_subset(&graph, &selected);
        assert_eq!(subset.len(), 4);

        let selected = vec!["b".to_string()];
        let subset = execution_subset(&graph, &selected);
        assert!(subset.contains("a"));
        assert!(subset.contains("b"));
        assert!(!subset.contains("c"));
        assert!(!subset.contains("d"));
    }

    #[test]
    fn test_propagate_maps_handles() {
        let graph = diamond();
        let mut outputs = HashMap::new();
        outputs.insert("text".to_string(), serde_json::json!("generated"));

        let writes = propagate(&graph, "a", &outputs);
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].target, "b");
        assert_eq!(writes[0].target_handle, "prompt");
        assert_eq!(writes[0].value, serde_json::json!("generated"));
        assert_eq!(writes[1].target, "c");
    }

    #[test]
    fn test_propagate_skips_missing_outputs() {
        let graph = diamond();
        let outputs = HashMap::new();
        assert!(propagate(&graph, "a", &outputs).is_empty());
    }
}
