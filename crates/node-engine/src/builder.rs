//! Fluent builder for workflow graphs
//!
//! Used by tests and demos to construct graphs programmatically without
//! hand-writing node and edge structs.

use crate::types::{GraphEdge, GraphNode, WorkflowGraph};

/// Fluent builder for constructing workflow graphs
///
/// # Example
///
/// ```
/// use node_engine::WorkflowBuilder;
///
/// let graph = WorkflowBuilder::new("wf-1", "My Workflow")
///     .add_node("input-1", "text-input")
///     .with_data(serde_json::json!({"value": "Hello"}))
///     .add_node("llm-1", "llm")
///     .add_edge("input-1", "text", "llm-1", "prompt")
///     .build();
///
/// assert_eq!(graph.nodes.len(), 2);
/// ```
pub struct WorkflowBuilder {
    id: String,
    name: String,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    edge_counter: usize,
}

impl WorkflowBuilder {
    /// Create a new builder
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            edge_counter: 0,
        }
    }

    /// Add a node
    pub fn add_node(mut self, id: impl Into<String>, node_type: impl Into<String>) -> Self {
        self.nodes.push(GraphNode::new(id, node_type));
        self
    }

    /// Set data on the most recently added node
    ///
    /// Must be called immediately after `add_node`.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.data = data;
        }
        self
    }

    /// Add an edge between two handles (auto-generates the edge ID)
    pub fn add_edge(
        mut self,
        source: impl Into<String>,
        source_handle: impl Into<String>,
        target: impl Into<String>,
        target_handle: impl Into<String>,
    ) -> Self {
        self.edge_counter += 1;
        self.edges.push(GraphEdge {
            id: format!("edge-{}", self.edge_counter),
            source: source.into(),
            source_handle: source_handle.into(),
            target: target.into(),
            target_handle: target_handle.into(),
        });
        self
    }

    /// Add an edge with an explicit ID
    pub fn add_edge_with_id(
        mut self,
        edge_id: impl Into<String>,
        source: impl Into<String>,
        source_handle: impl Into<String>,
        target: impl Into<String>,
        target_handle: impl Into<String>,
    ) -> Self {
        self.edges.push(GraphEdge {
            id: edge_id.into(),
            source: source.into(),
            source_handle: source_handle.into(),
            target: target.into(),
            target_handle: target_handle.into(),
        });
        self
    }

    /// Build the graph without validation
    pub fn build(self) -> WorkflowGraph {
        let mut graph = WorkflowGraph::new(self.id, self.name);
        graph.nodes = self.nodes;
        graph.edges = self.edges;
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_produces_graph() {
        let graph = WorkflowBuilder::new("wf", "Test")
            .add_node("a", "text-input")
            .with_data(serde_json::json!({"value": "hi"}))
            .add_node("b", "llm")
            .add_edge("a", "text", "b", "prompt")
            .build();

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].id, "edge-1");
        assert_eq!(graph.find_node("a").unwrap().data_value("value").unwrap(), "hi");
    }

    #[test]
    fn test_explicit_edge_id() {
        let graph = WorkflowBuilder::new("wf", "Test")
            .add_node("a", "text-input")
            .add_node("b", "llm")
            .add_edge_with_id("my-edge", "a", "text", "b", "prompt")
            .build();

        assert_eq!(graph.edges[0].id, "my-edge");
    }
}
