//! Core types for workflow graphs
//!
//! These types define the structure of workflow graphs as the editor
//! produces them: nodes, edges, and the handle data types that govern
//! which connections are legal.

use serde::{Deserialize, Serialize};

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for an edge
pub type EdgeId = String;

/// Unique identifier for a handle (input or output port on a node)
pub type HandleId = String;

/// The data type carried by a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleDataType {
    /// Plain text
    Text,
    /// Image reference (URL or data URI)
    Image,
    /// Video reference
    Video,
    /// Audio reference
    Audio,
    /// Numeric value
    Number,
    /// Boolean value
    Boolean,
    /// Arbitrary JSON object
    Json,
    /// Generic file reference
    File,
}

impl HandleDataType {
    /// All handle data types, in declaration order.
    pub const ALL: [HandleDataType; 8] = [
        Self::Text,
        Self::Image,
        Self::Video,
        Self::Audio,
        Self::Number,
        Self::Boolean,
        Self::Json,
        Self::File,
    ];

    /// Target types a handle of this type may connect to.
    ///
    /// The current policy is a direct match, but the rules stay
    /// table-driven so a widening (e.g. number -> text coercion) is a
    /// local change here rather than a scattered condition.
    pub fn allowed_targets(&self) -> &'static [HandleDataType] {
        match self {
            Self::Text => &[Self::Text],
            Self::Image => &[Self::Image],
            Self::Video => &[Self::Video],
            Self::Audio => &[Self::Audio],
            Self::Number => &[Self::Number],
            Self::Boolean => &[Self::Boolean],
            Self::Json => &[Self::Json],
            Self::File => &[Self::File],
        }
    }

    /// Check whether an edge from this type into `target` is legal.
    pub fn can_connect_to(&self, target: &HandleDataType) -> bool {
        self.allowed_targets().contains(target)
    }
}

/// Check whether a source handle type may connect to a target handle type.
///
/// Rejected connections are refused outright (at edit time and again at
/// run time), never silently dropped.
pub fn is_valid_connection(source: HandleDataType, target: HandleDataType) -> bool {
    source.can_connect_to(&target)
}

/// A node instance in a graph
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// Unique identifier for this node instance
    pub id: NodeId,
    /// Node type (references a registered NodeConfig)
    pub node_type: String,
    /// Parameter values and runtime fields for this instance
    #[serde(default)]
    pub data: serde_json::Value,
}

impl GraphNode {
    /// Create a node with empty data
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            data: serde_json::Value::Null,
        }
    }

    /// Read a value from this node's data map
    pub fn data_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.as_object().and_then(|obj| obj.get(key))
    }

    /// Write a value into this node's data map, creating it if absent
    pub fn set_data_value(&mut self, key: impl Into<String>, value: serde_json::Value) {
        if !self.data.is_object() {
            self.data = serde_json::Value::Object(serde_json::Map::new());
        }
        if let Some(obj) = self.data.as_object_mut() {
            obj.insert(key.into(), value);
        }
    }
}

/// An edge connecting a source handle to a target handle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    /// Unique identifier for this edge
    pub id: EdgeId,
    /// Source node ID
    pub source: NodeId,
    /// Source handle ID
    pub source_handle: HandleId,
    /// Target node ID
    pub target: NodeId,
    /// Target handle ID
    pub target_handle: HandleId,
}

/// A complete workflow graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowGraph {
    /// Unique identifier for this graph
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Nodes in the graph
    pub nodes: Vec<GraphNode>,
    /// Edges connecting nodes
    pub edges: Vec<GraphEdge>,
}

impl WorkflowGraph {
    /// Create a new empty graph
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Find a node by ID
    pub fn find_node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Find a node by ID (mutable)
    pub fn find_node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Get edges coming into a node, in declaration order
    pub fn incoming_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| e.target == node_id)
    }

    /// Get edges going out of a node, in declaration order
    pub fn outgoing_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| e.source == node_id)
    }

    /// IDs of nodes this node depends on (upstream neighbors)
    pub fn dependencies(&self, node_id: &str) -> Vec<NodeId> {
        self.incoming_edges(node_id).map(|e| e.source.clone()).collect()
    }

    /// IDs of nodes that depend on this node (downstream neighbors)
    pub fn dependents(&self, node_id: &str) -> Vec<NodeId> {
        self.outgoing_edges(node_id).map(|e| e.target.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_match_connections() {
        assert!(is_valid_connection(HandleDataType::Text, HandleDataType::Text));
        assert!(is_valid_connection(HandleDataType::Image, HandleDataType::Image));
        assert!(!is_valid_connection(HandleDataType::Text, HandleDataType::Image));
        assert!(!is_valid_connection(HandleDataType::Number, HandleDataType::Text));
    }

    #[test]
    fn test_every_type_connects_to_itself() {
        for ty in HandleDataType::ALL {
            assert!(ty.can_connect_to(&ty), "{:?} must connect to itself", ty);
        }
    }

    #[test]
    fn test_graph_neighbors() {
        let mut graph = WorkflowGraph::new("g1", "Test");
        graph.nodes.push(GraphNode::new("a", "text-input"));
        graph.nodes.push(GraphNode::new("b", "llm"));
        graph.edges.push(GraphEdge {
            id: "e1".into(),
            source: "a".into(),
            source_handle: "text".into(),
            target: "b".into(),
            target_handle: "prompt".into(),
        });

        assert_eq!(graph.dependencies("b"), vec!["a"]);
        assert_eq!(graph.dependents("a"), vec!["b"]);
        assert!(graph.dependencies("a").is_empty());
    }

    #[test]
    fn test_node_data_access() {
        let mut node = GraphNode::new("a", "text-input");
        assert!(node.data_value("value").is_none());

        node.set_data_value("value", serde_json::json!("hello"));
        assert_eq!(node.data_value("value").unwrap(), "hello");

        node.set_data_value("value", serde_json::json!("updated"));
        assert_eq!(node.data_value("value").unwrap(), "updated");
    }

    #[test]
    fn test_serde_round_trip_is_isomorphic() {
        let mut graph = WorkflowGraph::new("wf-1", "Round Trip");
        let mut a = GraphNode::new("a", "text-input");
        a.set_data_value("value", serde_json::json!("hi"));
        graph.nodes.push(a);
        graph.nodes.push(GraphNode::new("b", "llm"));
        graph.edges.push(GraphEdge {
            id: "e1".into(),
            source: "a".into(),
            source_handle: "text".into(),
            target: "b".into(),
            target_handle: "prompt".into(),
        });

        let json = serde_json::to_string(&graph).unwrap();
        let restored: WorkflowGraph = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.id, graph.id);
        assert_eq!(restored.nodes.len(), graph.nodes.len());
        assert_eq!(restored.edges.len(), graph.edges.len());
        for (orig, back) in graph.nodes.iter().zip(&restored.nodes) {
            assert_eq!(orig.id, back.id);
            assert_eq!(orig.node_type, back.node_type);
            assert_eq!(orig.data, back.data);
        }
        for (orig, back) in graph.edges.iter().zip(&restored.edges) {
            assert_eq!(orig.id, back.id);
            assert_eq!(orig.source, back.source);
            assert_eq!(orig.source_handle, back.source_handle);
            assert_eq!(orig.target, back.target);
            assert_eq!(orig.target_handle, back.target_handle);
        }
    }

    #[test]
    fn test_wire_format_uses_camel_case() {
        let edge = GraphEdge {
            id: "e1".into(),
            source: "a".into(),
            source_handle: "text".into(),
            target: "b".into(),
            target_handle: "prompt".into(),
        };
        let json = serde_json::to_value(&edge).unwrap();
        assert!(json.get("sourceHandle").is_some());
        assert!(json.get("targetHandle").is_some());
    }
}
