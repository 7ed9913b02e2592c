//! Whole-graph validation
//!
//! Validates graph structure before execution: edge references, cycles,
//! node types, handle type compatibility, and required connections.
//! All errors are collected, not just the first; the editor surfaces the
//! full list, and the orchestrator refuses to run on any of them.

use std::collections::HashSet;

use thiserror::Error;

use crate::graph::topological_sort;
use crate::registry::NodeRegistry;
use crate::types::{HandleDataType, WorkflowGraph};

/// Validation error with location context
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("workflow graph contains a cycle")]
    CycleDetected,

    #[error("node '{node_id}' has unregistered type '{node_type}'")]
    UnknownNodeType { node_id: String, node_type: String },

    #[error("edge '{edge_id}' references unknown node '{node_id}'")]
    UnknownNode { edge_id: String, node_id: String },

    #[error("edge '{edge_id}' references unknown handle '{handle}' on node '{node_id}'")]
    UnknownHandle {
        edge_id: String,
        node_id: String,
        handle: String,
    },

    #[error("edge '{edge_id}' connects incompatible types: {source_type:?} -> {target_type:?}")]
    IncompatibleHandleTypes {
        edge_id: String,
        source_type: HandleDataType,
        target_type: HandleDataType,
    },

    #[error("required input '{handle}' on node '{node_id}' is not connected")]
    MissingRequiredInput { node_id: String, handle: String },
}

/// Validate a workflow graph.
///
/// Structural checks (edge references, cycles) always run; type-level
/// checks (node types, handle compatibility, required inputs) need a
/// registry. Returns every error found.
pub fn validate_workflow(
    graph: &WorkflowGraph,
    registry: Option<&NodeRegistry>,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_edge_references(graph, &mut errors);

    if topological_sort(graph).is_err() {
        errors.push(ValidationError::CycleDetected);
    }

    if let Some(registry) = registry {
        validate_node_types(graph, registry, &mut errors);
        validate_edge_types(graph, registry, &mut errors);
        validate_required_inputs(graph, registry, &mut errors);
    }

    errors
}

/// Check that all edge source/target nodes exist
fn validate_edge_references(graph: &WorkflowGraph, errors: &mut Vec<ValidationError>) {
    let node_ids: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();

    for edge in &graph.edges {
        if !node_ids.contains(edge.source.as_str()) {
            errors.push(ValidationError::UnknownNode {
                edge_id: edge.id.clone(),
                node_id: edge.source.clone(),
            });
        }
        if !node_ids.contains(edge.target.as_str()) {
            errors.push(ValidationError::UnknownNode {
                edge_id: edge.id.clone(),
                node_id: edge.target.clone(),
            });
        }
    }
}

/// Check that every node's type is registered
fn validate_node_types(
    graph: &WorkflowGraph,
    registry: &NodeRegistry,
    errors: &mut Vec<ValidationError>,
) {
    for node in &graph.nodes {
        if !registry.has(&node.node_type) {
            errors.push(ValidationError::UnknownNodeType {
                node_id: node.id.clone(),
                node_type: node.node_type.clone(),
            });
        }
    }
}

/// Check handle existence and type compatibility for every edge.
///
/// Runs again at execution time as defense in depth; the editor already
/// refuses incompatible connections before creating them.
fn validate_edge_types(
    graph: &WorkflowGraph,
    registry: &NodeRegistry,
    errors: &mut Vec<ValidationError>,
) {
    for edge in &graph.edges {
        let source_config = graph
            .find_node(&edge.source)
            .and_then(|n| registry.get(&n.node_type));
        let target_config = graph
            .find_node(&edge.target)
            .and_then(|n| registry.get(&n.node_type));

        // Unknown nodes/types already reported by the earlier passes.
        let (Some(source_config), Some(target_config)) = (source_config, target_config) else {
            continue;
        };

        let Some(source_type) = source_config.resolve_output_handle(&edge.source_handle) else {
            errors.push(ValidationError::UnknownHandle {
                edge_id: edge.id.clone(),
                node_id: edge.source.clone(),
                handle: edge.source_handle.clone(),
            });
            continue;
        };
        let Some(target) = target_config.resolve_input_handle(&edge.target_handle) else {
            errors.push(ValidationError::UnknownHandle {
                edge_id: edge.id.clone(),
                node_id: edge.target.clone(),
                handle: edge.target_handle.clone(),
            });
            continue;
        };

        if !source_type.can_connect_to(&target.data_type) {
            errors.push(ValidationError::IncompatibleHandleTypes {
                edge_id: edge.id.clone(),
                source_type,
                target_type: target.data_type,
            });
        }
    }
}

/// Check that required input handles are connected or carry a value
fn validate_required_inputs(
    graph: &WorkflowGraph,
    registry: &NodeRegistry,
    errors: &mut Vec<ValidationError>,
) {
    let connected: HashSet<(&str, &str)> = graph
        .edges
        .iter()
        .map(|e| (e.target.as_str(), e.target_handle.as_str()))
        .collect();

    for node in &graph.nodes {
        let Some(config) = registry.get(&node.node_type) else {
            continue;
        };
        for handle in &config.inputs {
            if !handle.required {
                continue;
            }
            let is_connected = connected.contains(&(node.id.as_str(), handle.id.as_str()));
            let has_value = node.data_value(&handle.id).is_some()
                || config.default_values.contains_key(&handle.id);

            if !is_connected && !has_value {
                errors.push(ValidationError::MissingRequiredInput {
                    node_id: node.id.clone(),
                    handle: handle.id.clone(),
                });
            }
        }
    }
}
