//! Node Engine - Graph model and node-type registry for Skein
//!
//! This crate is the foundation of the Skein execution subsystem. It
//! covers:
//!
//! - The workflow graph data model (nodes, edges, handle data types)
//! - Graph algorithms: cycle detection, topological ordering, upstream
//!   closure for partial runs, and pure output propagation
//! - The declarative node-type registry: handles, parameter variants,
//!   generated input validators, and cost estimation
//! - Whole-graph validation
//! - Run event streaming via [`EventSink`]
//!
//! # Architecture
//!
//! Registries are explicit instances constructed at startup and injected
//! into the orchestrator; nothing here is a process-wide singleton.
//! Built-in node configs from the catalog crate register themselves at
//! link time via [`ConfigFn`] and are collected by
//! [`NodeRegistry::with_builtin`].

pub mod builder;
pub mod config;
pub mod error;
pub mod events;
pub mod graph;
pub mod registry;
pub mod schema;
pub mod types;
pub mod validation;

// Re-export key types
pub use builder::WorkflowBuilder;
pub use config::{
    CostConfig, CostInput, HandleDefinition, NodeCategory, NodeConfig, Parameter, ParameterKind,
    ResolvedHandle,
};
pub use error::{NodeEngineError, Result};
pub use events::{ChannelEventSink, EventError, EventSink, NullEventSink, RunEvent, VecEventSink};
pub use graph::{detect_cycle, execution_subset, propagate, topological_sort, Propagation};
pub use registry::{ConfigFn, NodeRegistry};
pub use schema::{InputSchema, SchemaViolation};
pub use types::{
    is_valid_connection, EdgeId, GraphEdge, GraphNode, HandleDataType, HandleId, NodeId,
    WorkflowGraph,
};
pub use validation::{validate_workflow, ValidationError};
