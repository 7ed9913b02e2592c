//! Node catalog
//!
//! Built-in node-type configurations for the Skein workflow engine, one
//! module per category. Each config is plain data: the same shapes load
//! from catalog JSON at startup, so deployments can extend or override
//! the built-ins without code changes.
//!
//! Every built-in submits a [`node_engine::ConfigFn`] via `inventory`, so
//! `NodeRegistry::with_builtin()` picks them all up at link time.

pub mod input;
pub mod output;
pub mod processing;

use node_engine::{NodeConfig, NodeRegistry};

/// Register every built-in node type into a registry.
///
/// Equivalent to `NodeRegistry::with_builtin()` but usable on an existing
/// registry, e.g. before layering deployment-specific configs on top.
pub fn register_builtin(registry: &mut NodeRegistry) {
    for entry in inventory::iter::<node_engine::ConfigFn> {
        registry.register((entry.0)());
    }
}

/// Parse node configs from catalog JSON (an array of config objects).
pub fn load_configs(json: &str) -> Result<Vec<NodeConfig>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Register configs parsed from catalog JSON, overriding any built-ins
/// with the same type.
pub fn register_from_json(registry: &mut NodeRegistry, json: &str) -> Result<usize, serde_json::Error> {
    let configs = load_configs(json)?;
    let count = configs.len();
    for config in configs {
        registry.register(config);
    }
    Ok(count)
}
