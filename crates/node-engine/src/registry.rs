//! Node type registry
//!
//! The registry is the single source of truth for node *types*: their
//! handles, parameters, and cost formulas. Instances are constructed
//! explicitly at startup and passed by reference into the orchestrator;
//! there is no process-wide singleton.
//!
//! Built-in configs from the node catalog register themselves at link time
//! via [`ConfigFn`] and are collected by [`NodeRegistry::with_builtin`].

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::{NodeCategory, NodeConfig};
use crate::schema::InputSchema;

/// Link-time registration of a built-in node config.
///
/// The node catalog submits one of these per built-in type:
///
/// ```ignore
/// inventory::submit!(node_engine::ConfigFn(my_node_config));
/// ```
pub struct ConfigFn(pub fn() -> NodeConfig);

inventory::collect!(ConfigFn);

/// Registry of node types keyed by their `node_type` string
#[derive(Default)]
pub struct NodeRegistry {
    configs: HashMap<String, NodeConfig>,
    /// Inverted index: lowercased token -> node types containing it
    index: BTreeMap<String, BTreeSet<String>>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with all link-time registered
    /// built-in configs
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for entry in inventory::iter::<ConfigFn> {
            registry.register((entry.0)());
        }
        registry
    }

    /// Register a node type.
    ///
    /// Re-registering an existing type overwrites it (last writer wins)
    /// with a warning rather than an error, so catalog reloads stay
    /// idempotent.
    pub fn register(&mut self, config: NodeConfig) {
        if self.configs.contains_key(&config.node_type) {
            log::warn!(
                "node type '{}' registered twice; overwriting previous config",
                config.node_type
            );
        }
        self.configs.insert(config.node_type.clone(), config);
        self.rebuild_index();
    }

    /// Get a node type's config
    pub fn get(&self, node_type: &str) -> Option<&NodeConfig> {
        self.configs.get(node_type)
    }

    /// Check whether a node type is registered
    pub fn has(&self, node_type: &str) -> bool {
        self.configs.contains_key(node_type)
    }

    /// All registered configs
    pub fn all(&self) -> Vec<&NodeConfig> {
        let mut configs: Vec<&NodeConfig> = self.configs.values().collect();
        configs.sort_by(|a, b| a.node_type.cmp(&b.node_type));
        configs
    }

    /// All registered node type strings
    pub fn node_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.configs.keys().map(|s| s.as_str()).collect();
        types.sort_unstable();
        types
    }

    /// Configs in a given category
    pub fn by_category(&self, category: NodeCategory) -> Vec<&NodeConfig> {
        self.all()
            .into_iter()
            .filter(|c| c.category == category)
            .collect()
    }

    /// Search configs by query.
    ///
    /// The query is tokenized the same way the index is built (word-level,
    /// minimum two characters); a node matches when any indexed token
    /// starts with any query token. Prefix matching, no ranking.
    pub fn search(&self, query: &str) -> Vec<&NodeConfig> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Vec::new();
        }

        let mut matched: BTreeSet<&str> = BTreeSet::new();
        for token in &query_tokens {
            for (key, types) in self.index.range(token.clone()..) {
                if !key.starts_with(token.as_str()) {
                    break;
                }
                matched.extend(types.iter().map(|t| t.as_str()));
            }
        }

        matched
            .into_iter()
            .filter_map(|t| self.configs.get(t))
            .collect()
    }

    /// Build a structural input validator for a node type.
    ///
    /// Returns `None` for unregistered types rather than erroring; callers
    /// that have already asserted registration can unwrap.
    pub fn input_schema(&self, node_type: &str) -> Option<InputSchema> {
        self.get(node_type)
            .map(|config| InputSchema::from_parameters(&config.parameters))
    }

    /// Estimate the execution cost of a node type for the given inputs,
    /// in credit units.
    ///
    /// Returns `None` for unregistered types.
    pub fn estimate_cost(
        &self,
        node_type: &str,
        input: &HashMap<String, serde_json::Value>,
    ) -> Option<i64> {
        self.get(node_type)
            .map(|config| config.cost.estimate(&crate::config::CostInput::from_values(input)))
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for config in self.configs.values() {
            let mut tokens = tokenize(&config.label);
            tokens.extend(tokenize(&config.description));
            tokens.extend(tokenize(config.category.as_str()));
            for tag in &config.tags {
                tokens.extend(tokenize(tag));
            }
            for token in tokens {
                self.index
                    .entry(token)
                    .or_default()
                    .insert(config.node_type.clone());
            }
        }
    }
}

/// Split into lowercased word tokens, dropping tokens shorter than two
/// characters.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(|t| t.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CostConfig, HandleDefinition, Parameter, ParameterKind};
    use crate::types::HandleDataType;

    fn test_config(node_type: &str, label: &str, category: NodeCategory) -> NodeConfig {
        NodeConfig {
            node_type: node_type.to_string(),
            label: label.to_string(),
            description: format!("{} node", label),
            category,
            tags: vec![],
            inputs: vec![],
            outputs: vec![HandleDefinition::optional("text", "Text", HandleDataType::Text)],
            parameters: vec![],
            cost: CostConfig::free(),
            default_values: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = NodeRegistry::new();
        registry.register(test_config("text-input", "Text", NodeCategory::Input));

        assert!(registry.has("text-input"));
        assert!(!registry.has("unknown"));
        assert_eq!(registry.get("text-input").unwrap().label, "Text");
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn test_reregister_last_writer_wins() {
        let mut registry = NodeRegistry::new();
        registry.register(test_config("llm", "Original", NodeCategory::Processing));
        registry.register(test_config("llm", "Replacement", NodeCategory::Processing));

        assert_eq!(registry.all().len(), 1);
        assert_eq!(registry.get("llm").unwrap().label, "Replacement");
    }

    #[test]
    fn test_by_category() {
        let mut registry = NodeRegistry::new();
        registry.register(test_config("text-input", "Text", NodeCategory::Input));
        registry.register(test_config("image-input", "Image", NodeCategory::Input));
        registry.register(test_config("llm", "LLM", NodeCategory::Processing));

        assert_eq!(registry.by_category(NodeCategory::Input).len(), 2);
        assert_eq!(registry.by_category(NodeCategory::Processing).len(), 1);
        assert!(registry.by_category(NodeCategory::Output).is_empty());
    }

    #[test]
    fn test_search_prefix_match() {
        let mut registry = NodeRegistry::new();
        let mut config = test_config("image-generation", "Image Generation", NodeCategory::Processing);
        config.tags = vec!["diffusion".into(), "art".into()];
        registry.register(config);
        registry.register(test_config("llm", "Language Model", NodeCategory::Processing));

        // Prefix of an indexed word
        let hits = registry.search("gener");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].node_type, "image-generation");

        // Tag prefix
        assert_eq!(registry.search("diff").len(), 1);

        // Full word from the other config
        assert_eq!(registry.search("language").len(), 1);

        // Shared category token matches both
        assert_eq!(registry.search("processing").len(), 2);

        // Query tokens are prefixes, indexed tokens are not searched as
        // substrings
        assert!(registry.search("eneration").is_empty());
    }

    #[test]
    fn test_search_ignores_short_tokens() {
        let mut registry = NodeRegistry::new();
        registry.register(test_config("llm", "Language Model", NodeCategory::Processing));

        assert!(registry.search("a").is_empty());
        assert!(registry.search("").is_empty());
    }

    #[test]
    fn test_unregistered_type_returns_none() {
        let registry = NodeRegistry::new();
        assert!(registry.input_schema("nope").is_none());
        assert!(registry.estimate_cost("nope", &HashMap::new()).is_none());
    }

    #[test]
    fn test_estimate_cost_megapixel_example() {
        let mut config = test_config("image-generation", "Image Generation", NodeCategory::Processing);
        config.cost = CostConfig {
            base: 50_000,
            per_megapixel: Some(10_000),
            ..CostConfig::default()
        };
        let mut registry = NodeRegistry::new();
        registry.register(config);

        let mut input = HashMap::new();
        input.insert("width".to_string(), serde_json::json!(1000));
        input.insert("height".to_string(), serde_json::json!(1000));

        assert_eq!(registry.estimate_cost("image-generation", &input), Some(60_000));
    }

    #[test]
    fn test_input_schema_from_registry() {
        let mut config = test_config("llm", "LLM", NodeCategory::Processing);
        config.parameters = vec![Parameter::new(
            "prompt",
            "Prompt",
            ParameterKind::Text {
                min_length: Some(1),
                max_length: None,
            },
        )
        .required()];
        let mut registry = NodeRegistry::new();
        registry.register(config);

        let schema = registry.input_schema("llm").unwrap();
        let violations = schema.validate(&HashMap::new());
        assert_eq!(violations.len(), 1);
    }
}
