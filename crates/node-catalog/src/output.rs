//! Output node types
//!
//! Sink nodes that display or export results. They execute locally at
//! zero cost; no provider is involved.

use node_engine::{
    ConfigFn, CostConfig, HandleDataType, HandleDefinition, NodeCategory, NodeConfig,
};

/// Text display node
pub fn text_output() -> NodeConfig {
    NodeConfig {
        node_type: "text-output".to_string(),
        label: "Text Output".to_string(),
        description: "Displays text produced by upstream nodes".to_string(),
        category: NodeCategory::Output,
        tags: vec!["text".to_string(), "display".to_string()],
        inputs: vec![HandleDefinition::required("text", "Text", HandleDataType::Text)],
        outputs: vec![],
        parameters: vec![],
        cost: CostConfig::free(),
        default_values: serde_json::Map::new(),
    }
}

inventory::submit!(ConfigFn(text_output));

/// Image display node
pub fn image_output() -> NodeConfig {
    NodeConfig {
        node_type: "image-output".to_string(),
        label: "Image Output".to_string(),
        description: "Displays an image produced by upstream nodes".to_string(),
        category: NodeCategory::Output,
        tags: vec!["image".to_string(), "display".to_string()],
        inputs: vec![HandleDefinition::required("image", "Image", HandleDataType::Image)],
        outputs: vec![],
        parameters: vec![],
        cost: CostConfig::free(),
        default_values: serde_json::Map::new(),
    }
}

inventory::submit!(ConfigFn(image_output));
