//! Input node types
//!
//! Source nodes carrying literal values. With no upstream connection they
//! complete the moment a run starts, emitting their stored value; with an
//! upstream connection their value is overwritten by propagation, so the
//! same node doubles as an inline display/edit point mid-pipeline.

use node_engine::{
    ConfigFn, CostConfig, HandleDataType, HandleDefinition, NodeCategory, NodeConfig, Parameter,
    ParameterKind,
};

/// Literal text node
pub fn text_input() -> NodeConfig {
    NodeConfig {
        node_type: "text-input".to_string(),
        label: "Text".to_string(),
        description: "Provides literal text to the workflow".to_string(),
        category: NodeCategory::Input,
        tags: vec!["text".to_string(), "prompt".to_string(), "source".to_string()],
        inputs: vec![],
        outputs: vec![HandleDefinition::optional("text", "Text", HandleDataType::Text)],
        parameters: vec![Parameter::new(
            "value",
            "Value",
            ParameterKind::Text {
                min_length: None,
                max_length: Some(20_000),
            },
        )
        .connectable()],
        cost: CostConfig::free(),
        default_values: serde_json::Map::new(),
    }
}

inventory::submit!(ConfigFn(text_input));

/// Literal image node
pub fn image_input() -> NodeConfig {
    NodeConfig {
        node_type: "image-input".to_string(),
        label: "Image".to_string(),
        description: "Provides an uploaded or linked image to the workflow".to_string(),
        category: NodeCategory::Input,
        tags: vec!["image".to_string(), "source".to_string()],
        inputs: vec![],
        outputs: vec![HandleDefinition::optional("image", "Image", HandleDataType::Image)],
        parameters: vec![Parameter::new(
            "value",
            "Image URL",
            ParameterKind::Image { multiple: false },
        )
        .connectable()],
        cost: CostConfig::free(),
        default_values: serde_json::Map::new(),
    }
}

inventory::submit!(ConfigFn(image_input));
