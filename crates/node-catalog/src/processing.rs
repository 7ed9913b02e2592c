//! Processing node types
//!
//! Generation nodes backed by providers. Cost configs are in credit units
//! (1,000,000 units = 1 credit).

use node_engine::{
    ConfigFn, CostConfig, HandleDataType, HandleDefinition, NodeCategory, NodeConfig, Parameter,
    ParameterKind,
};

/// Large language model call
pub fn llm() -> NodeConfig {
    NodeConfig {
        node_type: "llm".to_string(),
        label: "Language Model".to_string(),
        description: "Generates text from a prompt using a language model".to_string(),
        category: NodeCategory::Processing,
        tags: vec!["llm".to_string(), "text".to_string(), "chat".to_string()],
        inputs: vec![
            HandleDefinition::required("prompt", "Prompt", HandleDataType::Text),
            HandleDefinition::optional("context", "Context", HandleDataType::Text).multiple(),
            HandleDefinition::optional("image", "Images", HandleDataType::Image).multiple(),
        ],
        outputs: vec![HandleDefinition::optional("text", "Text", HandleDataType::Text)],
        parameters: vec![
            Parameter::new(
                "model",
                "Model",
                ParameterKind::Select {
                    options: vec!["fast".to_string(), "balanced".to_string(), "quality".to_string()],
                },
            )
            .with_default(serde_json::json!("balanced")),
            Parameter::new(
                "temperature",
                "Temperature",
                ParameterKind::Slider {
                    min: 0.0,
                    max: 2.0,
                    step: Some(0.1),
                },
            )
            .advanced()
            .with_default(serde_json::json!(0.7)),
            Parameter::new(
                "system",
                "System Prompt",
                ParameterKind::Text {
                    min_length: None,
                    max_length: Some(8_000),
                },
            )
            .advanced()
            .connectable(),
        ],
        cost: CostConfig {
            base: 10_000,
            per_input_token: Some(10),
            ..CostConfig::default()
        },
        default_values: serde_json::Map::new(),
    }
}

inventory::submit!(ConfigFn(llm));

/// Text-to-image generation
pub fn image_generation() -> NodeConfig {
    NodeConfig {
        node_type: "image-generation".to_string(),
        label: "Image Generation".to_string(),
        description: "Generates an image from a text prompt".to_string(),
        category: NodeCategory::Processing,
        tags: vec!["image".to_string(), "diffusion".to_string(), "art".to_string()],
        inputs: vec![
            HandleDefinition::required("prompt", "Prompt", HandleDataType::Text),
            // Reference images accumulate across incoming edges
            HandleDefinition::optional("image", "Reference Images", HandleDataType::Image)
                .multiple(),
        ],
        outputs: vec![HandleDefinition::optional("image", "Image", HandleDataType::Image)],
        parameters: vec![
            Parameter::new(
                "width",
                "Width",
                ParameterKind::Number {
                    min: Some(64.0),
                    max: Some(4096.0),
                },
            )
            .with_default(serde_json::json!(1024)),
            Parameter::new(
                "height",
                "Height",
                ParameterKind::Number {
                    min: Some(64.0),
                    max: Some(4096.0),
                },
            )
            .with_default(serde_json::json!(1024)),
            Parameter::new(
                "steps",
                "Steps",
                ParameterKind::Slider {
                    min: 1.0,
                    max: 50.0,
                    step: Some(1.0),
                },
            )
            .advanced()
            .with_default(serde_json::json!(25)),
        ],
        cost: CostConfig {
            base: 50_000,
            per_megapixel: Some(10_000),
            ..CostConfig::default()
        },
        default_values: serde_json::Map::new(),
    }
}

inventory::submit!(ConfigFn(image_generation));

/// Text/image-to-video generation
pub fn video_generation() -> NodeConfig {
    NodeConfig {
        node_type: "video-generation".to_string(),
        label: "Video Generation".to_string(),
        description: "Generates a short video from a prompt and optional start frame".to_string(),
        category: NodeCategory::Processing,
        tags: vec!["video".to_string(), "animation".to_string()],
        inputs: vec![
            HandleDefinition::required("prompt", "Prompt", HandleDataType::Text),
            HandleDefinition::optional("image", "Start Frame", HandleDataType::Image),
        ],
        outputs: vec![HandleDefinition::optional("video", "Video", HandleDataType::Video)],
        parameters: vec![Parameter::new(
            "duration",
            "Duration (s)",
            ParameterKind::Number {
                min: Some(1.0),
                max: Some(30.0),
            },
        )
        .with_default(serde_json::json!(5))],
        cost: CostConfig {
            base: 200_000,
            per_second: Some(150_000),
            ..CostConfig::default()
        },
        default_values: serde_json::Map::new(),
    }
}

inventory::submit!(ConfigFn(video_generation));

/// Text-to-speech synthesis
pub fn text_to_speech() -> NodeConfig {
    NodeConfig {
        node_type: "text-to-speech".to_string(),
        label: "Text to Speech".to_string(),
        description: "Synthesizes speech audio from text".to_string(),
        category: NodeCategory::Processing,
        tags: vec!["audio".to_string(), "voice".to_string(), "tts".to_string()],
        inputs: vec![HandleDefinition::required("prompt", "Text", HandleDataType::Text)],
        outputs: vec![HandleDefinition::optional("audio", "Audio", HandleDataType::Audio)],
        parameters: vec![Parameter::new(
            "voice",
            "Voice",
            ParameterKind::Select {
                options: vec!["alloy".to_string(), "verse".to_string(), "sage".to_string()],
            },
        )
        .with_default(serde_json::json!("alloy"))],
        cost: CostConfig {
            base: 20_000,
            per_input_token: Some(5),
            ..CostConfig::default()
        },
        default_values: serde_json::Map::new(),
    }
}

inventory::submit!(ConfigFn(text_to_speech));
