//! Declarative node-type configuration
//!
//! A [`NodeConfig`] is the single source of truth for a node type: its
//! input/output handles, its configurable parameters, and its cost formula.
//! Configs are plain data: they deserialize from the node-type catalog
//! JSON and are registered once at startup.

use serde::{Deserialize, Serialize};

use crate::types::HandleDataType;

/// Category of a node, used for palette grouping and execution dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    /// Source nodes carrying literal values (text, image)
    Input,
    /// Generation/transformation nodes backed by providers
    Processing,
    /// Sink nodes that display or export results
    Output,
    /// Control-flow nodes
    Control,
}

impl NodeCategory {
    /// Stable lowercase name, matching the wire format
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Processing => "processing",
            Self::Output => "output",
            Self::Control => "control",
        }
    }
}

/// Definition of a handle (input or output) on a node type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleDefinition {
    /// Handle identifier (referenced by edges)
    pub id: String,
    /// Human-readable label
    pub label: String,
    /// Data type of the handle
    pub data_type: HandleDataType,
    /// Whether this input must be connected or carry a value
    #[serde(default)]
    pub required: bool,
    /// Whether multiple incoming connections accumulate on this handle
    #[serde(default)]
    pub multiple: bool,
}

impl HandleDefinition {
    /// Create a required handle
    pub fn required(id: impl Into<String>, label: impl Into<String>, data_type: HandleDataType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            data_type,
            required: true,
            multiple: false,
        }
    }

    /// Create an optional handle
    pub fn optional(id: impl Into<String>, label: impl Into<String>, data_type: HandleDataType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            data_type,
            required: false,
            multiple: false,
        }
    }

    /// Allow multiple incoming connections on this handle
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }
}

/// The kind of a configurable parameter, as a tagged variant
///
/// Every kind is matched exhaustively when generating validators and cost
/// metadata, so adding a kind is a compile-guided change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParameterKind {
    /// Free text with optional length bounds
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_length: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },
    /// Number with optional bounds
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// One of an enumerated set of options
    Select { options: Vec<String> },
    /// Boolean toggle
    Boolean,
    /// Bounded numeric range
    Slider {
        min: f64,
        max: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        step: Option<f64>,
    },
    /// Image URL, or an array of URLs when `multiple`
    Image {
        #[serde(default)]
        multiple: bool,
    },
    /// File URL, or an array of URLs when `multiple`
    File {
        #[serde(default)]
        multiple: bool,
    },
}

impl ParameterKind {
    /// The handle data type a connectable parameter exposes
    pub fn handle_data_type(&self) -> HandleDataType {
        match self {
            Self::Text { .. } => HandleDataType::Text,
            Self::Number { .. } | Self::Slider { .. } => HandleDataType::Number,
            Self::Select { .. } => HandleDataType::Text,
            Self::Boolean => HandleDataType::Boolean,
            Self::Image { .. } => HandleDataType::Image,
            Self::File { .. } => HandleDataType::File,
        }
    }

    /// Whether the exposed handle accumulates multiple connections
    pub fn accepts_multiple(&self) -> bool {
        matches!(
            self,
            Self::Image { multiple: true } | Self::File { multiple: true }
        )
    }
}

/// A configurable parameter on a node type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    /// Parameter identifier (doubles as the handle ID when connectable)
    pub id: String,
    /// Human-readable label
    pub label: String,
    /// Parameter kind with its validation constraints
    #[serde(flatten)]
    pub kind: ParameterKind,
    /// Whether a value must be present
    #[serde(default)]
    pub required: bool,
    /// Collapsed under "advanced" in the editor
    #[serde(default)]
    pub advanced: bool,
    /// Exposed as a connectable input handle
    #[serde(default)]
    pub connectable: bool,
    /// Default value when the user has not set one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
}

impl Parameter {
    /// Create a parameter of the given kind
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            required: false,
            advanced: false,
            connectable: false,
            default_value: None,
        }
    }

    /// Mark this parameter as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Collapse this parameter under "advanced"
    pub fn advanced(mut self) -> Self {
        self.advanced = true;
        self
    }

    /// Expose this parameter as a connectable input handle
    pub fn connectable(mut self) -> Self {
        self.connectable = true;
        self
    }

    /// Set the default value
    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// Cost formula for a node type, in credit units (1,000,000 units = 1 credit)
///
/// The estimate is `base` plus each configured variable contribution. All
/// arithmetic is integer-only with ceiling division; balances never touch
/// floating point.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostConfig {
    /// Flat cost charged for every execution
    #[serde(default)]
    pub base: i64,
    /// Cost per estimated input token (tokens = ceil(prompt chars / 4))
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_input_token: Option<i64>,
    /// Cost per second of requested output duration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_second: Option<i64>,
    /// Cost per megapixel of requested output area
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_megapixel: Option<i64>,
}

impl CostConfig {
    /// A zero-cost config (input/output nodes)
    pub fn free() -> Self {
        Self::default()
    }

    /// Flat-cost config
    pub fn flat(base: i64) -> Self {
        Self {
            base,
            ..Self::default()
        }
    }

    /// Whether every execution of this type is free
    pub fn is_free(&self) -> bool {
        self.base == 0
            && self.per_input_token.is_none()
            && self.per_second.is_none()
            && self.per_megapixel.is_none()
    }

    /// Estimate the cost of one execution given the gathered inputs.
    ///
    /// The token count is the documented rough heuristic
    /// `ceil(prompt chars / 4)`, not exact tokenization.
    pub fn estimate(&self, input: &CostInput) -> i64 {
        let mut total = self.base;

        if let (Some(per_token), Some(chars)) = (self.per_input_token, input.prompt_chars) {
            let tokens = chars.div_ceil(4) as i64;
            total = total.saturating_add(per_token.saturating_mul(tokens));
        }

        if let (Some(per_second), Some(ms)) = (self.per_second, input.duration_ms) {
            // ceil(per_second * ms / 1000)
            let scaled = per_second.saturating_mul(ms as i64);
            total = total.saturating_add(div_ceil_i64(scaled, 1000));
        }

        if let (Some(per_megapixel), (Some(width), Some(height))) =
            (self.per_megapixel, (input.width, input.height))
        {
            // ceil(per_megapixel * width * height / 1_000_000)
            let pixels = (width as i64).saturating_mul(height as i64);
            let scaled = per_megapixel.saturating_mul(pixels);
            total = total.saturating_add(div_ceil_i64(scaled, 1_000_000));
        }

        total
    }
}

/// Ceiling division for signed integers, matching the semantics of the
/// (currently unstable) `i64::div_ceil`.
fn div_ceil_i64(a: i64, b: i64) -> i64 {
    let q = a / b;
    let r = a % b;
    if (r > 0 && b > 0) || (r < 0 && b < 0) {
        q + 1
    } else {
        q
    }
}

/// Measurable quantities extracted from a node's gathered inputs for
/// cost estimation
#[derive(Debug, Clone, Copy, Default)]
pub struct CostInput {
    /// Length of the prompt text, in characters
    pub prompt_chars: Option<u64>,
    /// Requested output duration, in milliseconds
    pub duration_ms: Option<u64>,
    /// Requested output width, in pixels
    pub width: Option<u64>,
    /// Requested output height, in pixels
    pub height: Option<u64>,
}

impl CostInput {
    /// Extract cost-relevant quantities from a gathered input map.
    ///
    /// Durations arrive as JSON numbers in seconds (possibly fractional)
    /// and are converted once to integer milliseconds here; everything
    /// downstream is integer arithmetic.
    pub fn from_values(input: &std::collections::HashMap<String, serde_json::Value>) -> Self {
        let prompt_chars = input
            .get("prompt")
            .and_then(|v| v.as_str())
            .map(|s| s.chars().count() as u64);
        let duration_ms = input
            .get("duration")
            .and_then(|v| v.as_f64())
            .filter(|s| *s >= 0.0)
            .map(|s| (s * 1000.0).ceil() as u64);
        let width = input.get("width").and_then(|v| v.as_u64());
        let height = input.get("height").and_then(|v| v.as_u64());

        Self {
            prompt_chars,
            duration_ms,
            width,
            height,
        }
    }
}

/// A handle resolved by ID on a node type, whether declared directly or
/// materialized from a connectable parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedHandle {
    /// Data type of the handle
    pub data_type: HandleDataType,
    /// Whether multiple incoming connections accumulate
    pub multiple: bool,
}

/// Complete declaration of a node type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    /// Unique type identifier (e.g. "image-generation")
    pub node_type: String,
    /// Human-readable label
    pub label: String,
    /// Description of what the node does
    pub description: String,
    /// Category for palette grouping and execution dispatch
    pub category: NodeCategory,
    /// Search tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Declared input handles
    #[serde(default)]
    pub inputs: Vec<HandleDefinition>,
    /// Declared output handles
    #[serde(default)]
    pub outputs: Vec<HandleDefinition>,
    /// Configurable parameters
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Cost formula
    #[serde(default)]
    pub cost: CostConfig,
    /// Initial data for freshly created nodes
    #[serde(default)]
    pub default_values: serde_json::Map<String, serde_json::Value>,
}

impl NodeConfig {
    /// Resolve an input handle by ID.
    ///
    /// Declared input handles take precedence; connectable parameters
    /// materialize as optional handles named after the parameter.
    pub fn resolve_input_handle(&self, handle: &str) -> Option<ResolvedHandle> {
        if let Some(h) = self.inputs.iter().find(|h| h.id == handle) {
            return Some(ResolvedHandle {
                data_type: h.data_type,
                multiple: h.multiple,
            });
        }
        self.parameters
            .iter()
            .find(|p| p.connectable && p.id == handle)
            .map(|p| ResolvedHandle {
                data_type: p.kind.handle_data_type(),
                multiple: p.kind.accepts_multiple(),
            })
    }

    /// Resolve an output handle by ID
    pub fn resolve_output_handle(&self, handle: &str) -> Option<HandleDataType> {
        self.outputs
            .iter()
            .find(|h| h.id == handle)
            .map(|h| h.data_type)
    }

    /// Find a parameter by ID
    pub fn parameter(&self, id: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parameter_kind_serde_tagging() {
        let param = Parameter::new(
            "temperature",
            "Temperature",
            ParameterKind::Slider {
                min: 0.0,
                max: 2.0,
                step: Some(0.1),
            },
        );
        let json = serde_json::to_value(&param).unwrap();
        assert_eq!(json["type"], "slider");
        assert_eq!(json["min"], 0.0);

        let back: Parameter = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind, param.kind);
    }

    #[test]
    fn test_cost_estimate_megapixels() {
        let cost = CostConfig {
            base: 50_000,
            per_megapixel: Some(10_000),
            ..CostConfig::default()
        };
        let input = CostInput {
            width: Some(1000),
            height: Some(1000),
            ..CostInput::default()
        };
        assert_eq!(cost.estimate(&input), 60_000);
    }

    #[test]
    fn test_cost_estimate_rounds_up() {
        // 1001x1000 pixels = 1.001 megapixels; contribution must ceil
        let cost = CostConfig {
            base: 0,
            per_megapixel: Some(10_000),
            ..CostConfig::default()
        };
        let input = CostInput {
            width: Some(1001),
            height: Some(1000),
            ..CostInput::default()
        };
        assert_eq!(cost.estimate(&input), 10_010);
    }

    #[test]
    fn test_cost_estimate_tokens() {
        let cost = CostConfig {
            base: 10_000,
            per_input_token: Some(10),
            ..CostConfig::default()
        };
        // 9 chars -> ceil(9/4) = 3 tokens
        let input = CostInput {
            prompt_chars: Some(9),
            ..CostInput::default()
        };
        assert_eq!(cost.estimate(&input), 10_030);
    }

    #[test]
    fn test_cost_estimate_duration() {
        let cost = CostConfig {
            base: 0,
            per_second: Some(150_000),
            ..CostConfig::default()
        };
        let input = CostInput {
            duration_ms: Some(4500),
            ..CostInput::default()
        };
        assert_eq!(cost.estimate(&input), 675_000);
    }

    #[test]
    fn test_cost_input_from_values() {
        let mut values = HashMap::new();
        values.insert("prompt".to_string(), serde_json::json!("hello"));
        values.insert("duration".to_string(), serde_json::json!(2.5));
        values.insert("width".to_string(), serde_json::json!(512));

        let input = CostInput::from_values(&values);
        assert_eq!(input.prompt_chars, Some(5));
        assert_eq!(input.duration_ms, Some(2500));
        assert_eq!(input.width, Some(512));
        assert_eq!(input.height, None);
    }

    #[test]
    fn test_missing_quantities_contribute_nothing() {
        let cost = CostConfig {
            base: 7,
            per_input_token: Some(10),
            per_second: Some(20),
            per_megapixel: Some(30),
        };
        assert_eq!(cost.estimate(&CostInput::default()), 7);
    }

    #[test]
    fn test_resolve_connectable_parameter_as_handle() {
        let config = NodeConfig {
            node_type: "text-input".into(),
            label: "Text".into(),
            description: "Literal text".into(),
            category: NodeCategory::Input,
            tags: vec![],
            inputs: vec![],
            outputs: vec![HandleDefinition::optional("text", "Text", HandleDataType::Text)],
            parameters: vec![Parameter::new(
                "value",
                "Value",
                ParameterKind::Text {
                    min_length: None,
                    max_length: None,
                },
            )
            .connectable()],
            cost: CostConfig::free(),
            default_values: serde_json::Map::new(),
        };

        let handle = config.resolve_input_handle("value").unwrap();
        assert_eq!(handle.data_type, HandleDataType::Text);
        assert!(!handle.multiple);
        assert!(config.resolve_input_handle("unknown").is_none());
        assert_eq!(
            config.resolve_output_handle("text"),
            Some(HandleDataType::Text)
        );
    }

    #[test]
    fn test_multiple_image_parameter_handle() {
        let param = Parameter::new("image", "Images", ParameterKind::Image { multiple: true })
            .connectable();
        assert!(param.kind.accepts_multiple());
        assert_eq!(param.kind.handle_data_type(), HandleDataType::Image);
    }
}
