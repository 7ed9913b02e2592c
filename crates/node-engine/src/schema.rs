//! Structural input validation generated from parameter declarations
//!
//! [`InputSchema`] is built from a node type's declarative parameter list
//! and checks a value map against it: types, length and numeric bounds,
//! enumerated options, and URL-shaped strings for image/file parameters.

use std::collections::HashMap;

use thiserror::Error;

use crate::config::{Parameter, ParameterKind};

/// A single violation found while validating an input map
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaViolation {
    #[error("missing required parameter '{parameter}'")]
    Missing { parameter: String },

    #[error("parameter '{parameter}' has the wrong type: expected {expected}")]
    WrongType {
        parameter: String,
        expected: &'static str,
    },

    #[error("parameter '{parameter}' is too short (minimum {min} characters)")]
    TooShort { parameter: String, min: usize },

    #[error("parameter '{parameter}' is too long (maximum {max} characters)")]
    TooLong { parameter: String, max: usize },

    #[error("parameter '{parameter}' is out of range ({value} not in [{min}, {max}])")]
    OutOfRange {
        parameter: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("parameter '{parameter}' must be one of the configured options, got '{value}'")]
    NotAnOption { parameter: String, value: String },

    #[error("parameter '{parameter}' must be a URL")]
    InvalidUrl { parameter: String },
}

/// A structural validator for one node type's parameters
#[derive(Debug, Clone)]
pub struct InputSchema {
    parameters: Vec<Parameter>,
}

impl InputSchema {
    /// Build a schema from a declarative parameter list
    pub fn from_parameters(parameters: &[Parameter]) -> Self {
        Self {
            parameters: parameters.to_vec(),
        }
    }

    /// Validate a value map, returning every violation found
    pub fn validate(&self, values: &HashMap<String, serde_json::Value>) -> Vec<SchemaViolation> {
        let mut violations = Vec::new();

        for param in &self.parameters {
            let value = values.get(&param.id).filter(|v| !v.is_null());

            let Some(value) = value else {
                // Required parameters have no implicit default; an explicit
                // default satisfies the requirement.
                if param.required && param.default_value.is_none() {
                    violations.push(SchemaViolation::Missing {
                        parameter: param.id.clone(),
                    });
                }
                continue;
            };

            validate_value(param, value, &mut violations);
        }

        violations
    }

    /// Validate and collapse to a single result
    pub fn check(&self, values: &HashMap<String, serde_json::Value>) -> Result<(), Vec<SchemaViolation>> {
        let violations = self.validate(values);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

fn validate_value(param: &Parameter, value: &serde_json::Value, out: &mut Vec<SchemaViolation>) {
    match &param.kind {
        ParameterKind::Text { min_length, max_length } => {
            let Some(text) = value.as_str() else {
                out.push(wrong_type(param, "string"));
                return;
            };
            let len = text.chars().count();
            if let Some(min) = min_length {
                if len < *min {
                    out.push(SchemaViolation::TooShort {
                        parameter: param.id.clone(),
                        min: *min,
                    });
                }
            }
            if let Some(max) = max_length {
                if len > *max {
                    out.push(SchemaViolation::TooLong {
                        parameter: param.id.clone(),
                        max: *max,
                    });
                }
            }
        }
        ParameterKind::Number { min, max } => {
            let Some(number) = value.as_f64() else {
                out.push(wrong_type(param, "number"));
                return;
            };
            check_range(param, number, min.unwrap_or(f64::NEG_INFINITY), max.unwrap_or(f64::INFINITY), out);
        }
        ParameterKind::Select { options } => {
            let Some(choice) = value.as_str() else {
                out.push(wrong_type(param, "string"));
                return;
            };
            if !options.iter().any(|o| o == choice) {
                out.push(SchemaViolation::NotAnOption {
                    parameter: param.id.clone(),
                    value: choice.to_string(),
                });
            }
        }
        ParameterKind::Boolean => {
            if !value.is_boolean() {
                out.push(wrong_type(param, "boolean"));
            }
        }
        ParameterKind::Slider { min, max, .. } => {
            let Some(number) = value.as_f64() else {
                out.push(wrong_type(param, "number"));
                return;
            };
            check_range(param, number, *min, *max, out);
        }
        ParameterKind::Image { multiple } | ParameterKind::File { multiple } => {
            if *multiple {
                match value.as_array() {
                    Some(items) => {
                        for item in items {
                            check_url(param, item, out);
                        }
                    }
                    // A bare URL is accepted for convenience even when
                    // multiple connections are allowed.
                    None => check_url(param, value, out),
                }
            } else {
                check_url(param, value, out);
            }
        }
    }
}

fn wrong_type(param: &Parameter, expected: &'static str) -> SchemaViolation {
    SchemaViolation::WrongType {
        parameter: param.id.clone(),
        expected,
    }
}

fn check_range(param: &Parameter, value: f64, min: f64, max: f64, out: &mut Vec<SchemaViolation>) {
    if value < min || value > max {
        out.push(SchemaViolation::OutOfRange {
            parameter: param.id.clone(),
            value,
            min,
            max,
        });
    }
}

fn check_url(param: &Parameter, value: &serde_json::Value, out: &mut Vec<SchemaViolation>) {
    let Some(url) = value.as_str() else {
        out.push(wrong_type(param, "URL string"));
        return;
    };
    let shaped = url.starts_with("http://")
        || url.starts_with("https://")
        || url.starts_with("data:");
    if !shaped {
        out.push(SchemaViolation::InvalidUrl {
            parameter: param.id.clone(),
        });
    }
}
