//! Guidance rendering for rejected calls.
//!
//! Two renderers produce the human-readable text; [`Diagnostic`] is the
//! machine-readable payload that travels next to it. Output depends only on
//! the inputs, so identical calls render byte-identical text.

use crate::tools::catalog::{display_value, number_value, range_text, ParamKind, ParameterSpec};
use crate::types::rpc_code;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const PLACEHOLDER: &str = "example-value";

// =============================================================================
// Example synthesis
// =============================================================================

/// Type-appropriate value when a spec has neither examples nor a default.
pub fn placeholder_for(spec: &ParameterSpec) -> Value {
    match spec.kind {
        ParamKind::String => Value::from(PLACEHOLDER),
        ParamKind::Number => number_value(spec.constraints().min.unwrap_or(1.0)),
        ParamKind::Boolean => Value::Bool(true),
        ParamKind::Array => Value::Array(vec![Value::from(PLACEHOLDER)]),
        ParamKind::Object => Value::Object(Map::new()),
    }
}

/// Interpret an example string as a value of the spec's kind when it parses
/// as one, else keep it as a string.
fn example_value(spec: &ParameterSpec, example: &str) -> Value {
    match spec.kind {
        ParamKind::String => Value::from(example),
        ParamKind::Number => example
            .trim()
            .parse::<f64>()
            .map(number_value)
            .unwrap_or_else(|_| Value::from(example)),
        ParamKind::Boolean => example
            .trim()
            .parse::<bool>()
            .map(Value::Bool)
            .unwrap_or_else(|_| Value::from(example)),
        ParamKind::Array => match serde_json::from_str::<Value>(example) {
            Ok(v @ Value::Array(_)) => v,
            _ => Value::Array(vec![Value::from(example)]),
        },
        ParamKind::Object => match serde_json::from_str::<Value>(example) {
            Ok(v @ Value::Object(_)) => v,
            _ => Value::from(example),
        },
    }
}

/// Example payload: first example, else default, else a placeholder.
pub fn synthesize_example(missing: &[ParameterSpec]) -> Map<String, Value> {
    let mut payload = Map::new();
    for spec in missing {
        let value = if let Some(first) = spec.examples.first() {
            example_value(spec, first)
        } else if let Some(default) = &spec.default_value {
            default.clone()
        } else {
            placeholder_for(spec)
        };
        payload.insert(spec.name.clone(), value);
    }
    payload
}

// =============================================================================
// Renderers
// =============================================================================

/// Guidance for a call that omitted required parameters.
pub fn render_missing_parameters(
    tool_name: &str,
    missing: &[ParameterSpec],
    suggestions: &[String],
) -> String {
    let mut lines = vec![
        format!("Tool '{}' requires the following parameters:", tool_name),
        String::new(),
    ];

    for param in missing {
        let tag = if param.required { "required" } else { "optional" };
        lines.push(format!("**{}** ({})", param.name, tag));
        lines.push(format!("  {}", param.description));

        if !param.examples.is_empty() {
            lines.push(format!("  Examples: {}", param.examples.join(", ")));
        }
        if let Some(c) = &param.constraints {
            if c.min.is_some() || c.max.is_some() {
                lines.push(format!("  Range: {}", range_text(c)));
            }
            if let Some(options) = &c.allowed_values {
                lines.push(format!("  Valid options: {}", options.join(", ")));
            }
            if let Some(pattern) = &c.pattern {
                lines.push(format!("  Pattern: {}", pattern));
            }
        }
        if let Some(default) = &param.default_value {
            lines.push(format!("  Default: {}", display_value(default)));
        }
        lines.push(String::new());
    }

    let example = Value::Object(synthesize_example(missing));
    lines.push("Example parameters:".to_string());
    lines.push(serde_json::to_string_pretty(&example).unwrap_or_else(|_| example.to_string()));
    lines.push(String::new());

    if !suggestions.is_empty() {
        lines.extend(suggestions.iter().cloned());
        lines.push(String::new());
    }

    lines.push("Please provide these parameters and try again.".to_string());
    lines.join("\n")
}

/// Guidance for a call whose parameters were present but invalid.
pub fn render_invalid_values(tool_name: &str, errors: &[String]) -> String {
    let mut lines = vec![
        format!("Tool '{}' parameter validation failed:", tool_name),
        String::new(),
    ];
    for error in errors {
        lines.push(format!("  • {}", error));
    }
    lines.push(String::new());
    lines.push("Please correct the parameters and try again.".to_string());
    lines.join("\n")
}

// =============================================================================
// Structured payload
// =============================================================================

/// Why a call was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    UnknownTool,
    MissingRequiredParameter,
    InvalidParameterValue,
    ExecutionFailure,
}

impl DiagnosticCode {
    /// JSON-RPC error code. Both parameter codes share INVALID_PARAMS.
    pub fn rpc_code(self) -> i64 {
        match self {
            DiagnosticCode::UnknownTool => rpc_code::METHOD_NOT_FOUND,
            DiagnosticCode::MissingRequiredParameter | DiagnosticCode::InvalidParameterValue => {
                rpc_code::INVALID_PARAMS
            }
            DiagnosticCode::ExecutionFailure => rpc_code::INTERNAL_ERROR,
        }
    }
}

/// Machine-readable explanation of a rejected or failed call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub tool: String,
    /// Rendered guidance text.
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_parameters: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_parameters: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl Diagnostic {
    fn bare(code: DiagnosticCode, tool: &str, message: String) -> Self {
        Self {
            code,
            tool: tool.to_string(),
            message,
            missing_parameters: Vec::new(),
            validation_errors: Vec::new(),
            suggestions: Vec::new(),
            example_parameters: None,
            available_tools: Vec::new(),
            cause: None,
        }
    }

    /// Build from an invalid validation outcome.
    ///
    /// Missing-parameter guidance takes precedence when both lists are
    /// non-empty; the structured fields always carry both.
    pub fn invalid_input(
        tool: &str,
        missing: &[ParameterSpec],
        errors: &[String],
        suggestions: &[String],
    ) -> Self {
        let (code, message) = if missing.is_empty() {
            (
                DiagnosticCode::InvalidParameterValue,
                render_invalid_values(tool, errors),
            )
        } else {
            (
                DiagnosticCode::MissingRequiredParameter,
                render_missing_parameters(tool, missing, suggestions),
            )
        };

        let mut diagnostic = Self::bare(code, tool, message);
        diagnostic.missing_parameters = missing.iter().map(|p| p.name.clone()).collect();
        diagnostic.validation_errors = errors.to_vec();
        diagnostic.suggestions = suggestions.to_vec();
        if !missing.is_empty() {
            diagnostic.example_parameters = Some(Value::Object(synthesize_example(missing)));
        }
        diagnostic
    }

    pub fn unknown_tool(tool: &str, message: String, available: &[String]) -> Self {
        let mut diagnostic = Self::bare(DiagnosticCode::UnknownTool, tool, message);
        diagnostic.available_tools = available.to_vec();
        diagnostic
    }

    pub fn execution_failure(tool: &str, message: String, cause: &str) -> Self {
        let mut diagnostic = Self::bare(DiagnosticCode::ExecutionFailure, tool, message);
        diagnostic.cause = Some(cause.to_string());
        diagnostic
    }
}

// =============================================================================
// Tests
// =============================================================================
