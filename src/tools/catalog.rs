//! Tool catalog types — declarative parameter specs, tool definitions,
//! enriched JSON schemas.
//!
//! Every tool declares its parameters explicitly as a list of
//! [`ParameterSpec`]s at registration time. Nothing is inferred from handler
//! code, so the same list drives validation, diagnostics and `tools/list`.

use crate::types::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

// =============================================================================
// Parameter kinds
// =============================================================================

/// Declared type of a parameter.
///
/// Closed set: a tool cannot declare a kind the validator does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamKind {
    /// Whether a JSON value has this kind (constraints not considered).
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
            ParamKind::Array => value.is_array(),
            ParamKind::Object => value.is_object(),
        }
    }

    /// Human-readable type name, also the JSON Schema `type`.
    pub fn display_name(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
            ParamKind::Array => "array",
            ParamKind::Object => "object",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Name of a JSON value's type, as used in validation messages.
pub fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// JSON number, written as an integer when it has no fractional part.
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Render a JSON value for prose: strings unquoted, everything else as JSON.
pub fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// =============================================================================
// Constraints
// =============================================================================

/// Validation constraints for one parameter.
///
/// `min`/`max` bound the value of numbers and the length of strings and
/// arrays. Both bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Numbers must be whole.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub integer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.min.is_none()
            && self.max.is_none()
            && !self.integer
            && self.pattern.is_none()
            && self.allowed_values.is_none()
    }
}

// =============================================================================
// Parameter spec
// =============================================================================

/// Declarative description of one input field.
///
/// Invariant: a parameter with a `default_value` is never required. The
/// builder enforces it and the registry re-checks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSpec {
    /// Dotted path for nested fields (`a.b`).
    pub name: String,
    pub description: String,
    pub required: bool,
    #[serde(rename = "type")]
    pub kind: ParamKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,
}

impl ParameterSpec {
    fn new(name: &str, kind: ParamKind, description: &str, required: bool) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            required,
            kind,
            default_value: None,
            examples: Vec::new(),
            constraints: None,
        }
    }

    pub fn required(name: &str, kind: ParamKind, description: &str) -> Self {
        Self::new(name, kind, description, true)
    }

    pub fn optional(name: &str, kind: ParamKind, description: &str) -> Self {
        Self::new(name, kind, description, false)
    }

    /// Set a default. Makes the parameter optional.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self.required = false;
        self
    }

    pub fn with_examples(mut self, examples: &[&str]) -> Self {
        self.examples = examples.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_range(self, min: f64, max: f64) -> Self {
        self.with_min(min).with_max(max)
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.constraints_mut().min = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.constraints_mut().max = Some(max);
        self
    }

    /// Whole numbers only.
    pub fn integer(mut self) -> Self {
        self.constraints_mut().integer = true;
        self
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.constraints_mut().pattern = Some(pattern.to_string());
        self
    }

    pub fn with_allowed_values(mut self, values: &[&str]) -> Self {
        self.constraints_mut().allowed_values =
            Some(values.iter().map(|s| s.to_string()).collect());
        self
    }

    fn constraints_mut(&mut self) -> &mut Constraints {
        self.constraints.get_or_insert_with(Constraints::default)
    }

    /// Constraints, or an empty set.
    pub fn constraints(&self) -> Constraints {
        self.constraints.clone().unwrap_or_default()
    }

    fn is_integer(&self) -> bool {
        self.constraints.as_ref().is_some_and(|c| c.integer)
    }

    /// JSON Schema `type` for this parameter.
    pub fn json_type(&self) -> &'static str {
        if self.kind == ParamKind::Number && self.is_integer() {
            "integer"
        } else {
            self.kind.display_name()
        }
    }

    /// Description with examples, constraints and default appended inline.
    pub fn enriched_description(&self) -> String {
        let mut parts = Vec::new();
        if !self.examples.is_empty() {
            parts.push(format!("Examples: {}", self.examples.join(", ")));
        }
        if let Some(c) = &self.constraints {
            if c.min.is_some() || c.max.is_some() {
                parts.push(format!("Range: {}", range_text(c)));
            }
            if let Some(values) = &c.allowed_values {
                parts.push(format!("Valid options: {}", values.join(", ")));
            }
            if let Some(pattern) = &c.pattern {
                parts.push(format!("Pattern: {}", pattern));
            }
        }
        if let Some(default) = &self.default_value {
            parts.push(format!("Default: {}", display_value(default)));
        }

        if parts.is_empty() {
            self.description.clone()
        } else {
            format!("{} ({})", self.description, parts.join("; "))
        }
    }

    /// JSON Schema property object for this parameter.
    pub fn to_json_schema(&self) -> Value {
        let mut prop = Map::new();
        prop.insert("type".into(), Value::from(self.json_type()));
        prop.insert("description".into(), Value::from(self.enriched_description()));

        if let Some(c) = &self.constraints {
            let (min_key, max_key) = match self.kind {
                ParamKind::Number => ("minimum", "maximum"),
                ParamKind::String => ("minLength", "maxLength"),
                ParamKind::Array => ("minItems", "maxItems"),
                ParamKind::Boolean | ParamKind::Object => ("", ""),
            };
            if !min_key.is_empty() {
                if let Some(min) = c.min {
                    prop.insert(min_key.into(), number_value(min));
                }
                if let Some(max) = c.max {
                    prop.insert(max_key.into(), number_value(max));
                }
            }
            if let Some(values) = &c.allowed_values {
                prop.insert("enum".into(), Value::from(values.clone()));
            }
            if let Some(pattern) = &c.pattern {
                prop.insert("pattern".into(), Value::from(pattern.clone()));
            }
        }
        if let Some(default) = &self.default_value {
            prop.insert("default".into(), default.clone());
        }

        Value::Object(prop)
    }
}

/// `"1 to 1440"`, with `any` standing in for an open bound.
pub fn range_text(c: &Constraints) -> String {
    let bound = |b: Option<f64>| b.map_or_else(|| "any".to_string(), |n| n.to_string());
    format!("{} to {}", bound(c.min), bound(c.max))
}

// =============================================================================
// Handlers
// =============================================================================

/// Executable half of a tool. Receives the coerced, default-filled input.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, input: Map<String, Value>) -> Result<Value>;
}

/// Adapter turning an async closure into a [`ToolHandler`].
pub struct FnHandler<F>(F);

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnHandler")
    }
}

#[async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(Map<String, Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    async fn call(&self, input: Map<String, Value>) -> Result<Value> {
        (self.0)(input).await
    }
}

/// Wrap an async closure as a shareable handler.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn ToolHandler>
where
    F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

// =============================================================================
// Tool definition
// =============================================================================

/// A named, schema-described operation with an executable handler.
#[derive(Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
    pub handler: Arc<dyn ToolHandler>,
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

impl ToolDefinition {
    pub fn new(
        name: &str,
        description: &str,
        parameters: Vec<ParameterSpec>,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
            handler,
        }
    }

    /// Find a parameter spec by exact name.
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// JSON Schema object with every spec's documentation embedded.
    ///
    /// `required` is omitted when no parameter is required.
    pub fn enriched_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for spec in &self.parameters {
            properties.insert(spec.name.clone(), spec.to_json_schema());
            if spec.required {
                required.push(Value::from(spec.name.clone()));
            }
        }

        let mut schema = Map::new();
        schema.insert("type".into(), Value::from("object"));
        schema.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".into(), Value::Array(required));
        }
        Value::Object(schema)
    }
}

// =============================================================================
// Tests
// =============================================================================
