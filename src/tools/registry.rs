//! Tool registry — ordered, write-once mapping from tool name to definition.
//!
//! Built once at startup, then frozen behind an `Arc` and shared by every
//! dispatch. All declaration mistakes surface from [`ToolRegistry::register`]
//! as configuration errors, never at call time.

use crate::tools::catalog::{ParamKind, ToolDefinition};
use crate::tools::validation::check_default;
use crate::types::{Error, Result};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Entry of `listTools`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Registered tools in registration order.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool definition.
    pub fn register(&mut self, tool: ToolDefinition) -> Result<()> {
        if tool.name.is_empty() {
            return Err(Error::configuration("Tool name cannot be empty"));
        }
        if self.index.contains_key(&tool.name) {
            return Err(Error::configuration(format!(
                "Tool '{}' is already registered",
                tool.name
            )));
        }
        check_parameters(&tool)?;

        tracing::debug!(tool = %tool.name, params = tool.parameters.len(), "Registered tool");
        self.index.insert(tool.name.clone(), self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Get a tool definition by name.
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Check if a tool exists.
    pub fn has_tool(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Tool names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name.clone()).collect()
    }

    /// Iterate definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.iter()
    }

    /// Name, description and enriched schema of every tool.
    pub fn list_tools(&self) -> Vec<ToolSummary> {
        self.tools
            .iter()
            .map(|t| ToolSummary {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.enriched_schema(),
            })
            .collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Registration-time checks on a tool's parameter declarations.
fn check_parameters(tool: &ToolDefinition) -> Result<()> {
    let fail = |msg: String| Error::configuration(format!("Tool '{}': {}", tool.name, msg));
    let mut seen = HashSet::new();

    for spec in &tool.parameters {
        if spec.name.is_empty() {
            return Err(fail("parameter name cannot be empty".to_string()));
        }
        if !seen.insert(spec.name.as_str()) {
            return Err(fail(format!("duplicate parameter '{}'", spec.name)));
        }
        if spec.required && spec.default_value.is_some() {
            return Err(fail(format!(
                "parameter '{}' is required but declares a default",
                spec.name
            )));
        }
        if let Some(c) = &spec.constraints {
            if let (Some(min), Some(max)) = (c.min, c.max) {
                if min > max {
                    return Err(fail(format!(
                        "parameter '{}' has min {} greater than max {}",
                        spec.name, min, max
                    )));
                }
            }
            if let Some(pattern) = &c.pattern {
                if spec.kind != ParamKind::String {
                    return Err(fail(format!(
                        "parameter '{}' declares a pattern but is a {}",
                        spec.name, spec.kind
                    )));
                }
                Regex::new(pattern).map_err(|e| {
                    fail(format!("parameter '{}' has invalid pattern: {}", spec.name, e))
                })?;
            }
            if c.allowed_values.is_some() && spec.kind != ParamKind::String {
                return Err(fail(format!(
                    "parameter '{}' declares allowed values but is a {}",
                    spec.name, spec.kind
                )));
            }
        }
        check_default(spec).map_err(fail)?;
    }

    jsonschema::validator_for(&tool.enriched_schema())
        .map_err(|e| fail(format!("enriched schema does not compile: {}", e)))?;
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::catalog::{handler_fn, ParameterSpec};
    use serde_json::json;

    fn tool(name: &str, parameters: Vec<ParameterSpec>) -> ToolDefinition {
        ToolDefinition::new(
            name,
            "Test tool",
            parameters,
            handler_fn(|_| async { Ok(json!({})) }),
        )
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = ToolRegistry::new();
        registry
            .register(tool("aws_s3_list", vec![ParameterSpec::required("bucket", ParamKind::String, "Bucket")]))
            .unwrap();

        assert!(registry.has_tool("aws_s3_list"));
        assert!(!registry.has_tool("nonexistent"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("aws_s3_list").unwrap().parameters.len(), 1);
    }

    #[test]
    fn test_duplicate_name_is_configuration_error() {
        let mut registry = ToolRegistry::new();
        registry.register(tool("a", vec![])).unwrap();
        let err = registry.register(tool("a", vec![])).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_empty_name_fails() {
        let mut registry = ToolRegistry::new();
        assert!(registry.register(tool("", vec![])).is_err());
    }

    #[test]
    fn test_listing_keeps_registration_order() {
        let mut registry = ToolRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(tool(name, vec![])).unwrap();
        }
        assert_eq!(registry.names(), vec!["zeta", "alpha", "mid"]);
        let listed: Vec<String> = registry.list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(listed, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let mut registry = ToolRegistry::new();
        let params = vec![
            ParameterSpec::required("bucket", ParamKind::String, "a"),
            ParameterSpec::optional("bucket", ParamKind::String, "b"),
        ];
        assert!(registry.register(tool("t", params)).is_err());
    }

    #[test]
    fn test_required_with_default_rejected() {
        let mut spec = ParameterSpec::optional("n", ParamKind::Number, "n").with_default(1);
        spec.required = true;
        let mut registry = ToolRegistry::new();
        let err = registry.register(tool("t", vec![spec])).unwrap_err();
        assert!(err.to_string().contains("required but declares a default"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let spec = ParameterSpec::required("d", ParamKind::String, "d").with_pattern("([");
        let mut registry = ToolRegistry::new();
        assert!(registry.register(tool("t", vec![spec])).is_err());
    }

    #[test]
    fn test_default_outside_range_rejected() {
        let spec = ParameterSpec::optional("n", ParamKind::Number, "n")
            .with_range(1.0, 10.0)
            .with_default(11);
        let mut registry = ToolRegistry::new();
        assert!(registry.register(tool("t", vec![spec])).is_err());
    }

    #[test]
    fn test_list_tools_schema() {
        let mut registry = ToolRegistry::new();
        registry
            .register(tool(
                "t",
                vec![ParameterSpec::required("bucket", ParamKind::String, "Bucket")
                    .with_examples(&["my-app-bucket"])],
            ))
            .unwrap();
        let summary = &registry.list_tools()[0];
        assert_eq!(summary.input_schema["required"], json!(["bucket"]));
        assert_eq!(
            summary.input_schema["properties"]["bucket"]["description"],
            "Bucket (Examples: my-app-bucket)"
        );
        let wire = serde_json::to_value(summary).unwrap();
        assert!(wire.get("inputSchema").is_some());
    }
}
