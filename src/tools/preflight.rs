//! Parameter pre-flight: validate an argument bag for another tool without
//! running it.
//!
//! The target registry is built before this tool and handed in by `Arc`, so
//! the check never re-resolves tools per call and never sees itself.

use crate::tools::aliases::AliasTable;
use crate::tools::catalog::{handler_fn, ParamKind, ParameterSpec, ToolDefinition};
use crate::tools::registry::ToolRegistry;
use crate::tools::validation::{ValidationOutcome, Validator};
use crate::types::{Error, Result};
use serde_json::{json, Map, Value};
use std::fmt::Write as _;
use std::sync::Arc;

/// Build the pre-flight tool over `targets`.
pub fn validate_parameters_tool(
    name: &str,
    targets: Arc<ToolRegistry>,
    aliases: Arc<AliasTable>,
) -> ToolDefinition {
    ToolDefinition::new(
        name,
        "Validate parameters for any AWS tool before calling it. This helps ensure parameters are correct before execution, preventing errors and providing helpful guidance.",
        vec![
            ParameterSpec::required("toolName", ParamKind::String, "Name of the tool to validate parameters for")
                .with_examples(&[
                    "aws_rds_performance_insights_top_sql",
                    "aws_rds_get_cpu_metrics",
                    "aws_s3_list",
                    "aws.ecs_list_tasks",
                ]),
            ParameterSpec::required("parameters", ParamKind::Object, "Parameters object to validate - the same object you would pass to the actual tool")
                .with_examples(&[r#"{"dbInstanceIdentifier": "mi-test-2"}"#, r#"{"bucket": "my-bucket", "prefix": "logs/"}"#]),
        ],
        handler_fn(move |input| {
            let targets = targets.clone();
            let aliases = aliases.clone();
            async move { preflight(&targets, &aliases, &input) }
        }),
    )
}

fn preflight(targets: &ToolRegistry, aliases: &AliasTable, input: &Map<String, Value>) -> Result<Value> {
    let tool_name = input
        .get("toolName")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::validation("Missing required field: toolName"))?;
    let parameters = input.get("parameters").cloned().unwrap_or(Value::Null);

    let Some(tool) = targets.get(tool_name) else {
        return Ok(json!({
            "valid": false,
            "error": format!("Tool '{}' not found", tool_name),
            "availableTools": targets.names(),
        }));
    };

    match Validator::new(aliases).validate(&tool.parameters, &parameters) {
        ValidationOutcome::Valid { coerced_input } => Ok(json!({
            "valid": true,
            "toolName": tool_name,
            "validatedParameters": coerced_input,
            "message": "Parameters are valid and ready to use",
        })),
        ValidationOutcome::Invalid {
            missing,
            errors,
            suggestions,
        } => Ok(json!({
            "valid": false,
            "toolName": tool_name,
            "error": render_report(tool, &missing, &errors, &suggestions),
            "missingParameters": missing.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            "validationErrors": errors,
            "suggestions": suggestions,
            "parameterGuide": serde_json::to_value(&tool.parameters)?,
        })),
    }
}

/// Full report: missing parameters, raw errors, then every parameter of the tool.
fn render_report(
    tool: &ToolDefinition,
    missing: &[ParameterSpec],
    errors: &[String],
    suggestions: &[String],
) -> String {
    let mut out = format!("Parameter validation failed for tool '{}':\n\n", tool.name);

    if !missing.is_empty() {
        out.push_str("Missing required parameters:\n");
        for spec in missing {
            let _ = writeln!(out, "  • {}: {}", spec.name, spec.description);
            if !spec.examples.is_empty() {
                let _ = writeln!(out, "    Examples: {}", spec.examples.join(", "));
            }
        }
        out.push('\n');
    }

    if !errors.is_empty() {
        out.push_str("Validation errors:\n");
        for error in errors {
            let _ = writeln!(out, "  • {}", error);
        }
        out.push('\n');
    }

    for suggestion in suggestions {
        let _ = writeln!(out, "{}", suggestion);
    }
    if !suggestions.is_empty() {
        out.push('\n');
    }

    out.push_str("All parameters for this tool:\n");
    for spec in &tool.parameters {
        let tag = if spec.required { "required" } else { "optional" };
        let _ = writeln!(out, "  • {} ({}): {}", spec.name, tag, spec.description);
        if !spec.examples.is_empty() {
            let _ = writeln!(out, "    Examples: {}", spec.examples.join(", "));
        }
        if let Some(default) = &spec.default_value {
            let _ = writeln!(out, "    Default: {}", crate::tools::catalog::display_value(default));
        }
    }
    out
}
