//! Dispatcher — lookup → validate → invoke → wrap.
//!
//! The only layer allowed to turn a handler failure into a boundary error.
//! Validation and lookup touch nothing but the frozen registry and alias
//! table, so concurrent dispatches need no locking.

use crate::tools::aliases::AliasTable;
use crate::tools::catalog::ToolDefinition;
use crate::tools::diagnostics::{Diagnostic, DiagnosticCode};
use crate::tools::registry::{ToolRegistry, ToolSummary};
use crate::tools::validation::{ValidationOutcome, Validator};
use crate::types::RequestId;
use futures::FutureExt;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Boundary error of a dispatch. Every variant names the tool.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("Tool '{tool}' not found. Available tools: {}. Call tools/list to see each tool's parameters.", .available.join(", "))]
    UnknownTool { tool: String, available: Vec<String> },

    #[error("{}", .diagnostic.message)]
    InvalidInput {
        tool: String,
        diagnostic: Box<Diagnostic>,
    },

    #[error("Tool '{tool}' execution failed: {cause}. Check the inputs and the state of the remote resource, then call the tool again.")]
    ExecutionFailure { tool: String, cause: String },
}

impl DispatchError {
    pub fn tool(&self) -> &str {
        match self {
            DispatchError::UnknownTool { tool, .. }
            | DispatchError::InvalidInput { tool, .. }
            | DispatchError::ExecutionFailure { tool, .. } => tool,
        }
    }

    pub fn code(&self) -> DiagnosticCode {
        match self {
            DispatchError::UnknownTool { .. } => DiagnosticCode::UnknownTool,
            DispatchError::InvalidInput { diagnostic, .. } => diagnostic.code,
            DispatchError::ExecutionFailure { .. } => DiagnosticCode::ExecutionFailure,
        }
    }

    /// Rendered, tool-scoped guidance text.
    pub fn guidance(&self) -> String {
        self.to_string()
    }

    /// Structured payload for the wire.
    pub fn diagnostic(&self) -> Diagnostic {
        match self {
            DispatchError::UnknownTool { tool, available } => {
                Diagnostic::unknown_tool(tool, self.guidance(), available)
            }
            DispatchError::InvalidInput { diagnostic, .. } => (**diagnostic).clone(),
            DispatchError::ExecutionFailure { tool, cause } => {
                Diagnostic::execution_failure(tool, self.guidance(), cause)
            }
        }
    }
}

/// Routes validated input to registered handlers.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    aliases: Arc<AliasTable>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, aliases: Arc<AliasTable>) -> Self {
        Self { registry, aliases }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn list_tools(&self) -> Vec<ToolSummary> {
        self.registry.list_tools()
    }

    fn lookup(&self, name: &str) -> Result<&ToolDefinition, DispatchError> {
        self.registry
            .get(name)
            .ok_or_else(|| DispatchError::UnknownTool {
                tool: name.to_string(),
                available: self.registry.names(),
            })
    }

    /// Validate without executing.
    pub fn validate(&self, name: &str, raw: &Value) -> Result<ValidationOutcome, DispatchError> {
        let tool = self.lookup(name)?;
        Ok(Validator::new(&self.aliases).validate(&tool.parameters, raw))
    }

    /// Look up, validate and execute one tool call.
    pub async fn dispatch(&self, name: &str, raw: &Value) -> Result<Value, DispatchError> {
        let request_id = RequestId::new();
        tracing::debug!(%request_id, tool = name, args = %raw, "Tool called");

        let tool = self.lookup(name).map_err(|e| {
            tracing::error!(%request_id, tool = name, "Tool not found");
            e
        })?;

        let input = match Validator::new(&self.aliases).validate(&tool.parameters, raw) {
            ValidationOutcome::Valid { coerced_input } => coerced_input,
            ValidationOutcome::Invalid {
                missing,
                errors,
                suggestions,
            } => {
                let diagnostic = Diagnostic::invalid_input(name, &missing, &errors, &suggestions);
                if missing.is_empty() {
                    tracing::error!(%request_id, tool = name, ?errors, "Tool called with invalid parameters");
                } else {
                    let names: Vec<&str> = missing.iter().map(|p| p.name.as_str()).collect();
                    tracing::error!(%request_id, tool = name, missing = ?names, "Tool called with missing required parameters");
                }
                return Err(DispatchError::InvalidInput {
                    tool: name.to_string(),
                    diagnostic: Box::new(diagnostic),
                });
            }
        };

        let started = Instant::now();
        let result = AssertUnwindSafe(tool.handler.call(input)).catch_unwind().await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(output)) => {
                tracing::debug!(
                    %request_id,
                    tool = name,
                    elapsed_ms,
                    result_size = output.to_string().len(),
                    "Tool completed"
                );
                Ok(output)
            }
            // Input checks that only the handler can make are still bad parameters.
            Ok(Err(crate::types::Error::Validation(reason))) => {
                tracing::error!(%request_id, tool = name, elapsed_ms, %reason, "Tool rejected its parameters");
                let errors = vec![reason];
                Err(DispatchError::InvalidInput {
                    tool: name.to_string(),
                    diagnostic: Box::new(Diagnostic::invalid_input(name, &[], &errors, &[])),
                })
            }
            Ok(Err(err)) => {
                tracing::error!(%request_id, tool = name, elapsed_ms, error = %err, "Tool execution failed");
                Err(DispatchError::ExecutionFailure {
                    tool: name.to_string(),
                    cause: err.to_string(),
                })
            }
            Err(panic) => {
                let cause = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "handler panicked".to_string());
                tracing::error!(%request_id, tool = name, elapsed_ms, %cause, "Tool handler panicked");
                Err(DispatchError::ExecutionFailure {
                    tool: name.to_string(),
                    cause: format!("handler panicked: {}", cause),
                })
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
