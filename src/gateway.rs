//! Invocation boundary exposed to calling agents.
//!
//! `list_operations` and `invoke` are the whole surface. Adding a tool never
//! changes their shape.

use crate::aws::{self, AwsApi, VALIDATE_PARAMETERS_TOOL};
use crate::tools::preflight::validate_parameters_tool;
use crate::tools::{AliasTable, Diagnostic, DispatchError, Dispatcher, ToolRegistry, ToolSummary};
use crate::types::{Config, Result};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Result of one `invoke`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvokeResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<Diagnostic>,
}

impl InvokeResult {
    pub fn ok(payload: Value) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            diagnostic: None,
        }
    }

    pub fn failed(diagnostic: Diagnostic) -> Self {
        Self {
            success: false,
            payload: None,
            diagnostic: Some(diagnostic),
        }
    }
}

impl From<std::result::Result<Value, DispatchError>> for InvokeResult {
    fn from(result: std::result::Result<Value, DispatchError>) -> Self {
        match result {
            Ok(payload) => Self::ok(payload),
            Err(err) => Self::failed(err.diagnostic()),
        }
    }
}

/// Tool gateway over a frozen registry.
#[derive(Debug, Clone)]
pub struct Gateway {
    dispatcher: Dispatcher,
}

impl Gateway {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Register every AWS tool plus the parameter pre-flight tool over them.
    pub fn build(config: &Config, api: Arc<dyn AwsApi>) -> Result<Self> {
        let aliases = Arc::new(AliasTable::aws_defaults());
        let aws_tools = Arc::new(aws::registry(api, config)?);

        let mut registry: ToolRegistry = (*aws_tools).clone();
        registry.register(validate_parameters_tool(
            VALIDATE_PARAMETERS_TOOL,
            aws_tools,
            aliases.clone(),
        ))?;

        tracing::info!(tools = registry.len(), "Tool registry built");
        Ok(Self::new(Dispatcher::new(Arc::new(registry), aliases)))
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn list_operations(&self) -> Vec<ToolSummary> {
        self.dispatcher.list_tools()
    }

    /// Dispatch and keep the boundary error, for transports that map codes.
    pub async fn call(&self, name: &str, args: &Value) -> std::result::Result<Value, DispatchError> {
        self.dispatcher.dispatch(name, args).await
    }

    pub async fn invoke(&self, name: &str, args: &Value) -> InvokeResult {
        self.call(name, args).await.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::MockAwsApi;
    use crate::tools::DiagnosticCode;
    use serde_json::json;

    fn gateway(mock: MockAwsApi) -> Gateway {
        Gateway::build(&Config::default(), Arc::new(mock)).unwrap()
    }

    #[test]
    fn test_preflight_tool_is_listed_last() {
        let ops = gateway(MockAwsApi::new()).list_operations();
        assert_eq!(ops.len(), 14);
        assert_eq!(ops.last().unwrap().name, VALIDATE_PARAMETERS_TOOL);
    }

    #[tokio::test]
    async fn test_invoke_success() {
        let mut mock = MockAwsApi::new();
        mock.expect_call()
            .returning(|_, _, _| Ok(json!({"Buckets": [{"Name": "b", "CreationDate": "2024-01-01T00:00:00+00:00"}]})));
        let result = gateway(mock).invoke("aws_s3_list_buckets", &json!({})).await;
        assert!(result.success);
        assert_eq!(result.payload.unwrap()["buckets"][0]["name"], "b");
    }

    #[tokio::test]
    async fn test_invoke_missing_parameter() {
        let result = gateway(MockAwsApi::new())
            .invoke("aws.athena_query", &json!({}))
            .await;
        assert!(!result.success);
        let diagnostic = result.diagnostic.unwrap();
        assert_eq!(diagnostic.code, DiagnosticCode::MissingRequiredParameter);
        assert_eq!(diagnostic.missing_parameters, vec!["database", "workgroup", "sql"]);
        let wire = serde_json::to_value(InvokeResult::failed(diagnostic)).unwrap();
        assert!(wire.get("payload").is_none());
    }
}
