//! AWS tool catalog.
//!
//! Every tool declares its parameters up front and talks to AWS only through
//! [`AwsApi`], so handlers can be exercised against a mock backend. The
//! production backend is [`AwsCli`].

pub mod athena;
pub mod cli;
pub mod cost;
pub mod ecr;
pub mod ecs;
pub mod logs;
pub mod rds;
pub mod rds_data;
pub mod s3;
pub mod sts;

pub use cli::AwsCli;

use crate::tools::catalog::{handler_fn, ToolHandler};
use crate::tools::registry::ToolRegistry;
use crate::types::{Config, Error, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Name of the cross-tool parameter check registered on top of the AWS tools.
pub const VALIDATE_PARAMETERS_TOOL: &str = "aws_validate_parameters";

/// Remote capability calls used by the AWS tools.
///
/// `service` and `operation` use AWS CLI spelling (`s3api`, `list-objects-v2`);
/// `input` and the returned value use the API's JSON shapes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AwsApi: Send + Sync {
    async fn call(&self, service: &str, operation: &str, input: Value) -> Result<Value>;

    async fn get_object_text(&self, bucket: &str, key: &str) -> Result<String>;

    async fn put_object_text(
        &self,
        bucket: &str,
        key: &str,
        text: &str,
        content_type: &str,
    ) -> Result<()>;
}

/// Build the registry of AWS tools, in listing order.
pub fn registry(api: Arc<dyn AwsApi>, config: &Config) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    let tools = [
        s3::list_buckets_tool(&api),
        s3::list_tool(&api),
        s3::get_text_tool(&api),
        s3::put_text_tool(&api),
        logs::query_tool(&api, config.polling.logs_insights),
        ecs::list_tasks_tool(&api),
        ecr::list_images_tool(&api),
        rds_data::execute_tool(&api),
        rds::cpu_metrics_tool(&api),
        rds::top_sql_tool(&api),
        athena::query_tool(&api, config.polling.athena),
        sts::assume_role_tool(&api, config.aws.default_role_arn.clone()),
        cost::get_cost_tool(&api),
    ];
    for tool in tools {
        registry.register(tool)?;
    }
    Ok(registry)
}

/// Bind a handler function to a shared backend.
pub(crate) fn bind<F, Fut>(api: &Arc<dyn AwsApi>, f: F) -> Arc<dyn ToolHandler>
where
    F: Fn(Arc<dyn AwsApi>, Map<String, Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    let api = api.clone();
    handler_fn(move |input| f(api.clone(), input))
}

// =============================================================================
// Shared helpers — used by all tool modules
// =============================================================================

pub(crate) fn str_arg(input: &Map<String, Value>, key: &str) -> Result<String> {
    input
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| Error::validation(format!("Missing required field: {}", key)))
}

pub(crate) fn opt_str_arg(input: &Map<String, Value>, key: &str) -> Option<String> {
    input.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

pub(crate) fn int_arg(input: &Map<String, Value>, key: &str) -> Result<i64> {
    input
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| Error::validation(format!("Missing integer field: {}", key)))
}

/// Per-call deadline override carried in `timeoutMs`.
pub(crate) fn timeout_override(input: &Map<String, Value>) -> Option<Duration> {
    input
        .get("timeoutMs")
        .and_then(|v| v.as_u64())
        .map(Duration::from_millis)
}

/// Array at `key`, or empty when the field is absent.
pub(crate) fn array_field<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|v| v.as_slice())
        .unwrap_or(&[])
}

/// Field copied as-is, `null` when absent.
pub(crate) fn field(value: &Value, key: &str) -> Value {
    value.get(key).cloned().unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registry_lists_every_tool_in_order() {
        let api: Arc<dyn AwsApi> = Arc::new(MockAwsApi::new());
        let registry = registry(api, &Config::default()).unwrap();
        assert_eq!(
            registry.names(),
            vec![
                "aws_s3_list_buckets",
                "aws_s3_list",
                "aws_s3_get_text",
                "aws_s3_put_text",
                "aws.cw_logs_query",
                "aws.ecs_list_tasks",
                "aws.ecr_list_images",
                "aws_rdsdata_execute",
                "aws_rds_get_cpu_metrics",
                "aws_rds_performance_insights_top_sql",
                "aws.athena_query",
                "aws_sts_assume_role",
                "aws_cost_explorer_get_cost",
            ]
        );
    }

    #[test]
    fn test_arg_helpers() {
        let input = json!({"bucket": "b", "maxKeys": 10, "timeoutMs": 1500})
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(str_arg(&input, "bucket").unwrap(), "b");
        assert!(str_arg(&input, "key").is_err());
        assert_eq!(opt_str_arg(&input, "prefix"), None);
        assert_eq!(int_arg(&input, "maxKeys").unwrap(), 10);
        assert_eq!(timeout_override(&input), Some(Duration::from_millis(1500)));
        assert!(array_field(&json!({}), "Buckets").is_empty());
        assert_eq!(field(&json!({"a": 1}), "b"), Value::Null);
    }
}
