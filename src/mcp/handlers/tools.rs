//! Tools handler: `tools/list` and `tools/call`.

use crate::gateway::Gateway;
use crate::mcp::router::{str_field, RpcError};
use crate::types::Error;
use serde_json::{json, Value};

pub fn list(gateway: &Gateway) -> Value {
    json!({ "tools": gateway.list_operations() })
}

/// Run a tool and wrap its output as one text content block.
pub async fn call(gateway: &Gateway, params: &Value) -> Result<Value, RpcError> {
    let name = str_field(params, "name")?;
    let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

    let output = gateway.call(&name, &arguments).await?;
    let text = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::internal(format!("Serialization error: {}", e)))?;

    Ok(json!({
        "content": [{ "type": "text", "text": text }],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::MockAwsApi;
    use crate::types::{rpc_code, Config};
    use std::sync::Arc;

    fn gateway(mock: MockAwsApi) -> Gateway {
        Gateway::build(&Config::default(), Arc::new(mock)).unwrap()
    }

    #[test]
    fn test_list_uses_input_schema() {
        let out = list(&gateway(MockAwsApi::new()));
        let tools = out["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 14);
        assert_eq!(tools[0]["name"], "aws_s3_list_buckets");
        assert_eq!(tools[0]["inputSchema"]["type"], "object");
    }

    #[tokio::test]
    async fn test_call_wraps_text_content() {
        let mut mock = MockAwsApi::new();
        mock.expect_call().returning(|_, _, _| Ok(json!({"Buckets": []})));
        let out = call(&gateway(mock), &json!({"name": "aws_s3_list_buckets"}))
            .await
            .unwrap();
        assert_eq!(out["content"][0]["type"], "text");
        let text = out["content"][0]["text"].as_str().unwrap();
        assert_eq!(serde_json::from_str::<Value>(text).unwrap(), json!({"buckets": []}));
    }

    #[tokio::test]
    async fn test_call_without_name() {
        let err = call(&gateway(MockAwsApi::new()), &json!({})).await.unwrap_err();
        assert_eq!(err.code, rpc_code::INVALID_PARAMS);
        assert!(err.message.contains("name"));
    }

    #[tokio::test]
    async fn test_call_unknown_tool() {
        let err = call(&gateway(MockAwsApi::new()), &json!({"name": "aws_nope", "arguments": {}}))
            .await
            .unwrap_err();
        assert_eq!(err.code, rpc_code::METHOD_NOT_FOUND);
        assert_eq!(err.data.unwrap()["code"], "UNKNOWN_TOOL");
    }
}
