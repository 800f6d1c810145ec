//! Temporary credentials through STS AssumeRole.

use super::{bind, int_arg, opt_str_arg, str_arg, AwsApi};
use crate::tools::catalog::{ParamKind, ParameterSpec, ToolDefinition};
use crate::types::{Error, Result};
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub fn assume_role_tool(api: &Arc<dyn AwsApi>, default_role_arn: Option<String>) -> ToolDefinition {
    ToolDefinition::new(
        "aws_sts_assume_role",
        "Assume an AWS IAM role and return temporary credentials (use cautiously).",
        vec![
            ParameterSpec::optional("roleArn", ParamKind::String, "ARN of the role to assume (optional when a default role is configured)")
                .with_pattern(r"^arn:aws[a-z-]*:iam::\d{12}:role/.+$")
                .with_examples(&["arn:aws:iam::123456789012:role/ReadOnly"]),
            ParameterSpec::optional("sessionName", ParamKind::String, "Role session name (optional)")
                .with_default("mcp-session")
                .with_examples(&["mcp-session", "debugging"]),
            ParameterSpec::optional("durationSeconds", ParamKind::Number, "Credential lifetime in seconds (optional)")
                .integer()
                .with_range(900.0, 43200.0)
                .with_default(3600)
                .with_examples(&["900", "3600"]),
        ],
        bind(api, move |api, input| assume_role(api, input, default_role_arn.clone())),
    )
}

async fn assume_role(
    api: Arc<dyn AwsApi>,
    input: Map<String, Value>,
    default_role_arn: Option<String>,
) -> Result<Value> {
    let role_arn = opt_str_arg(&input, "roleArn")
        .or(default_role_arn)
        .ok_or_else(|| Error::validation("roleArn is required (no default configured)"))?;

    let out = api
        .call(
            "sts",
            "assume-role",
            json!({
                "RoleArn": role_arn,
                "RoleSessionName": str_arg(&input, "sessionName")?,
                "DurationSeconds": int_arg(&input, "durationSeconds")?,
            }),
        )
        .await?;
    let credentials = &out["Credentials"];
    Ok(json!({
        "accessKeyId": credentials["AccessKeyId"],
        "secretAccessKey": credentials["SecretAccessKey"],
        "sessionToken": credentials["SessionToken"],
        "expiration": credentials["Expiration"],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::MockAwsApi;

    fn input(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_falls_back_to_default_role() {
        let mut mock = MockAwsApi::new();
        mock.expect_call().times(1).returning(|_, _, request| {
            assert_eq!(request["RoleArn"], "arn:aws:iam::123456789012:role/Default");
            assert_eq!(request["DurationSeconds"], 3600);
            Ok(json!({"Credentials": {
                "AccessKeyId": "ASIA...",
                "SecretAccessKey": "secret",
                "SessionToken": "token",
                "Expiration": "2024-08-01T13:00:00+00:00"
            }}))
        });
        let out = assume_role(
            Arc::new(mock),
            input(json!({"sessionName": "mcp-session", "durationSeconds": 3600})),
            Some("arn:aws:iam::123456789012:role/Default".to_string()),
        )
        .await
        .unwrap();
        assert_eq!(out["accessKeyId"], "ASIA...");
        assert_eq!(out["expiration"], "2024-08-01T13:00:00+00:00");
    }

    #[tokio::test]
    async fn test_no_role_and_no_default_is_error() {
        let mock = MockAwsApi::new();
        let err = assume_role(
            Arc::new(mock),
            input(json!({"sessionName": "s", "durationSeconds": 900})),
            None,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("roleArn is required"));
    }
}
