//! SQL through the RDS Data API.

use super::{array_field, bind, opt_str_arg, str_arg, AwsApi};
use crate::tools::catalog::{ParamKind, ParameterSpec, ToolDefinition};
use crate::types::Result;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub fn execute_tool(api: &Arc<dyn AwsApi>) -> ToolDefinition {
    ToolDefinition::new(
        "aws_rdsdata_execute",
        "Execute SQL via RDS Data API (Aurora Serverless v2).",
        vec![
            ParameterSpec::required("resourceArn", ParamKind::String, "Aurora cluster or DB ARN (required)")
                .with_examples(&["arn:aws:rds:us-east-1:123456789012:cluster:my-aurora"]),
            ParameterSpec::required("secretArn", ParamKind::String, "Secrets Manager secret ARN holding the DB credentials (required)")
                .with_examples(&["arn:aws:secretsmanager:us-east-1:123456789012:secret:db-creds"]),
            ParameterSpec::required("sql", ParamKind::String, "SQL statement to execute (required)")
                .with_examples(&["SELECT now()", "SELECT * FROM users LIMIT 10"]),
            ParameterSpec::optional("database", ParamKind::String, "Database name (optional)")
                .with_examples(&["app", "postgres"]),
            ParameterSpec::optional("schema", ParamKind::String, "Schema name (optional)")
                .with_examples(&["public"]),
        ],
        bind(api, execute),
    )
}

async fn execute(api: Arc<dyn AwsApi>, input: Map<String, Value>) -> Result<Value> {
    let mut request = json!({
        "resourceArn": str_arg(&input, "resourceArn")?,
        "secretArn": str_arg(&input, "secretArn")?,
        "sql": str_arg(&input, "sql")?,
        "includeResultMetadata": true,
    });
    for key in ["database", "schema"] {
        if let Some(value) = opt_str_arg(&input, key) {
            request[key] = json!(value);
        }
    }

    let out = api.call("rds-data", "execute-statement", request).await?;
    let columns: Vec<String> = array_field(&out, "columnMetadata")
        .iter()
        .map(|c| c.get("name").and_then(|n| n.as_str()).unwrap_or_default().to_string())
        .collect();
    let rows: Vec<Value> = array_field(&out, "records")
        .iter()
        .map(|record| {
            let fields = record.as_array().map(|v| v.as_slice()).unwrap_or(&[]);
            let object: Map<String, Value> = columns
                .iter()
                .cloned()
                .zip(fields.iter().map(field_value))
                .collect();
            Value::Object(object)
        })
        .collect();
    Ok(json!({ "columns": columns, "rows": rows }))
}

/// A Data API field is a one-entry object such as `{"stringValue": "x"}`;
/// `{"isNull": true}` becomes `null`.
fn field_value(field: &Value) -> Value {
    match field.as_object().and_then(|o| o.iter().next()) {
        Some((kind, _)) if kind == "isNull" => Value::Null,
        Some((_, value)) => value.clone(),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::MockAwsApi;

    #[test]
    fn test_field_value() {
        assert_eq!(field_value(&json!({"stringValue": "x"})), json!("x"));
        assert_eq!(field_value(&json!({"longValue": 7})), json!(7));
        assert_eq!(field_value(&json!({"isNull": true})), Value::Null);
        assert_eq!(field_value(&json!({})), Value::Null);
    }

    #[tokio::test]
    async fn test_execute_maps_records_to_rows() {
        let mut mock = MockAwsApi::new();
        mock.expect_call().times(1).returning(|service, operation, request| {
            assert_eq!((service, operation), ("rds-data", "execute-statement"));
            assert_eq!(request["database"], "app");
            assert!(request.get("schema").is_none());
            Ok(json!({
                "columnMetadata": [{"name": "id"}, {"name": "email"}],
                "records": [[{"longValue": 1}, {"stringValue": "a@example.com"}]]
            }))
        });
        let input = json!({
            "resourceArn": "arn:cluster",
            "secretArn": "arn:secret",
            "sql": "SELECT id, email FROM users",
            "database": "app"
        })
        .as_object()
        .cloned()
        .unwrap();
        let out = execute(Arc::new(mock), input).await.unwrap();
        assert_eq!(
            out,
            json!({"columns": ["id", "email"], "rows": [{"id": 1, "email": "a@example.com"}]})
        );
    }
}
