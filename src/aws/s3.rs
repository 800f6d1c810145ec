//! S3 tools: bucket listing, object listing, text get/put.

use super::{array_field, bind, field, int_arg, opt_str_arg, str_arg, AwsApi};
use crate::tools::catalog::{ParamKind, ParameterSpec, ToolDefinition};
use crate::types::Result;
use serde_json::{json, Map, Value};
use std::sync::Arc;

fn bucket_param() -> ParameterSpec {
    ParameterSpec::required("bucket", ParamKind::String, "S3 bucket name (required)")
        .with_examples(&["my-app-bucket", "logs-prod", "data-lake-raw"])
}

fn key_param() -> ParameterSpec {
    ParameterSpec::required("key", ParamKind::String, "Object key (required) - full path inside the bucket")
        .with_examples(&["reports/2024/summary.csv", "config/app.json"])
}

pub fn list_buckets_tool(api: &Arc<dyn AwsApi>) -> ToolDefinition {
    ToolDefinition::new(
        "aws_s3_list_buckets",
        "List all S3 buckets in the account.",
        vec![],
        bind(api, list_buckets),
    )
}

async fn list_buckets(api: Arc<dyn AwsApi>, _input: Map<String, Value>) -> Result<Value> {
    let out = api.call("s3api", "list-buckets", json!({})).await?;
    let buckets: Vec<Value> = array_field(&out, "Buckets")
        .iter()
        .map(|b| json!({"name": field(b, "Name"), "creationDate": field(b, "CreationDate")}))
        .collect();
    Ok(json!({ "buckets": buckets }))
}

pub fn list_tool(api: &Arc<dyn AwsApi>) -> ToolDefinition {
    ToolDefinition::new(
        "aws_s3_list",
        "List objects in S3 (bucket/prefix).",
        vec![
            bucket_param(),
            ParameterSpec::optional("prefix", ParamKind::String, "Key prefix to filter by (optional)")
                .with_examples(&["logs/", "reports/2024/"]),
            ParameterSpec::optional("maxKeys", ParamKind::Number, "Maximum number of objects to return (optional)")
                .integer()
                .with_range(1.0, 1000.0)
                .with_default(100)
                .with_examples(&["10", "100", "1000"]),
        ],
        bind(api, list_objects),
    )
}

async fn list_objects(api: Arc<dyn AwsApi>, input: Map<String, Value>) -> Result<Value> {
    let mut request = json!({
        "Bucket": str_arg(&input, "bucket")?,
        "MaxKeys": int_arg(&input, "maxKeys")?,
    });
    if let Some(prefix) = opt_str_arg(&input, "prefix") {
        request["Prefix"] = json!(prefix);
    }
    let out = api.call("s3api", "list-objects-v2", request).await?;
    let objects: Vec<Value> = array_field(&out, "Contents")
        .iter()
        .map(|o| {
            json!({
                "key": field(o, "Key"),
                "size": field(o, "Size"),
                "lastModified": field(o, "LastModified"),
            })
        })
        .collect();
    Ok(json!({ "objects": objects }))
}

pub fn get_text_tool(api: &Arc<dyn AwsApi>) -> ToolDefinition {
    ToolDefinition::new(
        "aws_s3_get_text",
        "Get an S3 object as text.",
        vec![bucket_param(), key_param()],
        bind(api, get_text),
    )
}

async fn get_text(api: Arc<dyn AwsApi>, input: Map<String, Value>) -> Result<Value> {
    let bucket = str_arg(&input, "bucket")?;
    let key = str_arg(&input, "key")?;
    let text = api.get_object_text(&bucket, &key).await?;
    Ok(json!({ "key": key, "text": text }))
}

pub fn put_text_tool(api: &Arc<dyn AwsApi>) -> ToolDefinition {
    ToolDefinition::new(
        "aws_s3_put_text",
        "Put a text object to S3.",
        vec![
            bucket_param(),
            key_param(),
            ParameterSpec::required("text", ParamKind::String, "Object body (required)")
                .with_examples(&["hello world"]),
            ParameterSpec::optional("contentType", ParamKind::String, "Content-Type header (optional)")
                .with_default("text/plain; charset=utf-8")
                .with_examples(&["text/plain; charset=utf-8", "application/json", "text/csv"]),
        ],
        bind(api, put_text),
    )
}

async fn put_text(api: Arc<dyn AwsApi>, input: Map<String, Value>) -> Result<Value> {
    let bucket = str_arg(&input, "bucket")?;
    let key = str_arg(&input, "key")?;
    let text = str_arg(&input, "text")?;
    let content_type = str_arg(&input, "contentType")?;
    api.put_object_text(&bucket, &key, &text, &content_type).await?;
    Ok(json!({ "ok": true, "bucket": bucket, "key": key }))
}
