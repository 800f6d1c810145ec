//! ECS task listing.

use super::{array_field, bind, field, opt_str_arg, str_arg, AwsApi};
use crate::tools::catalog::{ParamKind, ParameterSpec, ToolDefinition};
use crate::types::Result;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub fn list_tasks_tool(api: &Arc<dyn AwsApi>) -> ToolDefinition {
    ToolDefinition::new(
        "aws.ecs_list_tasks",
        "List and describe ECS tasks for a cluster/service.",
        vec![
            ParameterSpec::required("cluster", ParamKind::String, "ECS cluster name (required) - name or ARN of the cluster")
                .with_examples(&["default", "my-cluster", "prod-cluster", "arn:aws:ecs:region:account:cluster/my-cluster"]),
            ParameterSpec::optional("serviceName", ParamKind::String, "ECS service name (optional) - filter tasks by service name")
                .with_examples(&["web-service", "api-service", "worker-service"]),
        ],
        bind(api, list_tasks),
    )
}

async fn list_tasks(api: Arc<dyn AwsApi>, input: Map<String, Value>) -> Result<Value> {
    let cluster = str_arg(&input, "cluster")?;
    let mut request = json!({ "cluster": cluster });
    if let Some(service) = opt_str_arg(&input, "serviceName") {
        request["serviceName"] = json!(service);
    }

    let list = api.call("ecs", "list-tasks", request).await?;
    let arns = array_field(&list, "taskArns");
    if arns.is_empty() {
        return Ok(json!({ "tasks": [] }));
    }

    let described = api
        .call("ecs", "describe-tasks", json!({ "cluster": cluster, "tasks": arns }))
        .await?;
    let tasks: Vec<Value> = array_field(&described, "tasks")
        .iter()
        .map(|t| {
            json!({
                "taskArn": field(t, "taskArn"),
                "lastStatus": field(t, "lastStatus"),
                "desiredStatus": field(t, "desiredStatus"),
                "containers": field(t, "containers"),
            })
        })
        .collect();
    Ok(json!({ "tasks": tasks }))
}
