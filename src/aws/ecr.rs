//! ECR image listing.

use super::{array_field, bind, field, int_arg, str_arg, AwsApi};
use crate::tools::catalog::{ParamKind, ParameterSpec, ToolDefinition};
use crate::types::Result;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub fn list_images_tool(api: &Arc<dyn AwsApi>) -> ToolDefinition {
    ToolDefinition::new(
        "aws.ecr_list_images",
        "List ECR images and details.",
        vec![
            ParameterSpec::required("repositoryName", ParamKind::String, "ECR repository name (required) - exact repository name")
                .with_examples(&["my-app", "backend-service", "frontend", "api-gateway"]),
            ParameterSpec::optional("maxResults", ParamKind::Number, "Maximum number of images to return (optional, 1-1000)")
                .integer()
                .with_range(1.0, 1000.0)
                .with_default(100)
                .with_examples(&["10", "50", "100", "500"]),
        ],
        bind(api, list_images),
    )
}

async fn list_images(api: Arc<dyn AwsApi>, input: Map<String, Value>) -> Result<Value> {
    let repository = str_arg(&input, "repositoryName")?;
    let list = api
        .call(
            "ecr",
            "list-images",
            json!({ "repositoryName": repository, "maxResults": int_arg(&input, "maxResults")? }),
        )
        .await?;
    let image_ids = array_field(&list, "imageIds");
    if image_ids.is_empty() {
        return Ok(json!({ "images": [] }));
    }

    let described = api
        .call(
            "ecr",
            "describe-images",
            json!({ "repositoryName": repository, "imageIds": image_ids }),
        )
        .await?;
    let images: Vec<Value> = array_field(&described, "imageDetails")
        .iter()
        .map(|d| {
            json!({
                "imageTags": field(d, "imageTags"),
                "imagePushedAt": field(d, "imagePushedAt"),
                "size": field(d, "imageSizeInBytes"),
            })
        })
        .collect();
    Ok(json!({ "images": images }))
}
