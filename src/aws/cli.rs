//! [`AwsApi`] backed by the AWS CLI.
//!
//! Each call spawns `aws <service> <operation> --cli-input-json <json>
//! --output json`, so credentials, region and profile resolution follow the
//! CLI's own rules. Object bodies go through `aws s3 cp` with `-` as the
//! local side.

use super::AwsApi;
use crate::types::{AwsConfig, Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct AwsCli {
    config: AwsConfig,
}

impl AwsCli {
    pub fn new(config: AwsConfig) -> Self {
        Self { config }
    }

    /// Arguments for an API-style call.
    pub fn command_args(&self, service: &str, operation: &str, input: &Value) -> Result<Vec<String>> {
        let mut args = vec![
            service.to_string(),
            operation.to_string(),
            "--cli-input-json".to_string(),
            serde_json::to_string(input)?,
            "--output".to_string(),
            "json".to_string(),
        ];
        args.extend(self.global_args());
        Ok(args)
    }

    fn global_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(region) = &self.config.region {
            args.push("--region".to_string());
            args.push(region.clone());
        }
        if let Some(profile) = &self.config.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        args
    }

    fn s3_uri(bucket: &str, key: &str) -> String {
        format!("s3://{}/{}", bucket, key.trim_start_matches('/'))
    }

    /// Run the CLI, feeding `stdin` when given, and return stdout.
    async fn run(&self, args: &[String], stdin: Option<&[u8]>) -> Result<Vec<u8>> {
        let label = args.iter().take(2).cloned().collect::<Vec<_>>().join(" ");
        tracing::debug!(cli = %self.config.cli_path, command = %label, "Invoking AWS CLI");

        let mut child = Command::new(&self.config.cli_path)
            .args(args)
            .stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::remote(format!("failed to start '{}': {}", self.config.cli_path, e))
            })?;

        if let (Some(data), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(data).await?;
            pipe.shutdown().await?;
        }

        let output = tokio::time::timeout(self.config.call_timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                Error::timeout(format!(
                    "aws {} did not finish within {:?}",
                    label, self.config.call_timeout
                ))
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(command = %label, status = ?output.status.code(), "AWS CLI call failed");
            return Err(Error::remote(format!("aws {}: {}", label, stderr.trim())));
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl AwsApi for AwsCli {
    async fn call(&self, service: &str, operation: &str, input: Value) -> Result<Value> {
        let args = self.command_args(service, operation, &input)?;
        let stdout = self.run(&args, None).await?;
        if stdout.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        Ok(serde_json::from_slice(&stdout)?)
    }

    async fn get_object_text(&self, bucket: &str, key: &str) -> Result<String> {
        let mut args = vec![
            "s3".to_string(),
            "cp".to_string(),
            Self::s3_uri(bucket, key),
            "-".to_string(),
        ];
        args.extend(self.global_args());
        let stdout = self.run(&args, None).await?;
        String::from_utf8(stdout)
            .map_err(|e| Error::remote(format!("object s3://{}/{} is not UTF-8: {}", bucket, key, e)))
    }

    async fn put_object_text(
        &self,
        bucket: &str,
        key: &str,
        text: &str,
        content_type: &str,
    ) -> Result<()> {
        let mut args = vec![
            "s3".to_string(),
            "cp".to_string(),
            "-".to_string(),
            Self::s3_uri(bucket, key),
            "--content-type".to_string(),
            content_type.to_string(),
        ];
        args.extend(self.global_args());
        self.run(&args, Some(text.as_bytes())).await?;
        Ok(())
    }
}
