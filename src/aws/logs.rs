//! CloudWatch Logs Insights query tool, driven by the bounded poll driver.

use super::{array_field, bind, int_arg, str_arg, timeout_override, AwsApi};
use crate::polling::{run_to_completion, PollOutcome, RemoteJob, RemoteStatus};
use crate::tools::catalog::{ParamKind, ParameterSpec, ToolDefinition};
use crate::types::{Error, JobId, PollConfig, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Rows returned by one Insights query.
const RESULT_LIMIT: u32 = 1000;

pub fn query_tool(api: &Arc<dyn AwsApi>, poll: PollConfig) -> ToolDefinition {
    ToolDefinition::new(
        "aws.cw_logs_query",
        "Run a CloudWatch Logs Insights query and wait for results (short windows).",
        vec![
            ParameterSpec::required("logGroup", ParamKind::String, "Log group name (required)")
                .with_examples(&["/aws/lambda/my-function", "/ecs/web-service"]),
            ParameterSpec::required("query", ParamKind::String, "Logs Insights query string (required)")
                .with_examples(&[
                    "fields @timestamp, @message | sort @timestamp desc | limit 20",
                    "filter @message like /ERROR/ | stats count() by bin(5m)",
                ]),
            ParameterSpec::optional("startMinutesAgo", ParamKind::Number, "How many minutes back the query window starts (optional)")
                .integer()
                .with_range(1.0, 1440.0)
                .with_default(60)
                .with_examples(&["15", "60", "240"]),
            ParameterSpec::optional("timeoutMs", ParamKind::Number, "How long to wait for the query before returning its id (optional)")
                .integer()
                .with_range(1000.0, 900_000.0)
                .with_examples(&["45000", "120000"]),
        ],
        bind(api, move |api, input| run_query(api, input, poll)),
    )
}

/// One Insights query, from `start-query` to its final result page.
struct InsightsQuery {
    api: Arc<dyn AwsApi>,
    log_group: String,
    query: String,
    start_time: i64,
    end_time: i64,
    last_results: Option<Value>,
}

#[async_trait]
impl RemoteJob for InsightsQuery {
    type Output = Vec<Value>;

    async fn submit(&mut self) -> Result<JobId> {
        let out = self
            .api
            .call(
                "logs",
                "start-query",
                json!({
                    "logGroupName": self.log_group,
                    "queryString": self.query,
                    "startTime": self.start_time,
                    "endTime": self.end_time,
                    "limit": RESULT_LIMIT,
                }),
            )
            .await?;
        let id = out
            .get("queryId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::remote("start-query returned no queryId"))?;
        JobId::from_string(id.to_string()).map_err(Error::remote)
    }

    async fn poll(&mut self, job_id: &JobId) -> Result<RemoteStatus> {
        let out = self
            .api
            .call("logs", "get-query-results", json!({ "queryId": job_id.as_str() }))
            .await?;
        // Scheduled, Running, Unknown or no status at all: keep polling.
        let mapped = match out.get("status").and_then(|v| v.as_str()) {
            Some("Complete") => RemoteStatus::Succeeded,
            Some(status @ ("Failed" | "Timeout")) => RemoteStatus::Failed {
                reason: Some(status.to_string()),
            },
            Some(status @ "Cancelled") => RemoteStatus::Cancelled {
                reason: Some(status.to_string()),
            },
            _ => RemoteStatus::Running,
        };
        if mapped == RemoteStatus::Succeeded {
            self.last_results = Some(out);
        }
        Ok(mapped)
    }

    async fn fetch(&mut self, _job_id: &JobId) -> Result<Vec<Value>> {
        // get-query-results already carried the rows on the Complete poll.
        let out = self.last_results.take().unwrap_or(Value::Null);
        Ok(array_field(&out, "results").iter().map(row_to_object).collect())
    }
}

/// `[{field, value}, ...]` → `{field: value, ...}`.
fn row_to_object(row: &Value) -> Value {
    let cells = row.as_array().map(|v| v.as_slice()).unwrap_or(&[]);
    let object: Map<String, Value> = cells
        .iter()
        .filter_map(|cell| {
            let name = cell.get("field")?.as_str()?;
            Some((name.to_string(), cell.get("value").cloned().unwrap_or(Value::Null)))
        })
        .collect();
    Value::Object(object)
}

async fn run_query(api: Arc<dyn AwsApi>, input: Map<String, Value>, poll: PollConfig) -> Result<Value> {
    let end_time = chrono::Utc::now().timestamp();
    let start_time = end_time - int_arg(&input, "startMinutesAgo")? * 60;
    let poll = timeout_override(&input).map_or(poll, |d| poll.with_deadline(d));

    let mut job = InsightsQuery {
        api,
        log_group: str_arg(&input, "logGroup")?,
        query: str_arg(&input, "query")?,
        start_time,
        end_time,
        last_results: None,
    };

    Ok(match run_to_completion(&mut job, poll).await? {
        PollOutcome::Succeeded { output, .. } => json!({ "status": "Complete", "results": output }),
        PollOutcome::Failed { job_id, reason } => json!({
            "status": reason.unwrap_or_else(|| "Failed".to_string()),
            "queryId": job_id,
        }),
        PollOutcome::Cancelled { job_id, .. } => json!({ "status": "Cancelled", "queryId": job_id }),
        PollOutcome::TimedOut { job_id, elapsed } => json!({
            "status": "Timeout",
            "queryId": job_id,
            "elapsedMs": elapsed.as_millis() as u64,
        }),
    })
}
