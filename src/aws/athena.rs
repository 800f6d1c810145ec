//! Athena query tool: start, poll the execution state, read the result set.

use super::{array_field, bind, str_arg, timeout_override, AwsApi};
use crate::polling::{run_to_completion, PollOutcome, RemoteJob, RemoteStatus};
use crate::tools::catalog::{ParamKind, ParameterSpec, ToolDefinition};
use crate::types::{Error, JobId, PollConfig, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub fn query_tool(api: &Arc<dyn AwsApi>, poll: PollConfig) -> ToolDefinition {
    ToolDefinition::new(
        "aws.athena_query",
        "Run an Athena query and wait for results (best for small/medium result sets).",
        vec![
            ParameterSpec::required("database", ParamKind::String, "Athena database name (required) - target database for the query")
                .with_examples(&["default", "analytics", "data_lake", "prod_db"]),
            ParameterSpec::required("workgroup", ParamKind::String, "Athena workgroup name (required) - workgroup to execute the query in")
                .with_examples(&["primary", "analytics", "dev", "prod"]),
            ParameterSpec::required("sql", ParamKind::String, "SQL query to execute (required) - valid Athena/Presto SQL statement")
                .with_examples(&[
                    "SELECT * FROM my_table LIMIT 10",
                    "SELECT COUNT(*) FROM logs WHERE date = '2024-01-01'",
                    "SHOW TABLES",
                ]),
            ParameterSpec::optional("timeoutMs", ParamKind::Number, "How long to wait for the query before returning its id (optional)")
                .integer()
                .with_range(1000.0, 900_000.0)
                .with_examples(&["60000", "300000"]),
        ],
        bind(api, move |api, input| run_query(api, input, poll)),
    )
}

/// Column names and rows of a finished query.
#[derive(Debug, Clone, PartialEq)]
struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Value>,
}

struct AthenaQuery {
    api: Arc<dyn AwsApi>,
    database: String,
    workgroup: String,
    sql: String,
}

#[async_trait]
impl RemoteJob for AthenaQuery {
    type Output = ResultTable;

    async fn submit(&mut self) -> Result<JobId> {
        let out = self
            .api
            .call(
                "athena",
                "start-query-execution",
                json!({
                    "QueryString": self.sql,
                    "QueryExecutionContext": { "Database": self.database },
                    "WorkGroup": self.workgroup,
                }),
            )
            .await?;
        let id = out
            .get("QueryExecutionId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::remote("start-query-execution returned no QueryExecutionId"))?;
        JobId::from_string(id.to_string()).map_err(Error::remote)
    }

    async fn poll(&mut self, job_id: &JobId) -> Result<RemoteStatus> {
        let out = self
            .api
            .call(
                "athena",
                "get-query-execution",
                json!({ "QueryExecutionId": job_id.as_str() }),
            )
            .await?;
        let status = &out["QueryExecution"]["Status"];
        let reason = status["StateChangeReason"].as_str().map(|s| s.to_string());
        Ok(match status["State"].as_str() {
            Some("SUCCEEDED") => RemoteStatus::Succeeded,
            Some("FAILED") => RemoteStatus::Failed { reason },
            Some("CANCELLED") => RemoteStatus::Cancelled { reason },
            _ => RemoteStatus::Running,
        })
    }

    async fn fetch(&mut self, job_id: &JobId) -> Result<ResultTable> {
        let out = self
            .api
            .call(
                "athena",
                "get-query-results",
                json!({ "QueryExecutionId": job_id.as_str() }),
            )
            .await?;
        Ok(result_table(&out))
    }
}

/// First row is the header; every cell is a `VarCharValue`.
fn result_table(out: &Value) -> ResultTable {
    let cells = |row: &Value| -> Vec<Value> {
        array_field(row, "Data")
            .iter()
            .map(|d| d.get("VarCharValue").cloned().unwrap_or(Value::Null))
            .collect()
    };

    let rows = array_field(&out["ResultSet"], "Rows");
    let Some((header, data)) = rows.split_first() else {
        return ResultTable {
            columns: Vec::new(),
            rows: Vec::new(),
        };
    };
    let columns: Vec<String> = cells(header)
        .into_iter()
        .map(|v| v.as_str().unwrap_or_default().to_string())
        .collect();
    let rows = data
        .iter()
        .map(|row| {
            let object: Map<String, Value> = columns.iter().cloned().zip(cells(row)).collect();
            Value::Object(object)
        })
        .collect();
    ResultTable { columns, rows }
}

async fn run_query(api: Arc<dyn AwsApi>, input: Map<String, Value>, poll: PollConfig) -> Result<Value> {
    let poll = timeout_override(&input).map_or(poll, |d| poll.with_deadline(d));
    let mut job = AthenaQuery {
        api,
        database: str_arg(&input, "database")?,
        workgroup: str_arg(&input, "workgroup")?,
        sql: str_arg(&input, "sql")?,
    };

    Ok(match run_to_completion(&mut job, poll).await? {
        PollOutcome::Succeeded { output, .. } => json!({
            "state": "SUCCEEDED",
            "columns": output.columns,
            "rows": output.rows,
        }),
        PollOutcome::Failed { job_id, reason } => {
            json!({ "state": "FAILED", "queryId": job_id, "reason": reason })
        }
        PollOutcome::Cancelled { job_id, reason } => {
            json!({ "state": "CANCELLED", "queryId": job_id, "reason": reason })
        }
        PollOutcome::TimedOut { job_id, elapsed } => json!({
            "state": "TIMEOUT",
            "queryId": job_id,
            "elapsedMs": elapsed.as_millis() as u64,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::MockAwsApi;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn input() -> Map<String, Value> {
        json!({"database": "analytics", "workgroup": "primary", "sql": "SELECT 1"})
            .as_object()
            .cloned()
            .unwrap()
    }

    fn results_page() -> Value {
        json!({"ResultSet": {"Rows": [
            {"Data": [{"VarCharValue": "id"}, {"VarCharValue": "name"}]},
            {"Data": [{"VarCharValue": "1"}, {"VarCharValue": "alpha"}]},
            {"Data": [{"VarCharValue": "2"}, {}]}
        ]}})
    }

    #[test]
    fn test_result_table_uses_header_row() {
        let table = result_table(&results_page());
        assert_eq!(table.columns, vec!["id", "name"]);
        assert_eq!(
            table.rows,
            vec![json!({"id": "1", "name": "alpha"}), json!({"id": "2", "name": null})]
        );
        assert_eq!(result_table(&json!({})).columns.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_fetches_once_after_success() {
        let fetches = Arc::new(AtomicU32::new(0));
        let counter = fetches.clone();
        let polls = Arc::new(AtomicU32::new(0));
        let poll_counter = polls.clone();
        let mut mock = MockAwsApi::new();
        mock.expect_call().returning(move |service, operation, request| {
            assert_eq!(service, "athena");
            match operation {
                "start-query-execution" => {
                    assert_eq!(request["QueryExecutionContext"]["Database"], "analytics");
                    Ok(json!({"QueryExecutionId": "qe-1"}))
                }
                "get-query-execution" => {
                    let state = if poll_counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        "RUNNING"
                    } else {
                        "SUCCEEDED"
                    };
                    Ok(json!({"QueryExecution": {"Status": {"State": state}}}))
                }
                "get-query-results" => {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(results_page())
                }
                other => panic!("unexpected operation {}", other),
            }
        });

        let out = run_query(Arc::new(mock), input(), PollConfig::new(Duration::from_secs(60)))
            .await
            .unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(polls.load(Ordering::SeqCst), 2);
        assert_eq!(out["state"], "SUCCEEDED");
        assert_eq!(out["columns"], json!(["id", "name"]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_query_reports_reason() {
        let mut mock = MockAwsApi::new();
        mock.expect_call().returning(|_, operation, _| match operation {
            "start-query-execution" => Ok(json!({"QueryExecutionId": "qe-2"})),
            "get-query-execution" => Ok(json!({"QueryExecution": {"Status": {
                "State": "FAILED",
                "StateChangeReason": "SYNTAX_ERROR: line 1:8"
            }}})),
            other => panic!("unexpected operation {}", other),
        });
        let out = run_query(Arc::new(mock), input(), PollConfig::new(Duration::from_secs(60)))
            .await
            .unwrap();
        assert_eq!(
            out,
            json!({"state": "FAILED", "queryId": "qe-2", "reason": "SYNTAX_ERROR: line 1:8"})
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_running_forever_times_out() {
        let mut mock = MockAwsApi::new();
        mock.expect_call().returning(|_, operation, _| match operation {
            "start-query-execution" => Ok(json!({"QueryExecutionId": "qe-3"})),
            "get-query-execution" => Ok(json!({"QueryExecution": {"Status": {"State": "QUEUED"}}})),
            other => panic!("fetch must not run: {}", other),
        });
        let out = run_query(Arc::new(mock), input(), PollConfig::new(Duration::from_secs(2)))
            .await
            .unwrap();
        assert_eq!(out["state"], "TIMEOUT");
        assert_eq!(out["queryId"], "qe-3");
    }
}
