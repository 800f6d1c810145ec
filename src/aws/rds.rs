//! RDS monitoring tools: CloudWatch CPU metrics and Performance Insights top SQL.

use super::{array_field, bind, field, int_arg, str_arg, AwsApi};
use crate::tools::catalog::{ParamKind, ParameterSpec, ToolDefinition};
use crate::types::{Error, Result};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::sync::Arc;

fn db_instance_param() -> ParameterSpec {
    ParameterSpec::required(
        "dbInstanceIdentifier",
        ParamKind::String,
        "RDS DB instance identifier/name (required) - exact name like 'mi-test-2', 'prod-mysql-01'",
    )
    .with_examples(&["mi-test-2", "prod-mysql-01", "staging-postgres"])
}

fn rfc3339(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `(start, end)` of a window given in minutes before `now`.
fn window(now: DateTime<Utc>, start_minutes_ago: i64, end_minutes_ago: i64) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    if end_minutes_ago >= start_minutes_ago {
        return Err(Error::validation(format!(
            "endMinutesAgo ({}) must be smaller than startMinutesAgo ({})",
            end_minutes_ago, start_minutes_ago
        )));
    }
    Ok((
        now - Duration::minutes(start_minutes_ago),
        now - Duration::minutes(end_minutes_ago),
    ))
}

async fn describe_instance(api: &dyn AwsApi, identifier: &str) -> Result<Value> {
    let out = api
        .call(
            "rds",
            "describe-db-instances",
            json!({ "DBInstanceIdentifier": identifier }),
        )
        .await?;
    array_field(&out, "DBInstances")
        .first()
        .cloned()
        .ok_or_else(|| Error::not_found(format!("DB instance {} not found", identifier)))
}

// =============================================================================
// CPU metrics
// =============================================================================

pub fn cpu_metrics_tool(api: &Arc<dyn AwsApi>) -> ToolDefinition {
    ToolDefinition::new(
        "aws_rds_get_cpu_metrics",
        "Get CPU utilization metrics for RDS instance by name. Monitor database performance over time with detailed CPU statistics (avg/max/min percentages). Only requires dbInstanceIdentifier - other parameters optional.",
        vec![
            db_instance_param(),
            ParameterSpec::optional("startMinutesAgo", ParamKind::Number, "How many minutes ago to start collecting data (optional, default: 60 = last hour)")
                .integer()
                .with_range(1.0, 1440.0)
                .with_default(60)
                .with_examples(&["30", "60", "180", "1440"]),
            ParameterSpec::optional("endMinutesAgo", ParamKind::Number, "How many minutes ago to end data collection (optional, default: 0 = now)")
                .integer()
                .with_range(0.0, 1439.0)
                .with_default(0)
                .with_examples(&["0", "5", "30"]),
            ParameterSpec::optional("periodMinutes", ParamKind::Number, "Data point interval in minutes (optional, default: 5 = every 5 minutes)")
                .integer()
                .with_range(1.0, 1440.0)
                .with_default(5)
                .with_examples(&["1", "5", "15", "60"]),
        ],
        bind(api, cpu_metrics),
    )
}

async fn cpu_metrics(api: Arc<dyn AwsApi>, input: Map<String, Value>) -> Result<Value> {
    let identifier = str_arg(&input, "dbInstanceIdentifier")?;
    let period_minutes = int_arg(&input, "periodMinutes")?;
    let (start, end) = window(
        Utc::now(),
        int_arg(&input, "startMinutesAgo")?,
        int_arg(&input, "endMinutesAgo")?,
    )?;

    let instance = describe_instance(api.as_ref(), &identifier).await?;
    let metrics = api
        .call(
            "cloudwatch",
            "get-metric-statistics",
            json!({
                "Namespace": "AWS/RDS",
                "MetricName": "CPUUtilization",
                "Dimensions": [{ "Name": "DBInstanceIdentifier", "Value": identifier }],
                "StartTime": rfc3339(start),
                "EndTime": rfc3339(end),
                "Period": period_minutes * 60,
                "Statistics": ["Average", "Maximum", "Minimum"],
            }),
        )
        .await?;

    let mut points: Vec<&Value> = array_field(&metrics, "Datapoints").iter().collect();
    points.sort_by_key(|p| {
        p.get("Timestamp")
            .and_then(|t| t.as_str())
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.timestamp_millis())
            .unwrap_or(0)
    });
    let data_points: Vec<Value> = points
        .into_iter()
        .map(|p| {
            json!({
                "timestamp": field(p, "Timestamp"),
                "average": field(p, "Average"),
                "maximum": field(p, "Maximum"),
                "minimum": field(p, "Minimum"),
                "unit": field(p, "Unit"),
            })
        })
        .collect();

    Ok(json!({
        "dbInstanceIdentifier": identifier,
        "dbInstanceClass": field(&instance, "DBInstanceClass"),
        "engine": field(&instance, "Engine"),
        "engineVersion": field(&instance, "EngineVersion"),
        "dbInstanceStatus": field(&instance, "DBInstanceStatus"),
        "cpuMetrics": {
            "startTime": rfc3339(start),
            "endTime": rfc3339(end),
            "periodMinutes": period_minutes,
            "dataPoints": data_points,
        },
    }))
}

// =============================================================================
// Performance Insights top SQL
// =============================================================================

pub fn top_sql_tool(api: &Arc<dyn AwsApi>) -> ToolDefinition {
    ToolDefinition::new(
        "aws_rds_performance_insights_top_sql",
        "Get top slow SQL queries ranked by database load (AAS - Average Active Sessions) from RDS Performance Insights. Shows actual SQL statements with load metrics. Only requires dbInstanceIdentifier. Optional: filter by CPU/IO/Lock, adjust time range, limit results. Requires Performance Insights enabled on the RDS instance.",
        vec![
            db_instance_param(),
            ParameterSpec::optional("startMinutesAgo", ParamKind::Number, "How many minutes ago to start analysis (optional, default: 60 = last hour, max: 10080 = 7 days)")
                .integer()
                .with_range(5.0, 10080.0)
                .with_default(60)
                .with_examples(&["60", "180", "1440"]),
            ParameterSpec::optional("endMinutesAgo", ParamKind::Number, "How many minutes ago to end analysis (optional, default: 5, min: 1 for data availability)")
                .integer()
                .with_range(1.0, 10079.0)
                .with_default(5)
                .with_examples(&["1", "5", "30"]),
            ParameterSpec::optional("maxItems", ParamKind::Number, "Maximum number of top SQL queries to return (optional, default: 10, max: 100)")
                .integer()
                .with_range(1.0, 100.0)
                .with_default(10)
                .with_examples(&["5", "10", "25"]),
            ParameterSpec::optional("filterType", ParamKind::String, "Filter by wait event type (optional) - CPU: CPU-bound queries, IO: I/O-bound, Lock: lock-related, All: all types")
                .with_allowed_values(&["CPU", "IO", "Lock", "All"])
                .with_default("All")
                .with_examples(&["All", "CPU", "IO"]),
        ],
        bind(api, top_sql),
    )
}

/// One ranked statement.
#[derive(Debug, Clone)]
struct TopSql {
    sql_id: String,
    total_load: f64,
    statement: String,
}

async fn statement_text(api: &dyn AwsApi, resource_id: &str, sql_id: &str) -> String {
    let details = api
        .call(
            "pi",
            "get-dimension-key-details",
            json!({
                "ServiceType": "RDS",
                "Identifier": resource_id,
                "Group": "db.sql",
                "GroupIdentifier": sql_id,
                "RequestedDimensions": ["statement"],
            }),
        )
        .await;
    match details {
        Ok(details) => array_field(&details, "Dimensions")
            .iter()
            .find(|d| d.get("Dimension").and_then(|v| v.as_str()) == Some("db.sql.statement"))
            .and_then(|d| d.get("Value").and_then(|v| v.as_str()))
            .map(|s| s.to_string())
            .unwrap_or_else(|| "(statement unavailable or truncated)".to_string()),
        Err(err) => {
            tracing::warn!(sql_id, error = %err, "Statement lookup failed");
            format!("(error retrieving statement: {})", err)
        }
    }
}

async fn top_sql(api: Arc<dyn AwsApi>, input: Map<String, Value>) -> Result<Value> {
    let identifier = str_arg(&input, "dbInstanceIdentifier")?;
    let filter_type = str_arg(&input, "filterType")?;
    let (start, end) = window(
        Utc::now(),
        int_arg(&input, "startMinutesAgo")?,
        int_arg(&input, "endMinutesAgo")?,
    )?;

    let instance = describe_instance(api.as_ref(), &identifier).await?;
    let resource_id = instance
        .get("DbiResourceId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            Error::not_found(format!("Resource ID not found for DB instance {}", identifier))
        })?
        .to_string();

    let mut request = json!({
        "ServiceType": "RDS",
        "Identifier": resource_id,
        "StartTime": rfc3339(start),
        "EndTime": rfc3339(end),
        "Metric": "db.load.avg",
        "GroupBy": { "Group": "db.sql", "Limit": int_arg(&input, "maxItems")? },
    });
    if filter_type != "All" {
        request["Filter"] = json!({ "db.wait_event.type": filter_type });
    }
    let keys = api.call("pi", "describe-dimension-keys", request).await?;

    let mut ranked = Vec::new();
    for key in array_field(&keys, "Keys") {
        let dims = &key["Dimensions"];
        let Some(sql_id) = dims["db.sql.id"]
            .as_str()
            .or_else(|| dims["db.sql.tokenized_id"].as_str())
        else {
            continue;
        };
        ranked.push(TopSql {
            sql_id: sql_id.to_string(),
            total_load: key["Total"].as_f64().unwrap_or(0.0),
            statement: statement_text(api.as_ref(), &resource_id, sql_id).await,
        });
    }
    ranked.sort_by(|a, b| b.total_load.partial_cmp(&a.total_load).unwrap_or(Ordering::Equal));

    let queries: Vec<Value> = ranked
        .iter()
        .enumerate()
        .map(|(i, q)| {
            json!({
                "rank": i + 1,
                "sqlId": q.sql_id,
                "totalLoadAAS": q.total_load,
                "statement": q.statement,
            })
        })
        .collect();

    Ok(json!({
        "dbInstanceIdentifier": identifier,
        "resourceId": resource_id,
        "engine": field(&instance, "Engine"),
        "engineVersion": field(&instance, "EngineVersion"),
        "timeRange": { "startTime": rfc3339(start), "endTime": rfc3339(end) },
        "filterType": filter_type,
        "totalQueries": queries.len(),
        "topSqlQueries": queries,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::MockAwsApi;
    use chrono::TimeZone;

    fn input(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn instance() -> Value {
        json!({"DBInstances": [{
            "DBInstanceIdentifier": "mi-test-2",
            "DBInstanceClass": "db.t3.medium",
            "Engine": "mysql",
            "EngineVersion": "8.0.35",
            "DBInstanceStatus": "available",
            "DbiResourceId": "db-ABC123"
        }]})
    }

    #[test]
    fn test_window_rejects_inverted_range() {
        let now = Utc.with_ymd_and_hms(2024, 8, 1, 12, 0, 0).unwrap();
        let (start, end) = window(now, 60, 0).unwrap();
        assert_eq!(rfc3339(start), "2024-08-01T11:00:00.000Z");
        assert_eq!(end, now);
        assert!(window(now, 5, 5).is_err());
    }

    #[tokio::test]
    async fn test_cpu_metrics_sorts_datapoints() {
        let mut mock = MockAwsApi::new();
        mock.expect_call().times(2).returning(|service, operation, request| match (service, operation) {
            ("rds", "describe-db-instances") => Ok(instance()),
            ("cloudwatch", "get-metric-statistics") => {
                assert_eq!(request["Period"], 300);
                assert_eq!(request["Dimensions"][0]["Value"], "mi-test-2");
                Ok(json!({"Datapoints": [
                    {"Timestamp": "2024-08-01T11:10:00+00:00", "Average": 20.0, "Maximum": 30.0, "Minimum": 10.0, "Unit": "Percent"},
                    {"Timestamp": "2024-08-01T11:05:00+00:00", "Average": 5.0, "Maximum": 6.0, "Minimum": 4.0, "Unit": "Percent"}
                ]}))
            }
            other => panic!("unexpected call {:?}", other),
        });
        let out = cpu_metrics(
            Arc::new(mock),
            input(json!({"dbInstanceIdentifier": "mi-test-2", "startMinutesAgo": 60, "endMinutesAgo": 0, "periodMinutes": 5})),
        )
        .await
        .unwrap();
        assert_eq!(out["engine"], "mysql");
        let points = out["cpuMetrics"]["dataPoints"].as_array().unwrap();
        assert_eq!(points[0]["average"], 5.0);
        assert_eq!(points[1]["average"], 20.0);
    }

    #[tokio::test]
    async fn test_unknown_instance_is_not_found() {
        let mut mock = MockAwsApi::new();
        mock.expect_call().returning(|_, _, _| Ok(json!({"DBInstances": []})));
        let err = cpu_metrics(
            Arc::new(mock),
            input(json!({"dbInstanceIdentifier": "ghost", "startMinutesAgo": 60, "endMinutesAgo": 0, "periodMinutes": 5})),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_top_sql_ranks_by_load() {
        let mut mock = MockAwsApi::new();
        mock.expect_call().returning(|_, operation, request| match operation {
            "describe-db-instances" => Ok(instance()),
            "describe-dimension-keys" => {
                assert_eq!(request["Identifier"], "db-ABC123");
                assert_eq!(request["Filter"], json!({"db.wait_event.type": "CPU"}));
                Ok(json!({"Keys": [
                    {"Dimensions": {"db.sql.id": "low"}, "Total": 0.5},
                    {"Dimensions": {"db.sql.tokenized_id": "high"}, "Total": 2.5},
                    {"Dimensions": {}, "Total": 9.0}
                ]}))
            }
            "get-dimension-key-details" => {
                if request["GroupIdentifier"] == "high" {
                    Ok(json!({"Dimensions": [{"Dimension": "db.sql.statement", "Value": "SELECT * FROM orders"}]}))
                } else {
                    Err(Error::remote("ThrottlingException"))
                }
            }
            other => panic!("unexpected operation {}", other),
        });
        let out = top_sql(
            Arc::new(mock),
            input(json!({
                "dbInstanceIdentifier": "mi-test-2",
                "startMinutesAgo": 60,
                "endMinutesAgo": 5,
                "maxItems": 10,
                "filterType": "CPU"
            })),
        )
        .await
        .unwrap();

        assert_eq!(out["totalQueries"], 2);
        let queries = out["topSqlQueries"].as_array().unwrap();
        assert_eq!(queries[0]["sqlId"], "high");
        assert_eq!(queries[0]["rank"], 1);
        assert_eq!(queries[0]["statement"], "SELECT * FROM orders");
        assert_eq!(queries[1]["sqlId"], "low");
        assert!(queries[1]["statement"].as_str().unwrap().contains("ThrottlingException"));
    }
}
