//! Cost Explorer spend by time range.

use super::{array_field, bind, str_arg, AwsApi};
use crate::tools::catalog::{ParamKind, ParameterSpec, ToolDefinition};
use crate::types::{Error, Result};
use chrono::NaiveDate;
use serde_json::{json, Map, Value};
use std::sync::Arc;

const DATE_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}$";

pub fn get_cost_tool(api: &Arc<dyn AwsApi>) -> ToolDefinition {
    ToolDefinition::new(
        "aws_cost_explorer_get_cost",
        "Get AWS cost by time range (USD).",
        vec![
            ParameterSpec::required("start", ParamKind::String, "Start date (required) - format YYYY-MM-DD, inclusive")
                .with_pattern(DATE_PATTERN)
                .with_examples(&["2024-01-01", "2024-08-01", "2024-08-25"]),
            ParameterSpec::required("end", ParamKind::String, "End date (required) - format YYYY-MM-DD, exclusive (not included in results)")
                .with_pattern(DATE_PATTERN)
                .with_examples(&["2024-01-31", "2024-08-31", "2024-08-27"]),
            ParameterSpec::optional("granularity", ParamKind::String, "Time granularity (optional)")
                .with_allowed_values(&["DAILY", "MONTHLY"])
                .with_default("DAILY")
                .with_examples(&["DAILY", "MONTHLY"]),
            ParameterSpec::optional("metric", ParamKind::String, "Cost metric type (optional)")
                .with_allowed_values(&[
                    "UnblendedCost",
                    "AmortizedCost",
                    "NetAmortizedCost",
                    "NetUnblendedCost",
                    "UsageQuantity",
                ])
                .with_default("UnblendedCost")
                .with_examples(&["UnblendedCost", "AmortizedCost", "UsageQuantity"]),
        ],
        bind(api, get_cost),
    )
}

fn parse_date(input: &Map<String, Value>, key: &str) -> Result<NaiveDate> {
    let raw = str_arg(input, key)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|e| Error::validation(format!("{} '{}' is not a calendar date: {}", key, raw, e)))
}

async fn get_cost(api: Arc<dyn AwsApi>, input: Map<String, Value>) -> Result<Value> {
    let start = parse_date(&input, "start")?;
    let end = parse_date(&input, "end")?;
    if end <= start {
        return Err(Error::validation(format!(
            "end ({}) must be after start ({})",
            end, start
        )));
    }
    let metric = str_arg(&input, "metric")?;

    let out = api
        .call(
            "ce",
            "get-cost-and-usage",
            json!({
                "TimePeriod": { "Start": start.to_string(), "End": end.to_string() },
                "Granularity": str_arg(&input, "granularity")?,
                "Metrics": [metric],
            }),
        )
        .await?;
    let results: Vec<Value> = array_field(&out, "ResultsByTime")
        .iter()
        .map(|bucket| {
            let total = &bucket["Total"][metric.as_str()];
            json!({
                "timeStart": bucket["TimePeriod"]["Start"],
                "amount": total["Amount"],
                "unit": total["Unit"],
            })
        })
        .collect();
    Ok(json!({ "results": results }))
}
