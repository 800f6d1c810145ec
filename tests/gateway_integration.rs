//! Gateway integration tests — registry → validator → diagnostics → handler round-trip.

use async_trait::async_trait;
use aws_tool_gateway::aws::AwsApi;
use aws_tool_gateway::tools::diagnostics::synthesize_example;
use aws_tool_gateway::tools::{AliasTable, DiagnosticCode, ParamKind, ParameterSpec, ValidationOutcome, Validator};
use aws_tool_gateway::{Config, Error, Gateway, Result};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Backend answering from a fixed table keyed by `service operation`.
#[derive(Debug, Default)]
struct FakeAws {
    responses: HashMap<String, Value>,
    calls: Mutex<Vec<String>>,
}

impl FakeAws {
    fn with(mut self, command: &str, response: Value) -> Self {
        self.responses.insert(command.to_string(), response);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AwsApi for FakeAws {
    async fn call(&self, service: &str, operation: &str, _input: Value) -> Result<Value> {
        let command = format!("{} {}", service, operation);
        self.calls.lock().unwrap().push(command.clone());
        self.responses
            .get(&command)
            .cloned()
            .ok_or_else(|| Error::remote(format!("An error occurred (AccessDenied) when calling {}", command)))
    }

    async fn get_object_text(&self, bucket: &str, key: &str) -> Result<String> {
        Ok(format!("{}/{}", bucket, key))
    }

    async fn put_object_text(&self, _bucket: &str, _key: &str, _text: &str, _content_type: &str) -> Result<()> {
        Ok(())
    }
}

fn gateway(fake: FakeAws) -> (Gateway, Arc<FakeAws>) {
    let fake = Arc::new(fake);
    let gateway = Gateway::build(&Config::default(), fake.clone()).unwrap();
    (gateway, fake)
}

fn athena_specs() -> Vec<ParameterSpec> {
    vec![
        ParameterSpec::required("database", ParamKind::String, "Athena database name"),
        ParameterSpec::required("workgroup", ParamKind::String, "Athena workgroup name"),
        ParameterSpec::required("sql", ParamKind::String, "SQL query to execute"),
    ]
}

// =============================================================================
// Validator scenarios
// =============================================================================

#[test]
fn test_empty_input_reports_all_missing_in_order() {
    let aliases = AliasTable::new();
    match Validator::new(&aliases).validate(&athena_specs(), &json!({})) {
        ValidationOutcome::Invalid { missing, errors, .. } => {
            let names: Vec<&str> = missing.iter().map(|s| s.name.as_str()).collect();
            assert_eq!(names, vec!["database", "workgroup", "sql"]);
            assert!(errors.is_empty());
        }
        other => panic!("expected Invalid, got {:?}", other),
    }
}

#[test]
fn test_out_of_range_reports_one_error() {
    let specs = vec![ParameterSpec::optional("startMinutesAgo", ParamKind::Number, "Window start")
        .with_range(1.0, 1440.0)];
    let aliases = AliasTable::new();
    match Validator::new(&aliases).validate(&specs, &json!({"startMinutesAgo": 2000})) {
        ValidationOutcome::Invalid { missing, errors, .. } => {
            assert!(missing.is_empty());
            assert_eq!(errors.len(), 1);
            assert!(errors[0].contains("1440"), "{}", errors[0]);
            assert!(errors[0].starts_with("Parameter 'startMinutesAgo':"));
        }
        other => panic!("expected Invalid, got {:?}", other),
    }
}

#[test]
fn test_alias_suggestion_names_both_keys() {
    let specs = vec![ParameterSpec::required("dbInstanceIdentifier", ParamKind::String, "RDS instance")];
    let suggestions = AliasTable::aws_defaults().suggest(json!({"db_identifier": "x"}).as_object().unwrap(), &specs);
    assert_eq!(suggestions.len(), 1);
    assert!(suggestions[0].contains("dbInstanceIdentifier"));
    assert!(suggestions[0].contains("db_identifier"));
}

#[test]
fn test_example_synthesis_uses_first_example() {
    let spec = ParameterSpec::required("name", ParamKind::String, "Name").with_examples(&["a", "b"]);
    assert_eq!(synthesize_example(&[spec])["name"], "a");
}

fn required_names() -> Vec<&'static str> {
    vec!["alpha", "beta", "gamma", "delta"]
}

proptest! {
    #[test]
    fn prop_absent_required_fields_are_missing_not_errors(present in proptest::collection::vec(any::<bool>(), 4)) {
        let specs: Vec<ParameterSpec> = required_names()
            .into_iter()
            .map(|n| ParameterSpec::required(n, ParamKind::String, "field"))
            .collect();
        let mut raw = serde_json::Map::new();
        for (name, keep) in required_names().iter().zip(&present) {
            if *keep {
                raw.insert(name.to_string(), json!("v"));
            }
        }
        let expected: Vec<&str> = required_names()
            .into_iter()
            .zip(&present)
            .filter(|(_, keep)| !**keep)
            .map(|(n, _)| n)
            .collect();

        let aliases = AliasTable::new();
        match Validator::new(&aliases).validate(&specs, &Value::Object(raw)) {
            ValidationOutcome::Valid { .. } => prop_assert!(expected.is_empty()),
            ValidationOutcome::Invalid { missing, errors, .. } => {
                let names: Vec<&str> = missing.iter().map(|s| s.name.as_str()).collect();
                prop_assert_eq!(names, expected);
                prop_assert!(errors.is_empty());
            }
        }
    }

    #[test]
    fn prop_valid_input_applies_every_default(items in proptest::option::of(1i64..=100), filter in proptest::option::of(0usize..4)) {
        let filters = ["CPU", "IO", "Lock", "All"];
        let specs = vec![
            ParameterSpec::required("dbInstanceIdentifier", ParamKind::String, "RDS instance"),
            ParameterSpec::optional("maxItems", ParamKind::Number, "Items").integer().with_range(1.0, 100.0).with_default(10),
            ParameterSpec::optional("filterType", ParamKind::String, "Filter").with_allowed_values(&filters).with_default("All"),
        ];
        let mut raw = json!({"dbInstanceIdentifier": "db-1"});
        if let Some(n) = items {
            raw["maxItems"] = json!(n);
        }
        if let Some(i) = filter {
            raw["filterType"] = json!(filters[i]);
        }

        let aliases = AliasTable::new();
        let outcome = Validator::new(&aliases).validate(&specs, &raw);
        let coerced = outcome.coerced_input().cloned();
        prop_assert!(coerced.is_some());
        let coerced = coerced.unwrap_or_default();
        prop_assert_eq!(&coerced["maxItems"], &json!(items.unwrap_or(10)));
        prop_assert_eq!(&coerced["filterType"], &json!(filter.map_or("All", |i| filters[i])));
    }
}

// =============================================================================
// Gateway round-trips
// =============================================================================

#[tokio::test]
async fn test_unknown_tool_is_idempotent() {
    let (gateway, _) = gateway(FakeAws::default());
    let first = gateway.invoke("aws_s3_delete_everything", &json!({})).await;
    let second = gateway.invoke("aws_s3_delete_everything", &json!({})).await;
    assert!(!first.success);
    assert_eq!(first, second);
    assert_eq!(first.diagnostic.unwrap().code, DiagnosticCode::UnknownTool);
}

#[tokio::test]
async fn test_alias_key_gets_suggestion_and_no_remote_call() {
    let (gateway, fake) = gateway(FakeAws::default());
    let result = gateway
        .invoke("aws_rds_get_cpu_metrics", &json!({"db_identifier": "mi-test-2"}))
        .await;
    let diagnostic = result.diagnostic.unwrap();
    assert_eq!(diagnostic.code, DiagnosticCode::MissingRequiredParameter);
    assert_eq!(
        diagnostic.suggestions,
        vec!["Did you mean 'dbInstanceIdentifier' instead of 'db_identifier'?"]
    );
    assert!(diagnostic.message.contains("aws_rds_get_cpu_metrics"));
    assert_eq!(diagnostic.example_parameters.unwrap()["dbInstanceIdentifier"], "mi-test-2");
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_remote_failure_is_execution_failure() {
    let (gateway, _) = gateway(FakeAws::default());
    let result = gateway.invoke("aws_s3_list", &json!({"bucket": "logs"})).await;
    let diagnostic = result.diagnostic.unwrap();
    assert_eq!(diagnostic.code, DiagnosticCode::ExecutionFailure);
    assert!(diagnostic.cause.unwrap().contains("AccessDenied"));
    assert_eq!(diagnostic.tool, "aws_s3_list");
}

#[tokio::test]
async fn test_s3_list_applies_default_page_size() {
    let (gateway, fake) = gateway(FakeAws::default().with(
        "s3api list-objects-v2",
        json!({"Contents": [{"Key": "a.txt", "Size": 3, "LastModified": "2024-01-01T00:00:00+00:00"}]}),
    ));
    let result = gateway.invoke("aws_s3_list", &json!({"bucket": "logs", "extra": 1})).await;
    assert!(result.success);
    assert_eq!(result.payload.unwrap()["objects"][0]["key"], "a.txt");
    assert_eq!(fake.calls(), vec!["s3api list-objects-v2"]);
}

#[tokio::test]
async fn test_get_text_goes_through_object_api() {
    let (gateway, fake) = gateway(FakeAws::default());
    let result = gateway
        .invoke("aws_s3_get_text", &json!({"bucket": "b", "key": "notes.txt"}))
        .await;
    assert_eq!(result.payload.unwrap()["text"], "b/notes.txt");
    assert!(fake.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_athena_timeout_reports_query_id() {
    let (gateway, fake) = gateway(
        FakeAws::default()
            .with("athena start-query-execution", json!({"QueryExecutionId": "q-123"}))
            .with("athena get-query-execution", json!({"QueryExecution": {"Status": {"State": "RUNNING"}}})),
    );
    let result = gateway
        .invoke(
            "aws.athena_query",
            &json!({"database": "d", "workgroup": "w", "sql": "SELECT 1", "timeoutMs": 2000}),
        )
        .await;
    let payload = result.payload.unwrap();
    assert_eq!(payload["state"], "TIMEOUT");
    assert_eq!(payload["queryId"], "q-123");
    assert_eq!(payload["elapsedMs"], Duration::from_secs(2).as_millis() as u64);
    assert!(!fake.calls().iter().any(|c| c == "athena get-query-results"));
}

#[tokio::test]
async fn test_preflight_over_gateway() {
    let (gateway, _) = gateway(FakeAws::default());
    let result = gateway
        .invoke(
            "aws_validate_parameters",
            &json!({"toolName": "aws.athena_query", "parameters": {"database": "d"}}),
        )
        .await;
    let payload = result.payload.unwrap();
    assert_eq!(payload["valid"], false);
    assert_eq!(payload["missingParameters"], json!(["workgroup", "sql"]));
}

#[test]
fn test_listing_carries_enriched_schema() {
    let (gateway, _) = gateway(FakeAws::default());
    let ops = gateway.list_operations();
    let cpu = ops.iter().find(|o| o.name == "aws_rds_get_cpu_metrics").unwrap();
    let start = &cpu.input_schema["properties"]["startMinutesAgo"];
    assert_eq!(start["minimum"], 1);
    assert_eq!(start["maximum"], 1440);
    assert_eq!(start["default"], 60);
    assert_eq!(cpu.input_schema["required"], json!(["dbInstanceIdentifier"]));
    let buckets = ops.iter().find(|o| o.name == "aws_s3_list_buckets").unwrap();
    assert!(buckets.input_schema.get("required").is_none());
}

#[tokio::test]
async fn test_inverted_cost_range_is_bad_parameter() {
    let (gateway, fake) = gateway(FakeAws::default());
    let result = gateway
        .invoke("aws_cost_explorer_get_cost", &json!({"start": "2024-02-01", "end": "2024-01-01"}))
        .await;
    let diagnostic = result.diagnostic.unwrap();
    assert_eq!(diagnostic.code, DiagnosticCode::InvalidParameterValue);
    assert_eq!(diagnostic.validation_errors.len(), 1);
    assert!(fake.calls().is_empty());
}
