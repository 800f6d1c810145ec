//! "Did you mean" suggestions for misnamed required parameters.
//!
//! The table maps canonical parameter names to alias spellings callers
//! commonly use instead. Matching is case-insensitive. A key that differs from
//! the canonical name only by case also counts as a match.

use crate::tools::catalog::ParameterSpec;
use crate::tools::validation::{lookup, Lookup};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Canonical name → known aliases. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: HashMap<String, Vec<String>>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Add aliases for a canonical name (builder style).
    pub fn with_aliases(mut self, canonical: &str, aliases: &[&str]) -> Self {
        let list = self.entries.entry(canonical.to_string()).or_default();
        for alias in aliases {
            let alias = alias.to_lowercase();
            if !list.contains(&alias) {
                list.push(alias);
            }
        }
        self
    }

    /// Aliases registered for a canonical name (lowercased).
    pub fn aliases_for(&self, canonical: &str) -> &[String] {
        self.entries
            .get(canonical)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Whether `key` is a known alternate spelling of `canonical`.
    pub fn matches(&self, canonical: &str, key: &str) -> bool {
        if key == canonical {
            return false;
        }
        if key.eq_ignore_ascii_case(canonical) {
            return true;
        }
        let key = key.to_lowercase();
        self.aliases_for(canonical).iter().any(|a| *a == key)
    }

    /// Suggest corrections for required parameters absent from `raw`.
    ///
    /// One suggestion per (spec, raw key) match, ordered by spec declaration
    /// order, then raw key order.
    pub fn suggest(&self, raw: &Map<String, Value>, specs: &[ParameterSpec]) -> Vec<String> {
        let mut suggestions = Vec::new();
        for spec in specs.iter().filter(|s| s.required) {
            if !matches!(lookup(raw, &spec.name), Lookup::Absent) {
                continue;
            }
            for key in raw.keys() {
                if self.matches(&spec.name, key) {
                    suggestions.push(format!(
                        "Did you mean '{}' instead of '{}'?",
                        spec.name, key
                    ));
                }
            }
        }
        suggestions
    }

    /// Aliases for every parameter name used by the AWS tool catalog.
    pub fn aws_defaults() -> Self {
        Self::new()
            .with_aliases(
                "dbInstanceIdentifier",
                &[
                    "db_identifier",
                    "dbIdentifier",
                    "db_instance_identifier",
                    "dbInstanceId",
                    "db_instance_id",
                    "instanceIdentifier",
                    "instance_identifier",
                    "instanceId",
                    "instance_id",
                    "dbInstance",
                    "db_instance",
                    "dbName",
                ],
            )
            .with_aliases(
                "bucket",
                &["bucketName", "bucket_name", "s3Bucket", "s3_bucket", "bucketId"],
            )
            .with_aliases("key", &["objectKey", "object_key", "s3Key", "s3_key", "path"])
            .with_aliases("text", &["body", "content", "data"])
            .with_aliases(
                "logGroup",
                &["logGroupName", "log_group", "log_group_name", "logGroupNames"],
            )
            .with_aliases("query", &["queryString", "query_string", "insightsQuery"])
            .with_aliases("sql", &["sqlQuery", "sql_query", "statement", "queryString"])
            .with_aliases("database", &["databaseName", "database_name", "db", "catalogDatabase"])
            .with_aliases("workgroup", &["workGroup", "work_group", "workgroupName"])
            .with_aliases("cluster", &["clusterName", "cluster_name", "clusterArn", "cluster_arn"])
            .with_aliases(
                "repositoryName",
                &["repository", "repository_name", "repo", "repoName", "repo_name"],
            )
            .with_aliases("resourceArn", &["resource_arn", "clusterArn", "dbClusterArn"])
            .with_aliases("secretArn", &["secret_arn", "secretId", "secretsManagerArn"])
            .with_aliases("start", &["startDate", "start_date", "from", "startTime"])
            .with_aliases("end", &["endDate", "end_date", "to", "endTime"])
            .with_aliases("toolName", &["tool", "tool_name", "name"])
            .with_aliases("parameters", &["params", "arguments", "args", "input"])
    }
}
