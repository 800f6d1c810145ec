//! Configuration structures.
//!
//! Configuration is loaded from environment variables and command-line flags
//! by the binary; library users construct it directly.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Global gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server identity advertised during MCP `initialize`.
    #[serde(default)]
    pub server: ServerConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Deadlines for tools that wrap asynchronous remote jobs.
    #[serde(default)]
    pub polling: PollingConfig,

    /// Remote backend configuration.
    #[serde(default)]
    pub aws: AwsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Name reported in `serverInfo`.
    pub name: String,

    /// Version reported in `serverInfo`.
    pub version: String,

    /// Longest accepted JSON-RPC line on stdin, in bytes.
    pub max_message_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "mcp-aws".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            max_message_bytes: 4 * 1024 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Deadline and interval for one family of polled operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Wall-clock budget measured from a successful submit.
    #[serde(with = "humantime_serde")]
    pub deadline: Duration,

    /// Wait between poll steps.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl PollConfig {
    /// Default wait between poll steps.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

    pub fn new(deadline: Duration) -> Self {
        Self {
            deadline,
            interval: Self::DEFAULT_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Same interval, different deadline (per-call override).
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}

/// Per-family polling configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Athena query execution (default: 60s).
    pub athena: PollConfig,

    /// CloudWatch Logs Insights query (default: 45s).
    pub logs_insights: PollConfig,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            athena: PollConfig::new(Duration::from_millis(60_000)),
            logs_insights: PollConfig::new(Duration::from_millis(45_000)),
        }
    }
}

/// AWS backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Path or name of the AWS CLI executable.
    pub cli_path: String,

    /// Region passed as `--region` when set.
    pub region: Option<String>,

    /// Named profile passed as `--profile` when set.
    pub profile: Option<String>,

    /// Role assumed by `aws_sts_assume_role` when the caller omits `roleArn`.
    pub default_role_arn: Option<String>,

    /// Upper bound on a single CLI invocation.
    #[serde(with = "humantime_serde")]
    pub call_timeout: Duration,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            cli_path: "aws".to_string(),
            region: None,
            profile: None,
            default_role_arn: None,
            call_timeout: Duration::from_secs(120),
        }
    }
}
