//! AWS tool gateway - MCP stdio server entry point.
//!
//! Reads JSON-RPC requests on stdin, writes responses on stdout, logs to
//! stderr. Every AWS call goes through the AWS CLI.

use aws_tool_gateway::aws::AwsCli;
use aws_tool_gateway::mcp::McpServer;
use aws_tool_gateway::{Config, Gateway};
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "aws-tool-gateway", version, about = "MCP tool gateway for AWS operations")]
struct Args {
    /// Deadline for Athena queries, in milliseconds.
    #[arg(long, env = "MCP_ATHENA_TIMEOUT_MS", default_value_t = 60_000)]
    athena_timeout_ms: u64,

    /// Deadline for CloudWatch Logs Insights queries, in milliseconds.
    #[arg(long, env = "MCP_CW_TIMEOUT_MS", default_value_t = 45_000)]
    cw_timeout_ms: u64,

    /// Wait between job status polls, in milliseconds.
    #[arg(long, env = "MCP_POLL_INTERVAL_MS", default_value_t = 1_000)]
    poll_interval_ms: u64,

    /// Role used by aws_sts_assume_role when roleArn is omitted.
    #[arg(long, env = "MCP_AWS_DEFAULT_ROLE_ARN")]
    default_role_arn: Option<String>,

    /// AWS CLI executable.
    #[arg(long, env = "MCP_AWS_CLI", default_value = "aws")]
    aws_cli: String,

    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,

    #[arg(long, env = "AWS_PROFILE")]
    profile: Option<String>,

    /// Log at debug level unless RUST_LOG says otherwise ("1", "true", "yes", "on").
    #[arg(
        long,
        env = "DEBUG",
        action = ArgAction::Set,
        value_parser = FalseyValueParser::new(),
        num_args = 0..=1,
        default_value = "0",
        default_missing_value = "1"
    )]
    debug: bool,

    /// Log format: "compact" or "json".
    #[arg(long, env = "GATEWAY_LOG_FORMAT", default_value = "compact")]
    log_format: String,
}

impl Args {
    fn into_config(self) -> Config {
        let mut config = Config::default();
        let interval = Duration::from_millis(self.poll_interval_ms.max(1));

        config.polling.athena = config
            .polling
            .athena
            .with_deadline(Duration::from_millis(self.athena_timeout_ms))
            .with_interval(interval);
        config.polling.logs_insights = config
            .polling
            .logs_insights
            .with_deadline(Duration::from_millis(self.cw_timeout_ms))
            .with_interval(interval);

        config.aws.cli_path = self.aws_cli;
        config.aws.region = self.region.filter(|r| !r.is_empty());
        config.aws.profile = self.profile.filter(|p| !p.is_empty());
        config.aws.default_role_arn = self.default_role_arn.filter(|r| !r.is_empty());

        if self.debug {
            config.observability.log_level = "debug".to_string();
        }
        config.observability.json_logs = self.log_format.eq_ignore_ascii_case("json");
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Args::parse().into_config();

    aws_tool_gateway::observability::init_tracing(&config.observability);

    let api = Arc::new(AwsCli::new(config.aws.clone()));
    let gateway = Arc::new(Gateway::build(&config, api)?);
    let server = McpServer::new(gateway, config.server.clone());

    tracing::info!(
        "{} {} starting on stdio (athena={:?}, logs_insights={:?})",
        config.server.name,
        config.server.version,
        config.polling.athena.deadline,
        config.polling.logs_insights.deadline,
    );

    let cancel = server.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, shutting down");
            cancel.cancel();
        }
    });

    server.serve_stdio().await?;
    tracing::info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_flag_and_env() {
        let args = Args::try_parse_from(["aws-tool-gateway", "--debug"]).unwrap();
        assert!(args.debug);
        let args = Args::try_parse_from(["aws-tool-gateway", "--debug", "false"]).unwrap();
        assert!(!args.debug);

        // Only test in this binary that touches the process environment.
        std::env::set_var("DEBUG", "1");
        let config = Args::try_parse_from(["aws-tool-gateway"]).unwrap().into_config();
        assert_eq!(config.observability.log_level, "debug");

        std::env::set_var("DEBUG", "0");
        let config = Args::try_parse_from(["aws-tool-gateway"]).unwrap().into_config();
        assert_eq!(config.observability.log_level, "info");
        std::env::remove_var("DEBUG");
    }

    #[test]
    fn test_timeouts_map_to_poll_config() {
        let config = Args::try_parse_from([
            "aws-tool-gateway",
            "--athena-timeout-ms",
            "5000",
            "--poll-interval-ms",
            "250",
        ])
        .unwrap()
        .into_config();
        assert_eq!(config.polling.athena.deadline, Duration::from_millis(5000));
        assert_eq!(config.polling.athena.interval, Duration::from_millis(250));
        assert_eq!(config.polling.logs_insights.interval, Duration::from_millis(250));
    }
}
