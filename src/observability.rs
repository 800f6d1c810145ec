//! Observability utilities.

use crate::types::ObservabilityConfig;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Initialize tracing subscriber once for the process.
///
/// Logs go to stderr; stdout belongs to the MCP protocol stream. The filter
/// comes from `RUST_LOG` when set, else from `config.log_level`. JSON output
/// is enabled by `config.json_logs` or `GATEWAY_LOG_FORMAT=json`.
pub fn init_tracing(config: &ObservabilityConfig) {
    TRACING_INIT.get_or_init(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
        let json = json_output(config, std::env::var("GATEWAY_LOG_FORMAT").ok().as_deref());

        let result = if json {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .try_init()
        };

        if let Err(err) = result {
            eprintln!("tracing init skipped: {err}");
        }
    });
}

/// JSON output when configured, or when the format variable says `json`.
fn json_output(config: &ObservabilityConfig, format_var: Option<&str>) -> bool {
    config.json_logs || format_var.is_some_and(|v| v.eq_ignore_ascii_case("json"))
}
