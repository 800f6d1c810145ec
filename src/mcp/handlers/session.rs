//! Session handshake.

use crate::types::ServerConfig;
use serde_json::{json, Value};

/// Protocol revisions this server speaks, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-03-26", "2024-11-05"];

/// Fallback when the client asks for a revision we don't know.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

pub fn initialize(server: &ServerConfig, params: &Value) -> Value {
    let requested = params.get("protocolVersion").and_then(|v| v.as_str());
    let protocol_version = requested
        .filter(|v| SUPPORTED_PROTOCOL_VERSIONS.contains(v))
        .unwrap_or(DEFAULT_PROTOCOL_VERSION);

    tracing::info!(
        client = params.pointer("/clientInfo/name").and_then(|v| v.as_str()).unwrap_or("unknown"),
        protocol_version,
        "Session initialized"
    );

    json!({
        "protocolVersion": protocol_version,
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": { "name": server.name, "version": server.version },
    })
}
