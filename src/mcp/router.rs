//! Top-level MCP router: routes by JSON-RPC method, delegates to handlers.

use crate::gateway::Gateway;
use crate::mcp::handlers;
use crate::tools::DispatchError;
use crate::types::{Error, Result, ServerConfig};
use serde_json::{json, Value};

/// Result from routing a request.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteResponse {
    /// `result` member of the response.
    Reply(Value),
    /// Acknowledged notification; nothing goes on the wire.
    NoReply,
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut error = json!({ "code": self.code, "message": self.message });
        if let Some(data) = &self.data {
            error["data"] = data.clone();
        }
        error
    }
}

impl From<Error> for RpcError {
    fn from(err: Error) -> Self {
        Self {
            code: err.to_rpc_code(),
            message: err.to_string(),
            data: Some(json!({ "code": err.to_error_code() })),
        }
    }
}

impl From<DispatchError> for RpcError {
    fn from(err: DispatchError) -> Self {
        Self {
            code: err.code().rpc_code(),
            message: err.guidance(),
            data: serde_json::to_value(err.diagnostic()).ok(),
        }
    }
}

/// Route a JSON-RPC request to the appropriate handler.
pub async fn route_request(
    gateway: &Gateway,
    server: &ServerConfig,
    method: &str,
    params: Value,
) -> std::result::Result<RouteResponse, RpcError> {
    match method {
        "initialize" => Ok(RouteResponse::Reply(handlers::session::initialize(server, &params))),
        "notifications/initialized" | "notifications/cancelled" => Ok(RouteResponse::NoReply),
        "ping" => Ok(RouteResponse::Reply(json!({}))),
        "tools/list" => Ok(RouteResponse::Reply(handlers::tools::list(gateway))),
        "tools/call" => handlers::tools::call(gateway, &params)
            .await
            .map(RouteResponse::Reply),
        _ => Err(Error::not_found(format!("Method not found: {}", method)).into()),
    }
}

pub fn success_response(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

pub fn error_response(id: Value, error: &RpcError) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": error.to_json() })
}

// =============================================================================
// Shared helpers — used by all handler modules
// =============================================================================

pub fn str_field(body: &Value, key: &str) -> Result<String> {
    body.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| Error::validation(format!("Missing required field: {}", key)))
}
