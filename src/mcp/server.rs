//! MCP stdio server: read loop, per-request tasks, single writer.

use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::gateway::Gateway;
use crate::mcp::codec::{read_message, write_message, Frame};
use crate::mcp::router::{self, error_response, success_response, RouteResponse, RpcError};
use crate::types::{rpc_code, ServerConfig};
use serde_json::{json, Value};

/// MCP server over one reader/writer pair.
#[derive(Debug)]
pub struct McpServer {
    gateway: Arc<Gateway>,
    config: Arc<ServerConfig>,
    cancel: CancellationToken,
}

impl McpServer {
    pub fn new(gateway: Arc<Gateway>, config: ServerConfig) -> Self {
        Self {
            gateway,
            config: Arc::new(config),
            cancel: CancellationToken::new(),
        }
    }

    /// Serve stdin/stdout until EOF or shutdown.
    pub async fn serve_stdio(&self) -> io::Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Run the server until EOF on `reader`, cancellation, or a fatal I/O error.
    ///
    /// Requests run concurrently; responses are written in completion order
    /// by one writer task.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let mut reader = BufReader::new(reader);
        let (tx, rx) = mpsc::unbounded_channel::<Value>();
        let writer_task = tokio::spawn(write_loop(writer, rx));
        let mut in_flight = JoinSet::new();
        let mut outcome = Ok(());

        tracing::info!(
            "MCP server ready (name={}, max_message_bytes={})",
            self.config.name,
            self.config.max_message_bytes,
        );

        loop {
            while let Some(joined) = in_flight.try_join_next() {
                if let Err(e) = joined {
                    tracing::error!("Request task failed: {}", e);
                }
            }

            let frame = tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("MCP server shutting down");
                    in_flight.abort_all();
                    break;
                }
                frame = read_message(&mut reader, self.config.max_message_bytes) => frame,
            };

            match frame {
                Ok(None) => {
                    tracing::debug!("stdin closed, draining {} in-flight request(s)", in_flight.len());
                    while in_flight.join_next().await.is_some() {}
                    break;
                }
                Ok(Some(Frame::Oversized(len))) => {
                    tracing::warn!("Dropped {} byte message (limit {})", len, self.config.max_message_bytes);
                    let error = RpcError::new(
                        rpc_code::INVALID_REQUEST,
                        format!("Message too large: {} bytes (limit {})", len, self.config.max_message_bytes),
                    );
                    let _ = tx.send(error_response(Value::Null, &error));
                }
                Ok(Some(Frame::Message(line))) => {
                    if !line.trim().is_empty() {
                        self.accept(&line, &tx, &mut in_flight);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    let error = RpcError::new(rpc_code::PARSE_ERROR, format!("Parse error: {}", e));
                    let _ = tx.send(error_response(Value::Null, &error));
                }
                Err(e) => {
                    in_flight.abort_all();
                    outcome = Err(e);
                    break;
                }
            }
        }

        drop(tx);
        match writer_task.await {
            Ok(written) => outcome.and(written),
            Err(e) => Err(io::Error::other(e)),
        }
    }

    /// Parse one line and spawn its handler.
    fn accept(&self, line: &str, tx: &mpsc::UnboundedSender<Value>, in_flight: &mut JoinSet<()>) {
        let request: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                let error = RpcError::new(rpc_code::PARSE_ERROR, format!("Parse error: {}", e));
                let _ = tx.send(error_response(Value::Null, &error));
                return;
            }
        };

        let id = request.get("id").cloned();
        let method = match check_envelope(&request) {
            Ok(method) => method,
            Err(error) => {
                let _ = tx.send(error_response(id.unwrap_or(Value::Null), &error));
                return;
            }
        };
        let params = request.get("params").cloned().unwrap_or(Value::Null);

        let gateway = self.gateway.clone();
        let config = self.config.clone();
        let tx = tx.clone();
        in_flight.spawn(async move {
            let result = router::route_request(&gateway, &config, &method, params).await;
            let Some(id) = id else {
                if let Err(e) = result {
                    tracing::debug!("Notification '{}' failed: {}", method, e.message);
                }
                return;
            };
            let response = match result {
                Ok(RouteResponse::Reply(value)) => success_response(id, value),
                Ok(RouteResponse::NoReply) => success_response(id, json!({})),
                Err(error) => {
                    tracing::debug!(method = %method, code = error.code, "Request failed");
                    error_response(id, &error)
                }
            };
            let _ = tx.send(response);
        });
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

fn check_envelope(request: &Value) -> Result<String, RpcError> {
    if request.is_array() {
        return Err(RpcError::new(rpc_code::INVALID_REQUEST, "Batch requests are not supported"));
    }
    if request.get("jsonrpc").and_then(|v| v.as_str()) != Some("2.0") {
        return Err(RpcError::new(rpc_code::INVALID_REQUEST, "Invalid request: jsonrpc must be \"2.0\""));
    }
    request
        .get("method")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| RpcError::new(rpc_code::INVALID_REQUEST, "Invalid request: missing method"))
}

async fn write_loop<W: AsyncWrite + Unpin>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Value>) -> io::Result<()> {
    while let Some(message) = rx.recv().await {
        write_message(&mut writer, &message).await?;
    }
    Ok(())
}
