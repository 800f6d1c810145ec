//! Model Context Protocol transport: newline-delimited JSON-RPC 2.0 on stdio.

pub mod codec;
pub mod handlers;
pub mod router;
pub mod server;

pub use server::McpServer;
