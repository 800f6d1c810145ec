//! MCP method handlers, one module per method family.

pub mod session;
pub mod tools;
