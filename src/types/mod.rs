//! Core types for the gateway.
//!
//! This module provides foundational types used throughout the system:
//! - **IDs**: Strongly-typed identifiers (RequestId, JobId)
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Configuration structures for the server, polling and AWS backend

mod config;
mod errors;
mod ids;

pub use config::{AwsConfig, Config, ObservabilityConfig, PollConfig, PollingConfig, ServerConfig};
pub use errors::{rpc_code, Error, Result};
pub use ids::{JobId, RequestId};
