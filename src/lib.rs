//! # AWS Tool Gateway
//!
//! MCP server exposing AWS operations as schema-described tools:
//! - Declarative parameter specs with coercion, defaults and constraints
//! - Guided diagnostics (alias suggestions, example arguments) on bad input
//! - Bounded polling for asynchronous remote jobs (Athena, Logs Insights)
//! - Parameter pre-flight tool over the frozen registry
//!
//! ## Architecture
//!
//! ```text
//!                     ┌──────────────────────────────────┐
//!   stdin JSON-RPC →  │            McpServer             │  → stdout
//!                     │  ┌────────────────────────────┐  │
//!                     │  │   Gateway / Dispatcher     │  │
//!                     │  │ ┌──────────┐ ┌──────────┐  │  │
//!                     │  │ │ Registry │ │Validator │  │  │
//!                     │  │ └──────────┘ └──────────┘  │  │
//!                     │  └─────────────┬──────────────┘  │
//!                     │      tool handlers ── polling    │
//!                     └────────────────┬─────────────────┘
//!                                      ▼
//!                                AwsApi (AWS CLI)
//! ```

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod aws;
pub mod gateway;
pub mod mcp;
pub mod polling;
pub mod tools;
pub mod types;

// Internal utilities
pub mod observability;

pub use gateway::{Gateway, InvokeResult};
pub use types::{Config, Error, Result};
