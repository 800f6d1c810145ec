//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.

use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// JSON-RPC 2.0 error codes used on the MCP wire.
pub mod rpc_code {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
}

/// Main error enum for the gateway.
#[derive(Error, Debug)]
pub enum Error {
    /// Validation errors (map to INVALID_PARAMS).
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found (map to METHOD_NOT_FOUND).
    #[error("not found: {0}")]
    NotFound(String),

    /// Static declarations that cannot be registered. Raised at startup only.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A remote capability call failed (AWS CLI exit status, malformed output).
    #[error("remote call failed: {0}")]
    Remote(String),

    /// Internal errors (map to INTERNAL_ERROR).
    #[error("internal error: {0}")]
    Internal(String),

    /// Timeout while waiting on a remote process.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Convert to a JSON-RPC error code.
    pub fn to_rpc_code(&self) -> i64 {
        match self {
            Error::Validation(_) => rpc_code::INVALID_PARAMS,
            Error::NotFound(_) => rpc_code::METHOD_NOT_FOUND,
            Error::Serialization(_) => rpc_code::PARSE_ERROR,
            Error::Configuration(_)
            | Error::Remote(_)
            | Error::Internal(_)
            | Error::Timeout(_)
            | Error::Io(_) => rpc_code::INTERNAL_ERROR,
        }
    }

    /// Stable machine-readable code string.
    pub fn to_error_code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "INVALID_ARGUMENT",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Configuration(_) => "CONFIGURATION",
            Error::Remote(_) => "REMOTE_FAILURE",
            Error::Internal(_) => "INTERNAL",
            Error::Timeout(_) => "DEADLINE_EXCEEDED",
            Error::Serialization(_) => "SERIALIZATION",
            Error::Io(_) => "IO",
        }
    }
}

// Convenience constructors
impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_codes() {
        assert_eq!(Error::validation("x").to_rpc_code(), rpc_code::INVALID_PARAMS);
        assert_eq!(Error::not_found("x").to_rpc_code(), rpc_code::METHOD_NOT_FOUND);
        assert_eq!(Error::remote("x").to_rpc_code(), rpc_code::INTERNAL_ERROR);
    }

    #[test]
    fn test_display_keeps_cause() {
        let err = Error::remote("AccessDenied: not authorized");
        assert_eq!(err.to_string(), "remote call failed: AccessDenied: not authorized");
        assert_eq!(err.to_error_code(), "REMOTE_FAILURE");
    }
}
