//! Tool infrastructure: declarations, validation, guidance, registry, dispatch.
//!
//! ```text
//!   dispatch(name, args)
//!        │
//!        ▼
//!   ToolRegistry ──unknown──► DispatchError::UnknownTool
//!        │
//!        ▼
//!   Validator ──invalid──► AliasTable + diagnostics ──► DispatchError::InvalidInput
//!        │
//!        ▼
//!   ToolHandler ──err/panic──► DispatchError::ExecutionFailure
//!        │
//!        ▼
//!      output
//! ```

pub mod aliases;
pub mod catalog;
pub mod diagnostics;
pub mod dispatch;
pub mod preflight;
pub mod registry;
pub mod validation;

pub use aliases::AliasTable;
pub use catalog::{handler_fn, Constraints, ParamKind, ParameterSpec, ToolDefinition, ToolHandler};
pub use diagnostics::{Diagnostic, DiagnosticCode};
pub use dispatch::{DispatchError, Dispatcher};
pub use registry::{ToolRegistry, ToolSummary};
pub use validation::{ValidationOutcome, Validator};
