//! Relay SDK
//!
//! Shared library providing the tool vocabulary and error types for Relay.
//! This crate is used by the engine and by applications that embed it or
//! implement tool channels of their own.

/// Error types and handling
pub mod errors;

/// Tool descriptor and tool result types
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, RelayErrorExt};
pub use types::{ContentItem, ParamSpec, ParamType, ToolDescriptor, ToolResult};
