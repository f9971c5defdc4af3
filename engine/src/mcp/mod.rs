//! Tool channel
//!
//! The agent talks to an external tool server through the `ToolChannel`
//! trait: initialize once, list the tools once, then call tools by name.
//! `McpClient` adapts an `rmcp` client session (the Model Context
//! Protocol) to that trait, and `stdio::spawn` connects one to a server
//! process over its stdin/stdout.

use std::time::Duration;

use async_trait::async_trait;
use sdk::errors::EngineError;
use sdk::types::{ToolDescriptor, ToolResult};
use serde_json::{Map, Value};

pub mod client;
pub mod stdio;

pub use client::McpClient;

/// Errors raised while talking to the tool server
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tool server closed the connection")]
    Closed,

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Tool server did not answer within {0:?}")]
    Timeout(Duration),
}

impl From<serde_json::Error> for ChannelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}

impl ChannelError {
    /// Wrap an error raised by `call_tool` as a tool invocation failure.
    pub fn into_invocation_error(self, tool: &str) -> EngineError {
        let message = match self {
            Self::Rpc { message, .. } => message,
            other => other.to_string(),
        };
        EngineError::ToolInvocation {
            tool: tool.to_string(),
            message,
        }
    }
}

impl From<ChannelError> for EngineError {
    fn from(err: ChannelError) -> Self {
        EngineError::ToolChannel(err.to_string())
    }
}

/// Request/response channel to a tool server.
///
/// Callers issue one request at a time; implementations may still be
/// shared behind an `Arc`.
#[async_trait]
pub trait ToolChannel: Send + Sync {
    /// Make sure the protocol handshake has completed.
    async fn initialize(&self) -> Result<(), ChannelError>;

    /// List every tool the server exposes, parameters in declaration order.
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ChannelError>;

    /// Invoke a tool with named, already coerced arguments.
    ///
    /// A result the server flags with `isError` is still a result.
    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolResult, ChannelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_error_keeps_server_message() {
        let err = ChannelError::Rpc {
            code: -32602,
            message: "Unknown tool: div".into(),
        }
        .into_invocation_error("div");
        assert_eq!(err.to_string(), "Tool div failed: Unknown tool: div");
    }

    #[test]
    fn test_transport_errors_become_channel_errors() {
        let err: EngineError = ChannelError::Closed.into();
        assert!(matches!(err, EngineError::ToolChannel(_)));

        let err = ChannelError::Timeout(Duration::from_secs(1)).into_invocation_error("add");
        assert!(matches!(err, EngineError::ToolInvocation { .. }));
    }
}
