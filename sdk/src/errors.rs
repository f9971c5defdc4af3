//! Error types and handling
//!
//! This module provides the error types used throughout the Relay engine.
//! All errors implement the `RelayErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! # Recoverability
//!
//! An error is recoverable when the model itself could avoid it on a later
//! iteration by choosing a different action: naming a tool that exists,
//! supplying parameters of the right type, or calling a tool with inputs it
//! accepts. Completion failures and protocol violations are not recoverable.
//!
//! # Security
//!
//! Error messages never include API keys. Provider errors are scrubbed
//! before they are wrapped into `EngineError::LLMProvider`.

use thiserror::Error;

/// Trait for Relay error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait RelayErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to end users and does not contain
    /// secrets or raw model output.
    fn user_hint(&self) -> &str;

    /// Returns whether the model could recover from the error by acting
    /// differently on a later iteration.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: Invalid or missing configuration
/// - **Completion**: Provider failures and timeouts
/// - **Protocol**: Model output that does not follow the one-line contract
/// - **Tooling**: Unknown tools, coercion failures, tool invocation failures
/// - **Channel**: Failures talking to the tool server itself
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, RelayErrorExt};
///
/// let error = EngineError::UnknownTool("teleport".to_string());
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let fatal_error = EngineError::LLMTimeout;
/// assert!(!fatal_error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Completion errors
    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    #[error("LLM call timed out")]
    LLMTimeout,

    // Protocol errors
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    // Tool errors
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Type mismatch for {tool}.{param}: expected {expected}, got {value}")]
    TypeMismatch {
        tool: String,
        param: String,
        expected: String,
        value: String,
    },

    #[error("Not enough parameters provided for {tool}: missing '{param}'")]
    InsufficientParameters { tool: String, param: String },

    #[error("Too many parameters provided for {tool}: expected {expected}, got {got}")]
    ExtraParameters {
        tool: String,
        expected: usize,
        got: usize,
    },

    #[error("Tool {tool} failed: {message}")]
    ToolInvocation { tool: String, message: String },

    // Tool server errors
    #[error("Tool channel error: {0}")]
    ToolChannel(String),

    // Keyring errors
    #[error("Keyring error: {0}")]
    KeyringError(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Short machine-friendly name of the error kind, used in run reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::LLMProvider(_) => "completion_failure",
            Self::LLMTimeout => "completion_timeout",
            Self::MalformedResponse(_) => "malformed_response",
            Self::UnknownTool(_) => "unknown_tool",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::InsufficientParameters { .. } => "insufficient_parameters",
            Self::ExtraParameters { .. } => "extra_parameters",
            Self::ToolInvocation { .. } => "tool_invocation",
            Self::ToolChannel(_) => "tool_channel",
            Self::KeyringError(_) => "keyring",
            Self::Io(_) => "io",
        }
    }
}

impl RelayErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            // Configuration errors
            Self::Config(_) => "Check your config.toml file for errors",

            // Completion errors
            Self::LLMProvider(_) => "LLM provider unavailable. Check your API keys and network",
            Self::LLMTimeout => "LLM provider took too long to respond. Try again",

            // Protocol errors
            Self::MalformedResponse(_) => {
                "The model did not answer with a single-line FUNCTION_CALL or FINAL_ANSWER"
            }

            // Tool errors
            Self::UnknownTool(_) => "The model asked for a tool the server does not provide",
            Self::TypeMismatch { .. } => "A parameter could not be converted to its declared type",
            Self::InsufficientParameters { .. } => "The model supplied too few parameters",
            Self::ExtraParameters { .. } => "The model supplied more parameters than the tool takes",
            Self::ToolInvocation { .. } => "Tool operation failed",

            // Tool server errors
            Self::ToolChannel(_) => "Could not talk to the tool server. Check the [server] section",

            // Keyring errors
            Self::KeyringError(_) => "Failed to access secure storage. Set the key in the environment",

            // Generic IO error
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnknownTool(_)
                | Self::TypeMismatch { .. }
                | Self::InsufficientParameters { .. }
                | Self::ExtraParameters { .. }
                | Self::ToolInvocation { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harness_errors_are_recoverable() {
        assert!(EngineError::UnknownTool("x".into()).is_recoverable());
        assert!(EngineError::InsufficientParameters {
            tool: "add".into(),
            param: "b".into()
        }
        .is_recoverable());
        assert!(EngineError::ToolInvocation {
            tool: "add".into(),
            message: "boom".into()
        }
        .is_recoverable());
    }

    #[test]
    fn test_completion_and_protocol_errors_are_fatal() {
        assert!(!EngineError::LLMTimeout.is_recoverable());
        assert!(!EngineError::LLMProvider("down".into()).is_recoverable());
        assert!(!EngineError::MalformedResponse("nope".into()).is_recoverable());
        assert!(!EngineError::ToolChannel("closed".into()).is_recoverable());
    }

    #[test]
    fn test_error_messages() {
        let err = EngineError::InsufficientParameters {
            tool: "add".into(),
            param: "b".into(),
        };
        assert_eq!(
            err.to_string(),
            "Not enough parameters provided for add: missing 'b'"
        );

        let err = EngineError::TypeMismatch {
            tool: "add".into(),
            param: "a".into(),
            expected: "integer".into(),
            value: "\"two\"".into(),
        };
        assert!(err.to_string().contains("expected integer"));
        assert_eq!(err.kind(), "type_mismatch");
    }
}
