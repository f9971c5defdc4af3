//! LLM Provider Abstraction Layer
//!
//! The agent loop treats the language model as an opaque completion
//! function: one prompt string in, one text reply out. The `LLMProvider`
//! trait is that contract. Timeouts are imposed by the caller, not by the
//! provider.

use async_trait::async_trait;
use sdk::errors::EngineError;

pub mod gemini;
pub mod ollama;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<LLMError> for EngineError {
    fn from(err: LLMError) -> Self {
        match err {
            LLMError::Timeout => EngineError::LLMTimeout,
            other => EngineError::LLMProvider(crate::secrets::scrub(&other.to_string())),
        }
    }
}

/// LLM Provider trait that all providers must implement
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Returns the name of the provider (e.g., "gemini", "ollama")
    fn name(&self) -> &str;

    /// Generate a completion for a single prompt
    ///
    /// # Returns
    /// * `Ok(String)` - The raw reply text
    /// * `Err(LLMError)` - If the request fails
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the provider is currently healthy and available
    /// Default implementation returns true.
    async fn check_health(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_maps_to_llm_timeout() {
        let err: EngineError = LLMError::Timeout.into();
        assert!(matches!(err, EngineError::LLMTimeout));
    }

    #[test]
    fn test_provider_errors_are_scrubbed() {
        let err: EngineError =
            LLMError::NetworkError("request to /m:generateContent?key=hunter2 failed".into())
                .into();
        match err {
            EngineError::LLMProvider(msg) => {
                assert!(!msg.contains("hunter2"));
                assert!(msg.contains("Network error"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
