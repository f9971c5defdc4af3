pub mod cache;
pub mod string;

pub use cache::SecretCache;
pub use string::SecretString;

use keyring::Entry;
use regex::Regex;
use sdk::errors::EngineError;
use std::sync::OnceLock;

/// SecretManager resolves API keys for the completion providers.
///
/// A key such as `gemini_api_key` is looked up in this order:
/// 1. The environment variable with the upper-cased name (`GEMINI_API_KEY`)
/// 2. The OS keychain entry under the manager's service name
///
/// Nothing is prompted for. A missing key is an error that names the
/// environment variable to set.
pub struct SecretManager {
    service_name: String,
}

/// Regex patterns for detecting common secret formats.
static SECRET_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

/// Initializes and returns the secret detection patterns.
///
/// Patterns match:
/// - Google API keys: AIza[0-9A-Za-z-_]{35}
/// - URL key parameters: key=... in a query string
/// - OpenAI-style keys: sk-[a-zA-Z0-9]{20,}
/// - Bearer tokens: Bearer\s+[^\s]{20,}
fn get_secret_patterns() -> &'static Vec<Regex> {
    SECRET_PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"AIza[0-9A-Za-z\-_]{35}").expect("Invalid Google pattern"),
            Regex::new(r"([?&])key=[^&\s)]+").expect("Invalid key parameter pattern"),
            Regex::new(r"sk-[a-zA-Z0-9\-_]{20,}").expect("Invalid OpenAI pattern"),
            Regex::new(r"Bearer\s+[^\s]{20,}").expect("Invalid Bearer pattern"),
        ]
    })
}

/// Scrubs secrets from text by replacing them with [REDACTED].
///
/// Provider errors can echo the request URL, and the Gemini URL carries the
/// API key as a query parameter, so all provider error text passes through
/// here before it is logged or wrapped.
///
/// # Examples
/// ```
/// use relay_engine::secrets::scrub;
///
/// let scrubbed = scrub("GET /models/x:generateContent?key=abc123 failed");
/// assert_eq!(scrubbed, "GET /models/x:generateContent?key=[REDACTED] failed");
/// ```
pub fn scrub(text: &str) -> String {
    let patterns = get_secret_patterns();
    let mut result = text.to_string();

    for (i, pattern) in patterns.iter().enumerate() {
        result = if i == 1 {
            pattern.replace_all(&result, "${1}key=[REDACTED]").to_string()
        } else {
            pattern.replace_all(&result, "[REDACTED]").to_string()
        };
    }

    result
}

impl SecretManager {
    /// Creates a new SecretManager with the given service name.
    ///
    /// The service name is used to namespace secrets in the OS keychain.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// Name of the environment variable consulted for `key`.
    pub fn env_var_name(key: &str) -> String {
        key.to_ascii_uppercase()
    }

    /// Retrieves a secret from the environment or the OS keychain.
    ///
    /// # Errors
    /// Returns `EngineError::KeyringError` if the secret is in neither place
    /// or keychain access fails
    pub fn get_secret(&self, key: &str) -> Result<String, EngineError> {
        let env_name = Self::env_var_name(key);
        if let Ok(value) = std::env::var(&env_name) {
            if !value.trim().is_empty() {
                tracing::debug!("Resolved secret '{}' from ${}", key, env_name);
                return Ok(value.trim().to_string());
            }
        }

        let entry = Entry::new(&self.service_name, key).map_err(|e| {
            EngineError::KeyringError(format!("Failed to create keyring entry: {}", e))
        })?;

        match entry.get_password() {
            Ok(secret) => {
                tracing::debug!("Retrieved secret '{}' from keychain", key);
                Ok(secret)
            }
            Err(keyring::Error::NoEntry) => Err(EngineError::KeyringError(format!(
                "Secret '{}' not found. Set ${} or store it in the keychain",
                key, env_name
            ))),
            Err(e) => Err(EngineError::KeyringError(format!(
                "Failed to retrieve secret '{}': {}",
                key, e
            ))),
        }
    }

    /// Stores a secret in the OS keychain.
    pub fn set_secret(&self, key: &str, value: &str) -> Result<(), EngineError> {
        let entry = Entry::new(&self.service_name, key).map_err(|e| {
            EngineError::KeyringError(format!("Failed to create keyring entry: {}", e))
        })?;

        entry.set_password(value).map_err(|e| {
            EngineError::KeyringError(format!("Failed to store secret '{}': {}", key, e))
        })?;

        tracing::info!("Stored secret '{}' in keychain", key);
        Ok(())
    }

    /// Removes a secret from the OS keychain.
    pub fn delete_secret(&self, key: &str) -> Result<(), EngineError> {
        let entry = Entry::new(&self.service_name, key).map_err(|e| {
            EngineError::KeyringError(format!("Failed to create keyring entry: {}", e))
        })?;

        entry.delete_password().map_err(|e| {
            EngineError::KeyringError(format!("Failed to delete secret '{}': {}", key, e))
        })
    }
}
