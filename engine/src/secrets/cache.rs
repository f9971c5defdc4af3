use crate::secrets::string::SecretString;
use crate::secrets::SecretManager;
use sdk::errors::EngineError;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// An in-memory cache in front of `SecretManager`.
///
/// Providers ask the cache for their key on every request; the environment
/// and keychain are only consulted on the first miss.
#[derive(Clone)]
pub struct SecretCache {
    manager: Arc<SecretManager>,
    cache: Arc<RwLock<HashMap<String, SecretString>>>,
}

impl SecretCache {
    /// Creates a new SecretCache wrapping the provided SecretManager
    pub fn new(manager: Arc<SecretManager>) -> Self {
        Self {
            manager,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Retrieves a secret, checking the memory cache first.
    pub fn get_secret(&self, key: &str) -> Result<SecretString, EngineError> {
        {
            let cache = self
                .cache
                .read()
                .map_err(|_| EngineError::KeyringError("secret cache lock poisoned".into()))?;
            if let Some(secret) = cache.get(key) {
                return Ok(secret.clone());
            }
        }

        let secret = SecretString::new(self.manager.get_secret(key)?);

        self.insert(key, secret.clone())?;

        Ok(secret)
    }

    /// Seeds the cache with a known value.
    pub fn insert(&self, key: &str, secret: SecretString) -> Result<(), EngineError> {
        let mut cache = self
            .cache
            .write()
            .map_err(|_| EngineError::KeyringError("secret cache lock poisoned".into()))?;
        cache.insert(key.to_string(), secret);
        Ok(())
    }

}
