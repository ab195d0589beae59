//! API key authentication for story clients.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

/// Represents an API key with its metadata.
#[derive(Debug, Clone)]
pub struct ApiKeyInfo {
    /// Unique identifier for this key.
    pub key_id: String,
    /// Client application the key was issued to.
    pub client_id: String,
}

/// API key validator.
///
/// Keys are fixed at startup, so the map is shared read-only.
#[derive(Clone)]
pub struct ApiKeyValidator {
    /// Map of hashed keys to their info.
    keys: Arc<HashMap<String, ApiKeyInfo>>,
}

impl ApiKeyValidator {
    /// Create a new validator with initial keys from config.
    pub fn new(configured_keys: Vec<ConfiguredApiKey>) -> Self {
        let keys: HashMap<String, ApiKeyInfo> = configured_keys
            .into_iter()
            .map(|key| {
                (
                    Self::hash_key(&key.key),
                    ApiKeyInfo {
                        key_id: key.id,
                        client_id: key.client_id,
                    },
                )
            })
            .collect();

        Self {
            keys: Arc::new(keys),
        }
    }

    /// Hash an API key for storage and comparison.
    pub fn hash_key(key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Validate an API key and return its info if valid.
    pub fn validate(&self, key: &str) -> Option<ApiKeyInfo> {
        self.keys.get(&Self::hash_key(key)).cloned()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// API key configuration from config file.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ConfiguredApiKey {
    /// Unique ID for the key.
    pub id: String,
    /// The actual API key value.
    pub key: String,
    /// Client application ID.
    pub client_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(id: &str, key: &str, client_id: &str) -> ConfiguredApiKey {
        ConfiguredApiKey {
            id: id.to_string(),
            key: key.to_string(),
            client_id: client_id.to_string(),
        }
    }

    #[test]
    fn test_api_key_validation() {
        let validator =
            ApiKeyValidator::new(vec![configured("key-1", "sk-test-key-12345", "story-app")]);

        let result = validator.validate("sk-test-key-12345");
        assert_eq!(result.unwrap().client_id, "story-app");

        assert!(validator.validate("wrong-key").is_none());
        assert!(ApiKeyValidator::new(Vec::new()).is_empty());
        assert_eq!(validator.len(), 1);
    }

    #[test]
    fn test_multiple_keys_map_to_their_clients() {
        let validator = ApiKeyValidator::new(vec![
            configured("key-1", "sk-reader", "reader-app"),
            configured("key-2", "sk-classroom", "classroom-app"),
        ]);

        let info = validator.validate("sk-classroom").unwrap();
        assert_eq!(info.key_id, "key-2");
        assert_eq!(info.client_id, "classroom-app");
        assert_eq!(validator.len(), 2);
    }

    #[test]
    fn test_clones_share_the_same_keys() {
        let validator = ApiKeyValidator::new(vec![configured("key-1", "sk-reader", "reader-app")]);
        let shared = validator.clone();

        assert!(Arc::ptr_eq(&validator.keys, &shared.keys));
        assert_eq!(shared.validate("sk-reader").unwrap().key_id, "key-1");
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let hashed = ApiKeyValidator::hash_key("abc");
        assert_eq!(
            hashed,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
