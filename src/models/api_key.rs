//! Shop API key issuing and hashing.
//!
//! API keys are the only credential a storefront sends. They are stored as
//! SHA-256 hashes; the plaintext is handed out once, at installation or at
//! rotation, and never read back from the database.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Every issued key starts with this marker so merchants can recognise it.
pub const API_KEY_PREFIX: &str = "vtr_";

/// Number of leading characters kept in clear for display.
const DISPLAY_PREFIX_LEN: usize = 12;

/// A freshly generated key together with what gets persisted.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedApiKey {
    /// Full key, e.g. `vtr_4f1c...` (68 characters)
    pub api_key: String,

    /// SHA-256 of `api_key`, 64 hex characters
    #[serde(skip)]
    pub key_hash: String,

    /// First characters of the key, safe to show in the dashboard
    pub api_key_prefix: String,
}

impl IssuedApiKey {
    /// Generate a new key from 32 random bytes.
    pub fn generate() -> Self {
        let bytes: [u8; 32] = rand::random();
        let api_key = format!("{API_KEY_PREFIX}{}", hex::encode(bytes));

        Self {
            key_hash: hash_api_key(&api_key),
            api_key_prefix: api_key[..DISPLAY_PREFIX_LEN].to_string(),
            api_key,
        }
    }
}

/// Hash a presented API key for lookup.
pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.trim().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_key_shape() {
        let issued = IssuedApiKey::generate();

        assert!(issued.api_key.starts_with(API_KEY_PREFIX));
        assert_eq!(issued.api_key.len(), API_KEY_PREFIX.len() + 64);
        assert_eq!(issued.key_hash.len(), 64);
        assert!(issued.api_key.starts_with(&issued.api_key_prefix));
        assert_eq!(issued.key_hash, hash_api_key(&issued.api_key));
    }

    #[test]
    fn test_keys_are_unique() {
        assert_ne!(
            IssuedApiKey::generate().api_key,
            IssuedApiKey::generate().api_key
        );
    }

    #[test]
    fn test_hash_ignores_surrounding_whitespace() {
        assert_eq!(hash_api_key(" vtr_abc\n"), hash_api_key("vtr_abc"));
        assert_ne!(hash_api_key("vtr_abc"), hash_api_key("vtr_abd"));
    }
}
