use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::error::{CodecError, Result};

pub const RECOMMENDED_KEY_LEN: usize = 32;

/// Pre-shared secret held by both issuer and verifier.
///
/// Read-only once built; clones share the same bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedKey {
    bytes: Arc<[u8]>,
}

impl SharedKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(CodecError::InvalidKey("key must not be empty".into()));
        }
        if bytes.len() < RECOMMENDED_KEY_LEN {
            warn!(
                "Shared key is only {} bytes, at least {} are recommended",
                bytes.len(),
                RECOMMENDED_KEY_LEN
            );
        }

        Ok(Self {
            bytes: Arc::from(bytes),
        })
    }

    pub fn from_hex(encoded: &str) -> Result<Self> {
        let bytes = hex::decode(encoded.trim())
            .map_err(|e| CodecError::InvalidKey(format!("key is not valid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    pub fn generate() -> Result<Self> {
        let mut bytes = [0u8; RECOMMENDED_KEY_LEN];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| CodecError::CryptoUnavailable(format!("OS randomness failed: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for SharedKey {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

// Never print key material.
impl fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedKey")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let key = SharedKey::generate().unwrap();
        assert_eq!(key.len(), RECOMMENDED_KEY_LEN);

        let parsed = SharedKey::from_hex(&key.to_hex()).unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn test_rejects_empty_and_bad_hex() {
        assert!(matches!(
            SharedKey::from_bytes(&[]),
            Err(CodecError::InvalidKey(_))
        ));
        assert!(matches!(
            SharedKey::from_hex("not hex"),
            Err(CodecError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_short_key_accepted() {
        let key = SharedKey::from_bytes(b"short").unwrap();
        assert_eq!(key.as_ref(), b"short");
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = SharedKey::from_bytes(&[0xab; 32]).unwrap();
        let printed = format!("{:?}", key);
        assert!(!printed.contains("ab"));
        assert!(printed.contains("32"));
    }

    #[test]
    fn test_generated_keys_differ() {
        let a = SharedKey::generate().unwrap();
        let b = SharedKey::generate().unwrap();
        assert_ne!(a, b);
    }
}
