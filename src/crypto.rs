//! Cryptographic primitives consumed by the account store.
//!
//! The store only needs two things: secure random bytes and a deterministic
//! password-based key derivation. Both sit behind [`CryptoProvider`] so tests
//! and alternative backends can swap them out.

use hmac::Hmac;
use rand::rngs::OsRng;
use rand::RngCore; // Imported for try_fill_bytes
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha512};
use std::fmt;
use std::str::FromStr;

use crate::error::CryptoError;

/// Hash function backing the PBKDF2 HMAC.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha512" => Ok(HashAlgorithm::Sha512),
            other => Err(CryptoError::InvalidParams(format!(
                "unsupported hash algorithm '{}'",
                other
            ))),
        }
    }
}

pub trait CryptoProvider: Send + Sync {
    /// Fill a fresh buffer of `n` bytes from a secure entropy source.
    fn secure_random_bytes(&self, n: usize) -> Result<Vec<u8>, CryptoError>;

    /// Derive `output_len` bytes from `secret`. Must be deterministic for
    /// identical inputs.
    fn derive_key(
        &self,
        secret: &[u8],
        salt_text: &str,
        iterations: u32,
        output_len: usize,
        algorithm: HashAlgorithm,
    ) -> Result<Vec<u8>, CryptoError>;
}

/// OS entropy plus PBKDF2-HMAC.
#[derive(Debug, Default, Clone, Copy)]
pub struct Pbkdf2Crypto;

impl CryptoProvider for Pbkdf2Crypto {
    fn secure_random_bytes(&self, n: usize) -> Result<Vec<u8>, CryptoError> {
        let mut bytes = vec![0u8; n];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| CryptoError::Randomness(e.to_string()))?;
        Ok(bytes)
    }

    fn derive_key(
        &self,
        secret: &[u8],
        salt_text: &str,
        iterations: u32,
        output_len: usize,
        algorithm: HashAlgorithm,
    ) -> Result<Vec<u8>, CryptoError> {
        if iterations == 0 {
            return Err(CryptoError::InvalidParams("iterations must be > 0".into()));
        }
        if output_len == 0 {
            return Err(CryptoError::InvalidParams("output length must be > 0".into()));
        }

        let mut key = vec![0u8; output_len];
        match algorithm {
            HashAlgorithm::Sha256 => {
                pbkdf2::pbkdf2::<Hmac<Sha256>>(secret, salt_text.as_bytes(), iterations, &mut key)
            }
            HashAlgorithm::Sha512 => {
                pbkdf2::pbkdf2::<Hmac<Sha512>>(secret, salt_text.as_bytes(), iterations, &mut key)
            }
        }
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_bytes_length_and_variety() {
        let crypto = Pbkdf2Crypto;
        let a = crypto.secure_random_bytes(64).unwrap();
        let b = crypto.secure_random_bytes(64).unwrap();

        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let crypto = Pbkdf2Crypto;
        let k1 = crypto
            .derive_key(b"secret123", "c2FsdA==", 1_000, 64, HashAlgorithm::Sha512)
            .unwrap();
        let k2 = crypto
            .derive_key(b"secret123", "c2FsdA==", 1_000, 64, HashAlgorithm::Sha512)
            .unwrap();

        assert_eq!(k1, k2);
        assert_eq!(k1.len(), 64);
    }

    #[test]
    fn test_derivation_depends_on_inputs() {
        let crypto = Pbkdf2Crypto;
        let base = crypto
            .derive_key(b"secret123", "salt-a", 1_000, 32, HashAlgorithm::Sha512)
            .unwrap();
        let other_salt = crypto
            .derive_key(b"secret123", "salt-b", 1_000, 32, HashAlgorithm::Sha512)
            .unwrap();
        let other_alg = crypto
            .derive_key(b"secret123", "salt-a", 1_000, 32, HashAlgorithm::Sha256)
            .unwrap();

        assert_ne!(base, other_salt);
        assert_ne!(base, other_alg);
    }

    #[test]
    fn test_rejects_zero_iterations() {
        let crypto = Pbkdf2Crypto;
        assert!(crypto
            .derive_key(b"pw", "salt", 0, 64, HashAlgorithm::Sha512)
            .is_err());
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("SHA512".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha512);
        assert_eq!("sha256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert!("md5".parse::<HashAlgorithm>().is_err());
    }
}
