//! Credential helpers: field validation, KDF parameters, token seeds and
//! token canonicalization.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Datelike, Timelike, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use super::types::{Account, SENTINEL_TOKEN};
use crate::crypto::HashAlgorithm;
use crate::error::{AccountError, Result};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"\S+@\S+\.\S+").unwrap();
}

pub const SALT_LEN: usize = 64;
pub const KDF_ITERATIONS: u32 = 50_505;
pub const KEY_LEN: usize = 64;
pub const TOKEN_NONCE_LEN: usize = 16;

pub const MIN_SALT_LEN: usize = 16;
pub const MIN_KEY_LEN: usize = 32;
pub const MIN_ITERATIONS: u32 = 1_000;

/// Parameters shared by password hashing and token derivation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct KdfParams {
    pub salt_len: usize,
    pub iterations: u32,
    pub key_len: usize,
    pub algorithm: HashAlgorithm,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            salt_len: SALT_LEN,
            iterations: KDF_ITERATIONS,
            key_len: KEY_LEN,
            algorithm: HashAlgorithm::Sha512,
        }
    }
}

impl KdfParams {
    /// Reject settings too weak to protect passwords or tokens.
    pub fn validate(&self) -> Result<()> {
        if self.salt_len < MIN_SALT_LEN {
            return Err(AccountError::validation(
                "salt_len",
                format!("must be at least {} bytes", MIN_SALT_LEN),
            ));
        }
        if self.key_len < MIN_KEY_LEN {
            return Err(AccountError::validation(
                "key_len",
                format!("must be at least {} bytes", MIN_KEY_LEN),
            ));
        }
        if self.iterations < MIN_ITERATIONS {
            return Err(AccountError::validation(
                "iterations",
                format!("must be at least {}", MIN_ITERATIONS),
            ));
        }
        Ok(())
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Check the required fields of an unsaved record.
pub fn validate_new_account(account: &Account) -> Result<()> {
    if account.email.trim().is_empty() || !is_valid_email(&account.email) {
        return Err(AccountError::validation(
            "email",
            "The e-mail field cannot be empty.",
        ));
    }
    if account.password.is_empty() {
        return Err(AccountError::validation("password", "Password is required!"));
    }
    if account.name.trim().is_empty() {
        return Err(AccountError::validation("name", "Name is required!"));
    }
    if account.class.trim().is_empty() {
        return Err(AccountError::validation("class", "Class is required!"));
    }
    Ok(())
}

/// Salts enter the KDF as their base64 text.
pub fn salt_text(salt: &[u8]) -> String {
    STANDARD.encode(salt)
}

/// Seed for a session token: email, wall clock down to the millisecond, and
/// a random nonce so two issuances in the same millisecond still differ.
pub fn token_seed(email: &str, at: DateTime<Utc>, nonce: &[u8]) -> String {
    format!(
        "{}@{}-{}-{}/{}:{}:{}.{}#{}",
        email,
        at.year(),
        at.month(),
        at.day(),
        at.hour(),
        at.minute(),
        at.second(),
        at.timestamp_subsec_millis(),
        STANDARD.encode(nonce)
    )
}

/// Stable text form handed to clients.
pub fn encode_token(token: &[u8]) -> String {
    STANDARD.encode(token)
}

/// Reduce an incoming token to raw bytes. Accepts the raw key itself, its
/// base64 text, or that text wrapped in JSON quotes.
pub fn canonicalize_token(candidate: &[u8], expected_len: usize) -> Option<Vec<u8>> {
    if candidate.len() == expected_len {
        return Some(candidate.to_vec());
    }

    let text = std::str::from_utf8(candidate).ok()?.trim();
    let unquoted = if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        serde_json::from_str::<String>(text).ok()?
    } else {
        text.to_string()
    };

    if unquoted == SENTINEL_TOKEN {
        return None;
    }

    let decoded = STANDARD.decode(unquoted.trim()).ok()?;
    (decoded.len() == expected_len).then_some(decoded)
}

/// Constant-time byte equality.
pub fn keys_match(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}
