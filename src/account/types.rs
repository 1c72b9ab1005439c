//! Account record definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::auth::KdfParams;

/// Record identity used by the document store
pub type AccountId = Uuid;

/// Class assigned when registration does not name one
pub const DEFAULT_CLASS: &str = "guest";

/// Text form of "no active session"
pub const SENTINEL_TOKEN: &str = "null";

/// Session token slot. At most one token is active per account.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub enum TokenState {
    #[default]
    Absent,
    Active(Vec<u8>),
}

impl TokenState {
    pub fn is_active(&self) -> bool {
        matches!(self, TokenState::Active(_))
    }

    pub fn active_bytes(&self) -> Option<&[u8]> {
        match self {
            TokenState::Active(bytes) => Some(bytes),
            TokenState::Absent => None,
        }
    }

    /// Byte form as kept in the document schema: the sentinel
    /// text for `Absent`, the raw derived key otherwise.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            TokenState::Active(bytes) => bytes,
            TokenState::Absent => SENTINEL_TOKEN.as_bytes(),
        }
    }
}

/// User account record
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub name: String,
    pub class: String,

    // Credentials. Only the store writes these.
    pub(crate) password: Vec<u8>, // derived key once registered
    pub(crate) salt: Vec<u8>,
    pub(crate) token: TokenState,
    /// Derivation settings in force when the password was hashed.
    pub(crate) kdf: KdfParams,

    pub(crate) join_date: DateTime<Utc>,
    pub login_date: DateTime<Utc>,
    pub login_count: u64,
}

impl Account {
    /// Build an unsaved record holding the plaintext password. Registration
    /// replaces it with a derived key before anything is persisted.
    pub fn new(
        email: impl Into<String>,
        name: impl Into<String>,
        class: impl Into<String>,
        raw_password: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        let class = class.into();
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            name: name.into(),
            class: if class.trim().is_empty() {
                DEFAULT_CLASS.to_string()
            } else {
                class
            },
            password: raw_password.into().into_bytes(),
            salt: Vec::new(),
            token: TokenState::Absent,
            kdf: KdfParams::default(),
            join_date: now,
            login_date: now,
            login_count: 0,
        }
    }

    pub fn password_key(&self) -> &[u8] {
        &self.password
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn token(&self) -> &TokenState {
        &self.token
    }

    pub fn kdf_params(&self) -> &KdfParams {
        &self.kdf
    }

    pub fn join_date(&self) -> DateTime<Utc> {
        self.join_date
    }

    pub fn has_active_token(&self) -> bool {
        self.token.is_active()
    }
}
