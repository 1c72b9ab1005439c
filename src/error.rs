use thiserror::Error;

/// Errors raised by a [`crate::storage::DocumentStore`] backend.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Duplicate key: {field} '{value}' already exists")]
    DuplicateKey { field: &'static str, value: String },
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::DatabaseError(err.to_string())
    }
}

/// Errors raised by a [`crate::crypto::CryptoProvider`].
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Entropy source failed: {0}")]
    Randomness(String),
    #[error("Invalid derivation parameters: {0}")]
    InvalidParams(String),
    #[error("Derivation task failed: {0}")]
    Task(String),
}

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Validation failed on '{field}': {reason}")]
    ValidationFailure { field: &'static str, reason: String },
    #[error("Randomness failure: {0}")]
    RandomnessFailure(String),
    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[source] StorageError),
    #[error("Account not found")]
    NotFound,
    #[error("Lookup failure: {0}")]
    LookupFailure(#[source] StorageError),
    /// Deliberately carries no detail.
    #[error("Authentication failed")]
    AuthFailure,
    #[error("Crypto error: {0}")]
    Crypto(String),
}

impl AccountError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        AccountError::ValidationFailure {
            field,
            reason: reason.into(),
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            AccountError::PersistenceFailure(StorageError::DuplicateKey { .. })
        )
    }
}

impl From<CryptoError> for AccountError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Randomness(msg) => AccountError::RandomnessFailure(msg),
            other => AccountError::Crypto(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AccountError>;
