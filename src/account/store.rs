//! Account storage and authentication lifecycle

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::auth::{
    canonicalize_token, keys_match, salt_text, token_seed, validate_new_account, KdfParams,
    TOKEN_NONCE_LEN,
};
use super::types::{Account, TokenState};
use crate::crypto::CryptoProvider;
use crate::error::{AccountError, Result};
use crate::storage::{AccountFilter, DocumentStore};

/// Registration, password checks and session tokens on top of a
/// [`DocumentStore`].
#[derive(Clone)]
pub struct AccountStore {
    storage: Arc<dyn DocumentStore>,
    crypto: Arc<dyn CryptoProvider>,
    params: KdfParams,
}

impl AccountStore {
    pub fn init(
        storage: Arc<dyn DocumentStore>,
        crypto: Arc<dyn CryptoProvider>,
        params: KdfParams,
    ) -> Result<Self> {
        params.validate()?;
        debug!(
            "Account store ready ({} x{}, {} byte keys)",
            params.algorithm, params.iterations, params.key_len
        );
        Ok(Self {
            storage,
            crypto,
            params,
        })
    }

    pub fn params(&self) -> &KdfParams {
        &self.params
    }

    /// Hash the password, generate the salt and persist a new account.
    pub async fn register(
        &self,
        email: &str,
        name: &str,
        class: &str,
        raw_password: &str,
    ) -> Result<Account> {
        let mut account = Account::new(email, name, class, raw_password);
        validate_new_account(&account)?;

        let salt = self.crypto.secure_random_bytes(self.params.salt_len)?;
        let key = self
            .derive(account.password.clone(), &salt, &self.params)
            .await?;
        account.salt = salt;
        account.password = key;
        account.kdf = self.params.clone();

        let saved = self
            .storage
            .save(&account)
            .await
            .map_err(AccountError::PersistenceFailure)?;

        info!("Registered account {} ({})", saved.email, saved.class);
        Ok(saved)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Account> {
        debug!("Looking up account {}", email);
        self.storage
            .find_one(&AccountFilter::ByEmail(email.to_string()))
            .await
            .map_err(AccountError::LookupFailure)?
            .ok_or(AccountError::NotFound)
    }

    /// Succeeds only if `candidate` derives to the stored password key under
    /// the settings recorded at registration.
    pub async fn verify_password(&self, account: Account, candidate: &str) -> Result<Account> {
        let derived = self
            .derive(candidate.as_bytes().to_vec(), &account.salt, &account.kdf)
            .await?;

        if keys_match(&derived, &account.password) {
            Ok(account)
        } else {
            warn!("Password rejected for {}", account.email);
            Err(AccountError::AuthFailure)
        }
    }

    /// Derive a fresh session token, replacing any active one.
    pub async fn issue_token(&self, mut account: Account) -> Result<Account> {
        let now = Utc::now();
        let nonce = self.crypto.secure_random_bytes(TOKEN_NONCE_LEN)?;
        let seed = token_seed(&account.email, now, &nonce);
        let token = self
            .derive(seed.into_bytes(), &account.salt, &account.kdf)
            .await?;

        account.token = TokenState::Active(token);
        account.login_date = now;

        let saved = self
            .storage
            .save(&account)
            .await
            .map_err(AccountError::PersistenceFailure)?;

        info!("Issued session token for {}", saved.email);
        Ok(saved)
    }

    /// Accepts the raw token, its base64 text, or JSON-quoted base64.
    pub fn verify_token(&self, account: Account, candidate: &[u8]) -> Result<Account> {
        let stored = match account.token.active_bytes() {
            Some(bytes) => bytes,
            None => return Err(AccountError::AuthFailure),
        };

        match canonicalize_token(candidate, stored.len()) {
            Some(bytes) if keys_match(&bytes, stored) => Ok(account),
            _ => Err(AccountError::AuthFailure),
        }
    }

    /// Lookup plus token check. Unknown email and bad token look identical.
    pub async fn find_by_email_and_token(&self, email: &str, candidate: &[u8]) -> Result<Account> {
        let account = self.find_by_email(email).await.map_err(|e| {
            debug!("Token lookup for {} failed: {}", email, e);
            AccountError::AuthFailure
        })?;

        self.verify_token(account, candidate).map_err(|e| {
            warn!("Token rejected for {}", email);
            e
        })
    }

    pub async fn revoke_token(&self, mut account: Account) -> Result<Account> {
        account.token = TokenState::Absent;

        let saved = self
            .storage
            .save(&account)
            .await
            .map_err(AccountError::PersistenceFailure)?;

        info!("Revoked session token for {}", saved.email);
        Ok(saved)
    }

    async fn derive(&self, secret: Vec<u8>, salt: &[u8], params: &KdfParams) -> Result<Vec<u8>> {
        let crypto = Arc::clone(&self.crypto);
        let params = params.clone();
        let salt = salt_text(salt);

        let key = tokio::task::spawn_blocking(move || {
            crypto.derive_key(
                &secret,
                &salt,
                params.iterations,
                params.key_len,
                params.algorithm,
            )
        })
        .await
        .map_err(|e| AccountError::Crypto(e.to_string()))??;

        Ok(key)
    }
}
