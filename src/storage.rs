//! Document persistence for account records.
//!
//! Both backends behave like a single document collection with a unique
//! index on `email`: `save` upserts by `id` and refuses to hand an email
//! that is already owned by another record to a second one.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use sled::transaction::{
    abort, ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
};
use sled::Transactional;
use std::sync::Mutex;
use tracing::debug;

use crate::account::types::{Account, AccountId};
use crate::error::StorageError;

/// Default collection name.
pub const ACCOUNT_COLLECTION: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountFilter {
    ById(AccountId),
    ByEmail(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_one(&self, filter: &AccountFilter) -> Result<Option<Account>, StorageError>;

    /// Insert or replace the record with the same `id`.
    async fn save(&self, account: &Account) -> Result<Account, StorageError>;
}

// --- In-memory backend ---

#[derive(Default)]
struct MemoryCollection {
    docs: HashMap<AccountId, Account>,
    emails: HashMap<String, AccountId>,
}

/// Process-local backend with no durability.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryCollection>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, StorageError> {
        self.inner
            .lock()
            .map(|c| c.docs.len())
            .map_err(|e| StorageError::DatabaseError(e.to_string()))
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_one(&self, filter: &AccountFilter) -> Result<Option<Account>, StorageError> {
        let coll = self
            .inner
            .lock()
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;
        let found = match filter {
            AccountFilter::ById(id) => coll.docs.get(id).cloned(),
            AccountFilter::ByEmail(email) => coll
                .emails
                .get(email)
                .and_then(|id| coll.docs.get(id))
                .cloned(),
        };
        Ok(found)
    }

    async fn save(&self, account: &Account) -> Result<Account, StorageError> {
        let mut coll = self
            .inner
            .lock()
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        if let Some(owner) = coll.emails.get(&account.email) {
            if *owner != account.id {
                return Err(StorageError::DuplicateKey {
                    field: "email",
                    value: account.email.clone(),
                });
            }
        }

        let previous_email = coll.docs.get(&account.id).map(|a| a.email.clone());
        if let Some(old) = previous_email {
            if old != account.email {
                coll.emails.remove(&old);
            }
        }

        coll.emails.insert(account.email.clone(), account.id);
        coll.docs.insert(account.id, account.clone());
        Ok(account.clone())
    }
}

// --- Sled backend ---

/// Embedded on-disk backend. Documents are bincode-encoded in a tree named
/// after the collection; `<collection>.email` maps email -> id.
pub struct SledStore {
    db: sled::Db,
    docs: sled::Tree,
    emails: sled::Tree,
}

impl SledStore {
    pub fn open(path: impl AsRef<Path>, collection: &str) -> Result<Self, StorageError> {
        let db = sled::open(path.as_ref())?;
        Self::from_db(db, collection)
    }

    pub fn from_db(db: sled::Db, collection: &str) -> Result<Self, StorageError> {
        let docs = db.open_tree(collection)?;
        let emails = db.open_tree(format!("{}.email", collection))?;
        Ok(Self { db, docs, emails })
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    fn get_by_id(&self, id: &AccountId) -> Result<Option<Account>, StorageError> {
        match self.docs.get(id.as_bytes())? {
            Some(data) => {
                let account = bincode::deserialize(&data)
                    .map_err(|e| StorageError::DeserializationError(e.to_string()))?;
                Ok(Some(account))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl DocumentStore for SledStore {
    async fn find_one(&self, filter: &AccountFilter) -> Result<Option<Account>, StorageError> {
        match filter {
            AccountFilter::ById(id) => self.get_by_id(id),
            AccountFilter::ByEmail(email) => match self.emails.get(email.as_bytes())? {
                Some(raw_id) => {
                    let id = AccountId::from_slice(&raw_id)
                        .map_err(|e| StorageError::DeserializationError(e.to_string()))?;
                    self.get_by_id(&id)
                }
                None => Ok(None),
            },
        }
    }

    /// The document and its email index entry commit in one transaction.
    async fn save(&self, account: &Account) -> Result<Account, StorageError> {
        let serialized = bincode::serialize(account)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        let id = &account.id.as_bytes()[..];
        let email = account.email.as_bytes();

        (&self.docs, &self.emails)
            .transaction(|(docs, emails)| -> ConflictableTransactionResult<(), StorageError> {
                if let Some(owner) = emails.get(email)? {
                    if &owner[..] != id {
                        return abort(StorageError::DuplicateKey {
                            field: "email",
                            value: account.email.clone(),
                        });
                    }
                }

                if let Some(data) = docs.get(id)? {
                    let previous: Account = bincode::deserialize(&data).map_err(|e| {
                        ConflictableTransactionError::Abort(StorageError::DeserializationError(
                            e.to_string(),
                        ))
                    })?;
                    if previous.email != account.email {
                        debug!("Releasing email index entry for {}", previous.email);
                        emails.remove(previous.email.as_bytes())?;
                    }
                }

                emails.insert(email, id)?;
                docs.insert(id, serialized.as_slice())?;
                Ok(())
            })
            .map_err(|e| match e {
                TransactionError::Abort(err) => err,
                TransactionError::Storage(err) => StorageError::from(err),
            })?;

        self.db.flush_async().await?;
        Ok(account.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn exercise_backend(store: &dyn DocumentStore) {
        let alice = Account::new("alice@example.com", "Alice", "guest", "pw");
        store.save(&alice).await.unwrap();

        let by_email = store
            .find_one(&AccountFilter::ByEmail("alice@example.com".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, alice.id);

        let by_id = store.find_one(&AccountFilter::ById(alice.id)).await.unwrap().unwrap();
        assert_eq!(by_id.email, "alice@example.com");

        assert!(store
            .find_one(&AccountFilter::ByEmail("nobody@example.com".into()))
            .await
            .unwrap()
            .is_none());

        // Upsert by id keeps the email claim
        let mut renamed = alice.clone();
        renamed.name = "Alice B".into();
        store.save(&renamed).await.unwrap();
        let reloaded = store.find_one(&AccountFilter::ById(alice.id)).await.unwrap().unwrap();
        assert_eq!(reloaded.name, "Alice B");

        // A second record may not take the same email
        let imposter = Account::new("alice@example.com", "Eve", "guest", "pw");
        match store.save(&imposter).await {
            Err(StorageError::DuplicateKey { field, .. }) => assert_eq!(field, "email"),
            other => panic!("expected duplicate key, got {:?}", other.map(|a| a.id)),
        }

        // Changing the email frees the old one
        let mut moved = reloaded.clone();
        moved.email = "alice@new.example.com".into();
        store.save(&moved).await.unwrap();
        assert!(store
            .find_one(&AccountFilter::ByEmail("alice@example.com".into()))
            .await
            .unwrap()
            .is_none());
        store.save(&imposter).await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryStore::new();
        exercise_backend(&store).await;
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_memory_store_reports_poisoned_lock() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let holder = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.inner.lock().unwrap();
            panic!("poison the collection lock");
        })
        .join();

        assert!(matches!(store.len(), Err(StorageError::DatabaseError(_))));
        assert!(store.is_empty().is_err());
    }

    #[tokio::test]
    async fn test_sled_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(dir.path().join("db"), ACCOUNT_COLLECTION).unwrap();
        exercise_backend(&store).await;
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_sled_failed_save_leaves_email_unclaimed() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(dir.path().join("db"), ACCOUNT_COLLECTION).unwrap();

        // An unreadable document already sits under this id
        let broken = Account::new("carol@example.com", "Carol", "guest", "pw");
        store
            .docs
            .insert(&broken.id.as_bytes()[..], &b"not bincode"[..])
            .unwrap();

        match store.save(&broken).await {
            Err(StorageError::DeserializationError(_)) => {}
            other => panic!("expected deserialization error, got {:?}", other.map(|a| a.id)),
        }
        assert!(store.emails.get("carol@example.com").unwrap().is_none());
        assert!(store
            .find_one(&AccountFilter::ByEmail("carol@example.com".into()))
            .await
            .unwrap()
            .is_none());

        let fresh = Account::new("carol@example.com", "Carol", "guest", "pw");
        store.save(&fresh).await.unwrap();
        let found = store
            .find_one(&AccountFilter::ByEmail("carol@example.com".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, fresh.id);
    }

    #[tokio::test]
    async fn test_sled_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db");
        let account = Account::new("bob@example.com", "Bob", "guest", "pw");
        {
            let store = SledStore::open(&path, ACCOUNT_COLLECTION).unwrap();
            store.save(&account).await.unwrap();
        }

        let store = SledStore::open(&path, ACCOUNT_COLLECTION).unwrap();
        let loaded = store
            .find_one(&AccountFilter::ByEmail("bob@example.com".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.id, account.id);
        assert_eq!(loaded.join_date(), account.join_date());
    }
}
