//! Account module
//!
//! User account records and their authentication lifecycle:
//! - Registration with salted PBKDF2 password keys
//! - Password verification
//! - Single session token issuance, verification and revocation

pub mod types;
pub mod store;
pub mod auth;

pub use types::{Account, AccountId, TokenState, DEFAULT_CLASS, SENTINEL_TOKEN};
pub use store::AccountStore;
pub use auth::KdfParams;
