pub mod account;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod storage;

pub use account::{Account, AccountStore, KdfParams, TokenState};
pub use error::{AccountError, Result};
