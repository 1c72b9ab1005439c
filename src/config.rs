use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::account::auth::{KdfParams, KDF_ITERATIONS, KEY_LEN, SALT_LEN};
use crate::crypto::HashAlgorithm;
use crate::storage::ACCOUNT_COLLECTION;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AccountsConfig {
    pub storage: StorageConfig,
    #[serde(default)]
    pub crypto: CryptoConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StorageConfig {
    pub db_path: String,
    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_collection() -> String {
    ACCOUNT_COLLECTION.to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CryptoConfig {
    pub salt_len: usize,
    pub iterations: u32,
    pub key_len: usize,
    pub algorithm: HashAlgorithm,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            salt_len: SALT_LEN,
            iterations: KDF_ITERATIONS,
            key_len: KEY_LEN,
            algorithm: HashAlgorithm::Sha512,
        }
    }
}

impl CryptoConfig {
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            salt_len: self.salt_len,
            iterations: self.iterations,
            key_len: self.key_len,
            algorithm: self.algorithm,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                db_path: "./data/accounts".to_string(),
                collection: default_collection(),
            },
            crypto: CryptoConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl AccountsConfig {
    pub fn load_or_default(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            match std::fs::read_to_string(path) {
                Ok(s) => match toml::from_str(&s) {
                    Ok(c) => {
                        info!("Config loaded from {}", path);
                        c
                    }
                    Err(e) => {
                        warn!("Error parsing config: {}. Using defaults.", e);
                        Self::default()
                    }
                },
                Err(e) => {
                    warn!("Error reading config: {}. Using defaults.", e);
                    Self::default()
                }
            }
        } else {
            info!("Config file not found at '{}'. Creating default.", path);
            let config = Self::default();
            if let Ok(s) = toml::to_string_pretty(&config) {
                if let Err(e) = std::fs::write(path, s) {
                    warn!("Could not write default config to '{}': {}", path, e);
                }
            }
            config
        }
    }
}
