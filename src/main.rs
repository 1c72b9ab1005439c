use clap::Parser;
use std::sync::Arc;
use tracing::error;

use rust_accounts::cli::{self, Cli};
use rust_accounts::config::AccountsConfig;
use rust_accounts::crypto::Pbkdf2Crypto;
use rust_accounts::logging;
use rust_accounts::storage::{DocumentStore, SledStore};
use rust_accounts::AccountStore;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = AccountsConfig::load_or_default(&cli.config);
    logging::init(&config.log.level);

    let storage: Arc<dyn DocumentStore> =
        match SledStore::open(&config.storage.db_path, &config.storage.collection) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                error!("Failed to open database at '{}': {}", config.storage.db_path, e);
                std::process::exit(1);
            }
        };

    let store = match AccountStore::init(storage, Arc::new(Pbkdf2Crypto), config.crypto.kdf_params()) {
        Ok(store) => store,
        Err(e) => {
            error!("Invalid [crypto] settings in '{}': {}", cli.config, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = cli::account::handle_account_command(&store, cli.command).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
