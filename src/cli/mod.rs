pub mod account;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rust_accounts")]
#[command(about = "Account store CLI", long_about = None)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "accounts.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a new account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "guest")]
        class: String,
        #[arg(long)]
        password: String,
    },
    /// Check the password and issue a session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Check a session token
    Verify {
        #[arg(long)]
        email: String,
        #[arg(long)]
        token: String,
    },
    /// Revoke the active session token
    Logout {
        #[arg(long)]
        email: String,
        #[arg(long)]
        token: String,
    },
    /// Print the public fields of an account
    Show {
        #[arg(long)]
        email: String,
    },
}
