use super::Commands;
use crate::account::auth::encode_token;
use crate::account::{Account, AccountStore};
use crate::error::Result;

pub async fn handle_account_command(store: &AccountStore, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Register {
            email,
            name,
            class,
            password,
        } => {
            let account = store.register(&email, &name, &class, &password).await?;
            println!("Account '{}' registered.", account.email);
            print_account(&account);
        }
        Commands::Login { email, password } => {
            let account = store.find_by_email(&email).await?;
            let account = store.verify_password(account, &password).await?;
            let account = store.issue_token(account).await?;
            if let Some(token) = account.token().active_bytes() {
                println!("{}", encode_token(token));
            }
        }
        Commands::Verify { email, token } => {
            let account = store.find_by_email_and_token(&email, token.as_bytes()).await?;
            println!("Token valid for {}", account.email);
        }
        Commands::Logout { email, token } => {
            let account = store.find_by_email_and_token(&email, token.as_bytes()).await?;
            let account = store.revoke_token(account).await?;
            println!("Logged out {}", account.email);
        }
        Commands::Show { email } => {
            let account = store.find_by_email(&email).await?;
            print_account(&account);
        }
    }
    Ok(())
}

fn print_account(account: &Account) {
    println!("Id:         {}", account.id);
    println!("Email:      {}", account.email);
    println!("Name:       {}", account.name);
    println!("Class:      {}", account.class);
    println!("Joined:     {}", account.join_date().to_rfc3339());
    println!("Last login: {}", account.login_date.to_rfc3339());
    println!("Logins:     {}", account.login_count);
    println!("Session:    {}", if account.has_active_token() { "active" } else { "none" });
}
