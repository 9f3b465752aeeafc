//! `deskmate register`: create an account from the shell.

use deskmate_config::AppConfig;
use deskmate_store::CredentialStore;
use std::path::Path;

pub async fn run(username: &str, password: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    register(&config.storage.data_dir, username, password)?;
    println!("Account '{}' created.", username.trim());
    Ok(())
}

fn register(
    data_dir: &Path,
    username: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err("Username and password must not be empty".into());
    }

    std::fs::create_dir_all(data_dir)?;
    CredentialStore::new(data_dir).register(username, password)?;
    tracing::info!(username, "Account registered from the CLI");
    Ok(())
}
