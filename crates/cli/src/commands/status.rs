//! `deskmate status`: show the effective configuration.

use deskmate_config::AppConfig;
use deskmate_store::CredentialStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("Deskmate Status");
    println!("===============");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Data dir:     {}", config.storage.data_dir.display());
    println!("  Provider:     {}", config.default_provider);
    println!("  Model:        {}", config.default_model);
    println!("  Language:     {}", config.response_language);
    println!("  Temperature:  {} (default)", config.default_temperature);
    println!(
        "  LLM policy:   {}s timeout, {} retries",
        config.llm.timeout_secs, config.llm.max_retries
    );
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);
    println!(
        "  API key:      {}",
        if config.has_api_key() { "configured" } else { "missing" }
    );

    let accounts = if config.storage.data_dir.exists() {
        CredentialStore::new(&config.storage.data_dir).count()?
    } else {
        0
    };
    println!("  Accounts:     {accounts}");

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  Config file found");
    } else {
        println!("\n  No config file, run `deskmate onboard` first");
    }

    Ok(())
}
