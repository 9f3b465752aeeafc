//! `deskmate serve`: start the HTTP gateway.

use deskmate_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    if !config.has_api_key() {
        tracing::warn!("No API key configured; assistant calls will fail until one is set");
    }

    println!("Deskmate");
    println!("   Listening: http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   Data dir:  {}", config.storage.data_dir.display());

    deskmate_gateway::start(config).await?;

    Ok(())
}
