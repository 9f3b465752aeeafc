//! `deskmate onboard`: first-time setup.

use deskmate_config::AppConfig;
use std::path::Path;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();

    println!("Deskmate: First-Time Setup");
    println!("==========================\n");

    let created = setup(&config_dir)?;
    for line in &created {
        println!("  {line}");
    }

    let config_path = config_dir.join("config.toml");
    println!("\nNext steps:");
    println!("   1. Edit {} and add your API key", config_path.display());
    println!("      (or export DESKMATE_API_KEY / GROQ_API_KEY)");
    println!("   2. Run: deskmate serve");
    println!("   3. Open the printed address and sign up\n");

    Ok(())
}

/// Create the config directory, a default `config.toml` and the data
/// directory it names. Existing files are left alone.
///
/// Returns one line per step for display.
pub fn setup(config_dir: &Path) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut report = Vec::new();

    if config_dir.exists() {
        report.push(format!("Config directory exists: {}", config_dir.display()));
    } else {
        std::fs::create_dir_all(config_dir)?;
        report.push(format!("Created config directory: {}", config_dir.display()));
    }

    let config_path = config_dir.join("config.toml");
    if config_path.exists() {
        report.push(format!(
            "Config already exists at {} (left unchanged)",
            config_path.display()
        ));
    } else {
        std::fs::write(&config_path, AppConfig::default_toml(config_dir))?;
        report.push(format!("Created config.toml at {}", config_path.display()));
    }

    let config = AppConfig::load_from(&config_path)?;

    let data_dir = &config.storage.data_dir;
    if !data_dir.exists() {
        std::fs::create_dir_all(data_dir)?;
        report.push(format!("Created data directory: {}", data_dir.display()));
    }

    Ok(report)
}
