//! Deskmate CLI, the main entry point.
//!
//! Commands:
//! - `onboard`: create the config and data directories and a default config
//! - `serve`: start the HTTP gateway and web frontend
//! - `register`: create an account from the shell
//! - `status`: show the effective configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "deskmate",
    about = "Deskmate: a personal assistant for documents, schedules and chat",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and the data directory
    Onboard,

    /// Start the HTTP gateway and web frontend
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create an account
    Register {
        username: String,

        #[arg(short, long, env = "DESKMATE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Show the effective configuration
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Register { username, password } => {
            commands::register::run(&username, &password).await?
        }
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
