//! Main entry point for the album service CLI.

use album_service::{cli, server, settings::Settings, telemetry};
use anyhow::Result;
use clap::Parser;
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = cli::Cli::parse();

    // Load settings
    let mut settings = Settings::load()?;

    // Initialize logging
    telemetry::init(&settings.logging)?;

    // Execute the requested command
    match args.command {
        cli::Commands::Serve { addr, backend } => {
            settings.apply_serve_overrides(addr, backend);
            settings.validate()?;
            server::serve(&settings).await
        }
        cli::Commands::Config => {
            if let Err(e) = settings.validate() {
                warn!("Configuration cannot be served as-is: {}", e);
            }
            println!("{}", toml::to_string_pretty(&settings.redacted())?);
            Ok(())
        }
    }
}
