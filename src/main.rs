//! Luatbot - Vietnamese legal-assistant chatbot
//!
#![doc = "Main entry point for the Luatbot terminal client."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use luatbot::cli::{Cli, Commands};
use luatbot::commands;
use luatbot::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { no_typing } => {
            if no_typing {
                tracing::debug!("Typing effect disabled from CLI");
            }

            // Moves `config` into the handler (match arms are exclusive)
            commands::chat::run_chat(config, no_typing).await?;
            Ok(())
        }
        Commands::About => {
            commands::about::run_about();
            Ok(())
        }
        Commands::History => {
            tracing::info!("Starting history command");
            commands::history::run_history(&config)?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so they never interleave with the chat transcript.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "luatbot=debug" } else { "luatbot=warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
