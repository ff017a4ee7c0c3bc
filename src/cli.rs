//! Command-line interface definition for Luatbot
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for the chat view, the about page, and the saved
//! chat listing.

use clap::{Parser, Subcommand};

/// Luatbot - Vietnamese legal-assistant chatbot
///
/// Ask questions about Vietnamese law from the terminal. Chats are saved
/// locally and can be resumed from the session list.
#[derive(Parser, Debug, Clone)]
#[command(name = "luatbot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to the chat history database
    #[arg(long, env = "LUATBOT_HISTORY_DB")]
    pub storage_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Luatbot
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the interactive chat view
    Chat {
        /// Print replies at once instead of revealing them character by character
        #[arg(long)]
        no_typing: bool,
    },

    /// Show information about this product
    About,

    /// List saved chats
    History,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            storage_path: None,
            command: Commands::Chat { no_typing: false },
        }
    }
}
