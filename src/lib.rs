//! Luatbot - Vietnamese legal-assistant chatbot library
//!
//! This library provides the core functionality for the Luatbot terminal
//! client: persisted chat sessions, the remote completion client, and the
//! controller that sequences one question and one reply at a time.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `storage`: Key/value persistence (SQLite file or in-memory)
//! - `session`: Chat sessions, messages, and the session store
//! - `completion`: Completion client abstraction and HTTP implementation
//! - `controller`: Request sequencing, loading state, and notifications
//! - `ui`: Terminal rendering of the chat view
//! - `commands`: CLI command handlers and in-chat special commands
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use luatbot::completion::create_client;
//! use luatbot::controller::ChatController;
//! use luatbot::session::SessionStore;
//! use luatbot::storage::MemoryStorage;
//! use luatbot::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let client = create_client(&config.completion)?;
//!     let store = SessionStore::open(Box::new(MemoryStorage::new()), "chatHistory", 20);
//!     let mut controller = ChatController::new(store, client, &config.chat);
//!
//!     if let Some(reply) = controller.send_message("Luật đất đai 2024 có gì mới?").await {
//!         println!("{}", reply.text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod completion;
pub mod config;
pub mod controller;
pub mod error;
pub mod session;
pub mod storage;
pub mod ui;

// Re-export commonly used types
pub use completion::{ChatCompletionClient, CompletionClient};
pub use config::Config;
pub use controller::{ChatController, ChatState, Notification, PendingReply};
pub use error::{LuatbotError, Result};
pub use session::{ChatSession, Message, SessionStore};
pub use storage::{MemoryStorage, SqliteStorage, StorageBackend};

#[cfg(test)]
pub mod test_utils;
