//! Completion client abstraction
//!
//! A [`CompletionClient`] turns one user message into one assistant reply.
//! Requests are stateless: no earlier turns are sent.

use crate::config::CompletionConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub mod http;
pub use http::ChatCompletionClient;

/// Sends a single user turn to a language model and returns its reply
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Request a reply to `user_text`
    ///
    /// # Errors
    ///
    /// Returns `LuatbotError::Network` when the endpoint cannot be reached
    /// and `LuatbotError::Response` when it answers with a failure status,
    /// an unparsable body, or no reply content.
    async fn complete(&self, user_text: &str) -> Result<String>;
}

/// Build the HTTP completion client from configuration
///
/// # Errors
///
/// Returns `LuatbotError::MissingCredentials` when no API key is configured
pub fn create_client(config: &CompletionConfig) -> Result<Arc<dyn CompletionClient>> {
    Ok(Arc::new(ChatCompletionClient::new(config)?))
}
