//! OpenAI-compatible chat-completions client

use super::CompletionClient;
use crate::config::CompletionConfig;
use crate::error::{LuatbotError, Result};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP client for an OpenAI-compatible `chat/completions` endpoint
pub struct ChatCompletionClient {
    client: Client,
    endpoint: String,
    model: String,
    system_prompt: String,
    api_key: String,
}

impl std::fmt::Debug for ChatCompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatTurn<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatTurn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl ChatCompletionClient {
    /// Create a new client
    ///
    /// # Arguments
    ///
    /// * `config` - Endpoint, model, persona and credential settings
    ///
    /// # Errors
    ///
    /// Returns `LuatbotError::MissingCredentials` when no API key is set,
    /// or `LuatbotError::Http` if the HTTP client cannot be built
    ///
    /// # Examples
    ///
    /// ```
    /// use luatbot::completion::ChatCompletionClient;
    /// use luatbot::config::CompletionConfig;
    ///
    /// let config = CompletionConfig {
    ///     api_key: Some("sk-test".to_string()),
    ///     ..CompletionConfig::default()
    /// };
    /// assert!(ChatCompletionClient::new(&config).is_ok());
    /// ```
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let api_key = config.api_key()?.to_string();

        let mut builder =
            Client::builder().user_agent(concat!("luatbot/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(LuatbotError::from)
            .context("Failed to create HTTP client")?;

        tracing::info!(
            "Initialized completion client: endpoint={}, model={}",
            config.endpoint,
            config.model
        );

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            api_key,
        })
    }

    /// Configured model identifier
    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request<'a>(&'a self, user_text: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [
                ChatTurn {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatTurn {
                    role: "user",
                    content: user_text,
                },
            ],
        }
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionClient {
    async fn complete(&self, user_text: &str) -> Result<String> {
        let request = self.build_request(user_text);

        tracing::debug!(model = %self.model, chars = user_text.chars().count(), "Sending completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Completion request failed: {}", e);
                LuatbotError::Network(format!("Completion request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Completion endpoint returned error {}: {}", status, error_text);
            return Err(LuatbotError::Response(format!(
                "Completion endpoint returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse completion response: {}", e);
            LuatbotError::Response(format!("Failed to parse completion response: {}", e))
        })?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                tracing::error!("Completion response contained no reply content");
                LuatbotError::Response("Completion response contained no reply content".into())
            })?;

        tracing::debug!(chars = content.chars().count(), "Received completion reply");
        Ok(content)
    }
}
