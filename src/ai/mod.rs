//! AI reasoning collaborator.
//!
//! The escalation worker only depends on the [`ReasoningClient`] trait: it sends a
//! system prompt plus user content and gets raw completion text back. Provider
//! transports (Anthropic Messages, OpenAI-compatible chat completions) live
//! behind that seam and are selected by `ai.provider`.

mod anthropic;
mod config;
mod openai;

pub use anthropic::AnthropicClient;
pub use config::AiConfig;
pub use openai::OpenAiClient;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Message role within a completion request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Single chat message
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AiMessage {
    pub role: Role,
    pub content: String,
}

impl AiMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Completion request sent to a reasoning provider
#[derive(Clone, Debug)]
pub struct CompletionRequest {
    pub messages: Vec<AiMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Concatenated system messages (providers that take a separate system field)
    pub fn system_prompt(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }
}

/// Reasoning collaborator interface.
///
/// Implementations return the raw completion text; interpreting it (and
/// falling back when it is unusable) is the caller's job.
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    /// Provider identifier used in logs
    fn name(&self) -> &str;

    /// Run one completion and return the generated text
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Build the configured reasoning client.
///
/// Fails when the provider is unknown or its API key variable is unset.
pub fn build_client(config: &AiConfig) -> Result<Arc<dyn ReasoningClient>> {
    let api_key = std::env::var(&config.api_key_env)
        .with_context(|| format!("{} is not set", config.api_key_env))?;
    let timeout = Duration::from_secs(config.timeout_seconds);

    let client: Arc<dyn ReasoningClient> = match config.provider.as_str() {
        "anthropic" => Arc::new(AnthropicClient::new(
            api_key,
            config.model.clone(),
            config.base_url.clone(),
            timeout,
        )?),
        "openai" => Arc::new(OpenAiClient::new(
            api_key,
            config.model.clone(),
            config.base_url.clone(),
            timeout,
        )?),
        other => bail!("Unknown AI provider '{}'", other),
    };

    Ok(client)
}
