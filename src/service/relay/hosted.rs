//! Hosted chat-completion backend (OpenAI-compatible HTTP API).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::backend::{ChatTurn, ReplyBackend, UpstreamError};
use crate::config::RelayConfig;

/// Calls an OpenAI-style `chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct HostedBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl HostedBackend {
    /// Builds the backend and its HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialised.
    pub fn new(config: &RelayConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        if config.api_key.is_none() {
            tracing::warn!("LLM_API_KEY is not set; chat replies will fail");
        }
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl ReplyBackend for HostedBackend {
    fn name(&self) -> &'static str {
        "hosted"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    async fn reply(&self, context: &[ChatTurn]) -> Result<String, UpstreamError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(UpstreamError::NotConfigured("missing API key".to_string()));
        };

        let body = CompletionRequest {
            model: &self.model,
            messages: context,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .ok_or_else(|| UpstreamError::Malformed("no choices[0].message.content".to_string()))
    }
}
