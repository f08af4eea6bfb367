//! Chat-completion backend
//!
//! `ChatBackend` is the seam between the turn controller and the model
//! server. `LmStudioClient` speaks the OpenAI `/chat/completions` protocol.

use async_trait::async_trait;
use reqwest::Client;

use crate::config::EndpointConfig;
use crate::error::{ChatError, Result};
use crate::types::{AssistantReply, ChatCompletion, ChatRequest};

/// Anything that can turn a request into the first choice's message
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: &ChatRequest<'_>) -> Result<AssistantReply>;
}

/// HTTP client for an OpenAI-compatible server (LM Studio by default)
#[derive(Debug, Clone)]
pub struct LmStudioClient {
    http: Client,
    url: String,
    api_key: String,
}

impl LmStudioClient {
    pub fn new(endpoint: &EndpointConfig) -> Result<Self> {
        let http = Client::builder().timeout(endpoint.timeout).build()?;
        Ok(Self {
            http,
            url: endpoint.completions_url(),
            api_key: endpoint.api_key.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChatBackend for LmStudioClient {
    async fn complete(&self, request: &ChatRequest<'_>) -> Result<AssistantReply> {
        tracing::debug!(
            model = request.model,
            messages = request.messages.len(),
            tools = request.tools.map(|t| t.len()).unwrap_or(0),
            "sending chat completion"
        );

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "endpoint returned an error status");
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletion = serde_json::from_str(&body)?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or(ChatError::EmptyChoices)
    }
}
