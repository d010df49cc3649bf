//! OpenAI-compatible chat completions gateway
//!
//! Talks to any endpoint implementing `POST {base_url}/chat/completions`,
//! such as the HuggingFace inference router.

use crate::config::FileLlmConfig;
use async_trait::async_trait;
use moviegraph_application::ports::llm_gateway::{CompletionRequest, GatewayError, LlmGateway};
use moviegraph_domain::Model;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Longest wait between two attempts
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Exponential backoff before retry `attempt` (1-based): 1s, 2s, 4s, ... capped
fn backoff_delay(attempt: u32) -> Duration {
    let secs = 2u64.saturating_pow(attempt.saturating_sub(1));
    Duration::from_secs(secs).min(MAX_BACKOFF)
}

/// Errors of a single chat completions call
#[derive(Error, Debug)]
pub enum ChatCompletionsError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {body}")]
    Api { status: StatusCode, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No choices in response")]
    NoChoices,
}

impl ChatCompletionsError {
    /// Rate limits, server errors and transport failures are worth retrying
    fn is_transient(&self) -> bool {
        match self {
            ChatCompletionsError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ChatCompletionsError::Api { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            ChatCompletionsError::Parse(_) | ChatCompletionsError::NoChoices => false,
        }
    }
}

impl From<ChatCompletionsError> for GatewayError {
    fn from(error: ChatCompletionsError) -> Self {
        match error {
            ChatCompletionsError::Http(e) if e.is_timeout() => GatewayError::Timeout,
            ChatCompletionsError::Http(e) if e.is_connect() => {
                GatewayError::ConnectionError(e.to_string())
            }
            ChatCompletionsError::NoChoices => GatewayError::EmptyResponse,
            other => GatewayError::RequestFailed(other.to_string()),
        }
    }
}

/// Connection settings for [`ChatCompletionsGateway`]
#[derive(Clone)]
pub struct ChatCompletionsConfig {
    pub base_url: String,
    pub model: Model,
    pub api_token: Option<String>,
    pub timeout: Option<Duration>,
    pub max_retries: u32,
}

impl fmt::Debug for ChatCompletionsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatCompletionsConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl ChatCompletionsConfig {
    /// Settings from the `[llm]` section
    pub fn from_config(config: &FileLlmConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.parse_model(),
            api_token: config.api_token.clone(),
            timeout: (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs)),
            max_retries: config.max_retries,
        }
    }
}

/// [`LlmGateway`] over an OpenAI-compatible HTTP API
pub struct ChatCompletionsGateway {
    config: ChatCompletionsConfig,
    client: Client,
}

impl ChatCompletionsGateway {
    pub fn new(config: ChatCompletionsConfig) -> Result<Self, ChatCompletionsError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Send a request with retry logic
    async fn send_request(
        &self,
        request: &CompletionRequest,
    ) -> Result<String, ChatCompletionsError> {
        let body = ChatCompletionsRequest::from_request(self.config.model.as_str(), request);
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                tokio::time::sleep(backoff_delay(attempt)).await;
            }

            match self.try_request(&body).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(
                        "Chat completion failed (attempt {}/{}), retrying: {}",
                        attempt,
                        self.config.max_retries + 1,
                        e
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_request(
        &self,
        body: &ChatCompletionsRequest<'_>,
    ) -> Result<String, ChatCompletionsError> {
        let mut request_builder = self.client.post(self.endpoint()).json(body);

        if let Some(token) = &self.config.api_token {
            request_builder = request_builder.bearer_auth(token);
        }

        let response = request_builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ChatCompletionsError::Api { status, body: text });
        }

        parse_completion(&text)
    }
}

#[async_trait]
impl LlmGateway for ChatCompletionsGateway {
    fn model(&self) -> &Model {
        &self.config.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        debug!(
            model = %self.config.model,
            prompt_bytes = request.prompt.len(),
            "Sending chat completion"
        );
        Ok(self.send_request(request).await?)
    }
}

/// Extract the first choice's text from a response body
fn parse_completion(body: &str) -> Result<String, ChatCompletionsError> {
    let response: ChatCompletionsResponse = serde_json::from_str(body)?;
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or(ChatCompletionsError::NoChoices)
}

// API request/response types

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

impl<'a> ChatCompletionsRequest<'a> {
    fn from_request(model: &'a str, request: &'a CompletionRequest) -> Self {
        Self {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}
