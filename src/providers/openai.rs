//! OpenAI-compatible chat-completion client.
//!
//! Speaks `POST /v1/chat/completions` with a system and a user message.
//! Works against OpenAI itself or any gateway exposing the same surface.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::traits::CompletionBackend;
use crate::prompt::BuiltPrompt;
use crate::{Result, ScriptoriumError};

/// Default base URL for the OpenAI API.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Client for an OpenAI-compatible chat-completion endpoint.
#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    http: Client,
    base_url: String,
}

impl OpenAiClient {
    /// Create a client for the public OpenAI API.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS)
    }

    /// Create a client with a custom base URL (gateways, wiremock).
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ScriptoriumError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.into(),
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Check response status and map to the error taxonomy.
    fn handle_response_errors(&self, response: &reqwest::Response, model: &str) -> Result<()> {
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }

        match status.as_u16() {
            401 => Err(ScriptoriumError::AuthenticationFailed),
            404 => Err(ScriptoriumError::ModelNotFound(model.to_string())),
            code => Err(ScriptoriumError::Api {
                status: code,
                message: format!("completion API error: {status}"),
            }),
        }
    }
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, prompt), fields(content_type = %prompt.content_type))]
    async fn complete(&self, model: &str, prompt: &BuiltPrompt) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&ChatCompletionRequest {
                model,
                messages: [
                    ChatMessage {
                        role: "system",
                        content: &prompt.system_prompt,
                    },
                    ChatMessage {
                        role: "user",
                        content: &prompt.user_message,
                    },
                ],
                max_tokens: prompt.max_tokens,
                temperature: prompt.temperature,
            })
            .send()
            .await
            .map_err(|e| ScriptoriumError::Http(e.to_string()))?;

        self.handle_response_errors(&response, model)?;

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ScriptoriumError::Http(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ScriptoriumError::EmptyResponse)
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
