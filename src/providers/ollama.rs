//! Local pipelines served by an Ollama-compatible inference server.
//!
//! Each [`OllamaPipeline`] binds one task to one local model, e.g. a code
//! model for [`LocalTask::Code`](crate::prompt::LocalTask::Code). Availability
//! is checked once with `POST /api/show`; generation uses the non-streaming
//! `POST /api/generate` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::traits::LocalPipeline;
use crate::prompt::BuiltPrompt;
use crate::{Result, ScriptoriumError};

/// Default base URL of a local Ollama server.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// A task-bound pipeline on a local Ollama server.
#[derive(Clone)]
pub struct OllamaPipeline {
    http: Client,
    base_url: String,
    model: String,
    name: String,
}

impl OllamaPipeline {
    /// Create a pipeline for `model` on the default local server.
    pub fn new(model: impl Into<String>) -> Result<Self> {
        Self::with_base_url(DEFAULT_OLLAMA_URL, model, 120)
    }

    /// Create a pipeline for `model` on a server at `base_url`.
    pub fn with_base_url(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ScriptoriumError::Configuration(format!("HTTP client: {e}")))?;
        let model = model.into();
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            name: format!("ollama:{model}"),
            model,
        })
    }

    fn check_status(&self, response: &reqwest::Response) -> Result<()> {
        let status = response.status();
        match status.as_u16() {
            _ if status.is_success() => Ok(()),
            404 => Err(ScriptoriumError::ModelNotFound(self.model.clone())),
            code => Err(ScriptoriumError::Api {
                status: code,
                message: format!("local inference error: {status}"),
            }),
        }
    }
}

#[async_trait]
impl LocalPipeline for OllamaPipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn probe(&self) -> Result<()> {
        let response = self
            .http
            .post(format!("{}/api/show", self.base_url))
            .json(&ShowRequest { model: &self.model })
            .send()
            .await
            .map_err(|e| ScriptoriumError::Http(e.to_string()))?;
        self.check_status(&response)
    }

    async fn generate(&self, prompt: &BuiltPrompt) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(&GenerateRequest {
                model: &self.model,
                prompt: &prompt.user_message,
                system: &prompt.system_prompt,
                stream: false,
                options: GenerateOptions {
                    num_predict: prompt.max_tokens,
                    temperature: prompt.temperature,
                },
            })
            .send()
            .await
            .map_err(|e| ScriptoriumError::Http(e.to_string()))?;

        self.check_status(&response)?;

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ScriptoriumError::Http(e.to_string()))?;

        if body.response.is_empty() {
            return Err(ScriptoriumError::EmptyResponse);
        }
        Ok(body.response)
    }
}

#[derive(Serialize)]
struct ShowRequest<'a> {
    model: &'a str,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    num_predict: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_includes_model() {
        let pipeline = OllamaPipeline::new("codellama").unwrap();
        assert_eq!(pipeline.name(), "ollama:codellama");
        assert_eq!(pipeline.model(), "codellama");
    }

    #[test]
    fn generate_request_shape() {
        let body = serde_json::to_value(GenerateRequest {
            model: "m",
            prompt: "p",
            system: "s",
            stream: false,
            options: GenerateOptions {
                num_predict: 10,
                temperature: 0.5,
            },
        })
        .unwrap();
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 10);
    }
}
