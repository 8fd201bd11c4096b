//! The generation orchestrator.
//!
//! ```text
//!   request ──► parse content type ──► build prompt ──┬─► short circuit ──► result
//!                                                     ▼
//!                                                derive key
//!                                                     │
//!                                      cache hit ◄────┤
//!                                       (replay)      ▼
//!                                              single-flight guard
//!                                                     │
//!                                               rate limiter
//!                                                     │
//!                                              backend selector
//!                                                     │
//!                                            cache write ──► result
//! ```

mod builder;
mod single_flight;

pub use builder::{Scriptorium, ScriptoriumBuilder};

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::cache::{ResponseCache, derive_key};
use crate::limiter::RateLimiter;
use crate::prompt::{BuiltPrompt, PromptOutcome, build_prompt, optimization_prompt};
use crate::providers::{BackendKind, BackendSelector, Invocation, LocalModels};
use crate::telemetry;
use crate::types::{
    BatchItem, ContentType, GenerationMetadata, GenerationRequest, GenerationResult, LocalStatus,
    word_count,
};
use crate::{Result, ScriptoriumError};

use single_flight::SingleFlight;

/// Fixed fields of the map fed to key derivation. Caller params are nested
/// under [`PARAMS_FIELD`] so no caller name can shadow language or style.
const LANGUAGE_FIELD: &str = "language";
const STYLE_FIELD: &str = "style";
const PARAMS_FIELD: &str = "params";

/// Content generation service.
///
/// Created with [`Scriptorium::builder`]. Cheap to share behind an `Arc`;
/// all methods take `&self`.
pub struct Generator {
    cache: ResponseCache,
    limiter: RateLimiter,
    selector: BackendSelector,
    single_flight: Option<SingleFlight>,
}

impl Generator {
    pub(crate) fn new(
        cache: ResponseCache,
        limiter: RateLimiter,
        selector: BackendSelector,
        single_flight: bool,
    ) -> Self {
        Self {
            cache,
            limiter,
            selector,
            single_flight: single_flight.then(SingleFlight::new),
        }
    }

    /// Generate content for one request.
    ///
    /// Cache hits are replayed with a fresh generation id and skip the rate
    /// limiter. Backend failures are reported as
    /// [`ScriptoriumError::GenerationFailed`].
    #[instrument(skip(self, request), fields(content_type = %request.content_type, model = %request.model))]
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let content_type: ContentType = request.content_type.parse()?;

        let prompt = match build_prompt(content_type, request)? {
            PromptOutcome::Generate(prompt) => prompt,
            PromptOutcome::ShortCircuit(text) => {
                debug!("short-circuited before backend");
                return Ok(short_circuit_result(content_type, request, text));
            }
        };

        let key = derive_key(
            &request.prompt,
            content_type.as_str(),
            &request.model,
            &key_params(request),
        );

        if let Some(hit) = self.cache.get(&key, content_type).await {
            return Ok(hit);
        }

        let _flight = match &self.single_flight {
            Some(flights) => {
                let guard = flights.acquire(&key).await;
                if guard.waited()
                    && let Some(hit) = self.cache.get(&key, content_type).await
                {
                    return Ok(hit);
                }
                Some(guard)
            }
            None => None,
        };

        self.limiter.check(request.caller.as_deref()).await?;

        let started = Instant::now();
        let invocation = self.invoke(&prompt, &request.model).await?;
        let generation_time = started.elapsed().as_secs_f64();

        let backend = invocation.backend;
        let result = GenerationResult {
            metadata: metadata(
                content_type,
                request,
                generation_time,
                word_count(&invocation.text),
            ),
            content: invocation.text,
            model: invocation.model_used,
        };

        // placeholders are not output; a pipeline installed later must be reached
        if backend != BackendKind::Unavailable {
            self.cache.insert(&key, &result).await;
        }
        Ok(result)
    }

    /// Generate content for each request in order.
    ///
    /// Items are independent: a failing request yields a failed
    /// [`BatchItem`] and does not affect the others.
    pub async fn generate_batch(&self, requests: &[GenerationRequest]) -> Vec<BatchItem> {
        let mut items = Vec::with_capacity(requests.len());
        for request in requests {
            let outcome = self.generate(request).await;
            if let Err(e) = &outcome {
                debug!(content_type = %request.content_type, error = %e, "batch item failed");
            }
            items.push(BatchItem::from_outcome(&request.model, outcome));
        }
        items
    }

    /// Ask the backend to rewrite `prompt` for `content_type`.
    ///
    /// Counts against the rate limiter. Results are not cached.
    #[instrument(skip(self, prompt))]
    pub async fn optimize_prompt(
        &self,
        prompt: &str,
        content_type: &str,
        model: &str,
    ) -> Result<String> {
        let content_type: ContentType = content_type.parse()?;
        if prompt.trim().is_empty() {
            return Err(ScriptoriumError::InvalidInput("prompt is empty".into()));
        }

        self.limiter.check(None).await?;

        let mut built = optimization_prompt(content_type);
        built.user_message = prompt.to_string();
        let invocation = self.invoke(&built, model).await?;
        Ok(invocation.text)
    }

    /// Which local pipelines are available.
    pub fn local_status(&self) -> LocalStatus {
        self.selector.local_models().status()
    }

    pub fn local_models(&self) -> &LocalModels {
        self.selector.local_models()
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    async fn invoke(&self, prompt: &BuiltPrompt, model: &str) -> Result<Invocation> {
        let content_type = prompt.content_type.as_str();
        let started = Instant::now();

        match self.selector.invoke(prompt, model).await {
            Ok(invocation) => {
                let backend = invocation.backend.as_str();
                metrics::counter!(
                    telemetry::REQUESTS_TOTAL,
                    "content_type" => content_type,
                    "backend" => backend,
                    "status" => "ok"
                )
                .increment(1);
                metrics::histogram!(
                    telemetry::GENERATION_DURATION_SECONDS,
                    "content_type" => content_type,
                    "backend" => backend
                )
                .record(started.elapsed().as_secs_f64());
                Ok(invocation)
            }
            Err(e) => {
                let backend = if self.selector.is_remote(model) {
                    "remote"
                } else {
                    "local"
                };
                warn!(content_type, backend, model, error = %e, "generation failed");
                metrics::counter!(
                    telemetry::REQUESTS_TOTAL,
                    "content_type" => content_type,
                    "backend" => backend,
                    "status" => "error"
                )
                .increment(1);
                Err(ScriptoriumError::GenerationFailed(e.to_string()))
            }
        }
    }
}

/// Parameters fed to key derivation: language and style, both of which
/// change the prompt, alongside the request's own params.
fn key_params(request: &GenerationRequest) -> BTreeMap<String, serde_json::Value> {
    let params: serde_json::Map<String, serde_json::Value> = request
        .params
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    BTreeMap::from([
        (LANGUAGE_FIELD.to_string(), request.language.clone().into()),
        (STYLE_FIELD.to_string(), request.style.clone().into()),
        (PARAMS_FIELD.to_string(), serde_json::Value::Object(params)),
    ])
}

fn metadata(
    content_type: ContentType,
    request: &GenerationRequest,
    generation_time: f64,
    tokens_used: usize,
) -> GenerationMetadata {
    GenerationMetadata {
        generation_id: Uuid::new_v4(),
        generation_time,
        tokens_used,
        timestamp: Utc::now(),
        content_type: content_type.as_str().to_string(),
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        language: request.language.clone(),
        style: request.style.clone(),
        params: request.params.clone(),
        cached: false,
    }
}

fn short_circuit_result(
    content_type: ContentType,
    request: &GenerationRequest,
    text: String,
) -> GenerationResult {
    GenerationResult {
        metadata: metadata(content_type, request, 0.0, word_count(&text)),
        content: text,
        model: request.model.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_params_include_language_and_style() {
        let request = GenerationRequest::new("p", "text")
            .language("de")
            .style("casual")
            .param("tone", "dry");
        let params = key_params(&request);
        assert_eq!(params[LANGUAGE_FIELD], "de");
        assert_eq!(params[STYLE_FIELD], "casual");
        assert_eq!(params[PARAMS_FIELD]["tone"], "dry");
    }

    #[test]
    fn caller_params_cannot_shadow_language_or_style() {
        let key = |r: &GenerationRequest| derive_key(&r.prompt, "text", &r.model, &key_params(r));
        let plain = GenerationRequest::new("p", "text");
        let shadowing = plain
            .clone()
            .param("language", "en")
            .param("style", "professional")
            .param("request.language", "en");
        assert_ne!(key(&plain), key(&shadowing));

        let a = plain.clone().param("language", "fr");
        let b = plain.clone().param("language", "it");
        assert_ne!(key(&a), key(&b));
    }

    #[test]
    fn language_changes_the_key() {
        let en = GenerationRequest::new("p", "text");
        let de = en.clone().language("de");
        let key = |r: &GenerationRequest| derive_key(&r.prompt, "text", &r.model, &key_params(r));
        assert_ne!(key(&en), key(&de));
    }

    #[test]
    fn short_circuit_result_echoes_request() {
        let request = GenerationRequest::new("too short", "summary").model("gpt-4");
        let result = short_circuit_result(
            ContentType::Summary,
            &request,
            "Text too short for summarization".into(),
        );
        assert_eq!(result.model, "gpt-4");
        assert_eq!(result.metadata.tokens_used, 4);
        assert_eq!(result.metadata.generation_time, 0.0);
        assert!(!result.metadata.cached);
        assert_eq!(result.metadata.content_type, "summary");
    }
}
