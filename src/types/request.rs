//! Generation request type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Model used when a request does not name one.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
/// Default completion budget.
pub const DEFAULT_MAX_TOKENS: u32 = 500;
/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Default output language.
pub const DEFAULT_LANGUAGE: &str = "en";
/// Default writing style.
pub const DEFAULT_STYLE: &str = "professional";

/// A single content generation request.
///
/// `content_type` is kept as the raw tag so that unknown tags surface as
/// [`UnknownContentType`](crate::ScriptoriumError::UnknownContentType) from
/// [`Generator::generate`](crate::Generator::generate) rather than failing
/// deserialization of a whole batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,

    pub content_type: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature, clamped to `[0, 1]` when the prompt is built.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_style")]
    pub style: String,

    /// Per-type sub-parameters (`platform`, `genre`, `target_language`, ...)
    /// and any other caller extras. Sorted, so iteration order is canonical.
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,

    /// Caller identity, consulted only by a per-caller rate limiter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller: Option<String>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_style() -> String {
    DEFAULT_STYLE.to_string()
}

impl GenerationRequest {
    /// Create a request with default model and parameters.
    pub fn new(prompt: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            content_type: content_type.into(),
            model: default_model(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            language: default_language(),
            style: default_style(),
            params: BTreeMap::new(),
            caller: None,
        }
    }

    /// Set the model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set max tokens.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the output language (locale tag).
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the writing style.
    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    /// Add an extra parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set the caller identity.
    pub fn caller(mut self, caller: impl Into<String>) -> Self {
        self.caller = Some(caller.into());
        self
    }

    /// Look up a string-valued extra parameter.
    pub fn str_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_fills_defaults() {
        let req: GenerationRequest =
            serde_json::from_str(r#"{"prompt": "hi", "content_type": "text"}"#).unwrap();
        assert_eq!(req.model, DEFAULT_MODEL);
        assert_eq!(req.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(req.language, "en");
        assert_eq!(req.style, "professional");
        assert!(req.params.is_empty());
        assert!(req.caller.is_none());
    }

    #[test]
    fn builder_sets_fields() {
        let req = GenerationRequest::new("hello", "social_media")
            .model("gpt-4")
            .max_tokens(200)
            .temperature(0.2)
            .param("platform", "twitter")
            .caller("user-7");
        assert_eq!(req.model, "gpt-4");
        assert_eq!(req.max_tokens, 200);
        assert_eq!(req.str_param("platform"), Some("twitter"));
        assert_eq!(req.caller.as_deref(), Some("user-7"));
    }

    #[test]
    fn non_string_param_is_not_a_str_param() {
        let req = GenerationRequest::new("x", "text").param("count", 3);
        assert_eq!(req.str_param("count"), None);
    }
}
