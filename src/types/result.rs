//! Generation results and batch items.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ScriptoriumError;

/// Metadata attached to every generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    /// Unique per call, including calls served from cache.
    pub generation_id: Uuid,
    /// Wall-clock seconds spent in the backend.
    pub generation_time: f64,
    /// Whitespace-delimited word count of the output, not a tokenizer count.
    pub tokens_used: usize,
    pub timestamp: DateTime<Utc>,
    pub content_type: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub language: String,
    pub style: String,
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
    /// `true` when the result was replayed from the cache.
    #[serde(default)]
    pub cached: bool,
}

/// Result of a successful generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub content: String,
    /// Model that actually produced the content.
    pub model: String,
    pub metadata: GenerationMetadata,
}

/// The cached form of a [`GenerationResult`]: everything except the
/// generation id, which is minted fresh on replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CachedGeneration {
    pub content: String,
    pub model: String,
    pub generation_time: f64,
    pub tokens_used: usize,
    pub timestamp: DateTime<Utc>,
    pub content_type: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub language: String,
    pub style: String,
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
}

impl CachedGeneration {
    pub(crate) fn from_result(result: &GenerationResult) -> Self {
        let m = &result.metadata;
        Self {
            content: result.content.clone(),
            model: result.model.clone(),
            generation_time: m.generation_time,
            tokens_used: m.tokens_used,
            timestamp: m.timestamp,
            content_type: m.content_type.clone(),
            max_tokens: m.max_tokens,
            temperature: m.temperature,
            language: m.language.clone(),
            style: m.style.clone(),
            params: m.params.clone(),
        }
    }

    pub(crate) fn replay(self) -> GenerationResult {
        GenerationResult {
            content: self.content,
            model: self.model,
            metadata: GenerationMetadata {
                generation_id: Uuid::new_v4(),
                generation_time: self.generation_time,
                tokens_used: self.tokens_used,
                timestamp: self.timestamp,
                content_type: self.content_type,
                max_tokens: self.max_tokens,
                temperature: self.temperature,
                language: self.language,
                style: self.style,
                params: self.params,
                cached: true,
            },
        }
    }
}

/// Outcome of one request within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Model used on success, the requested model on failure.
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<GenerationMetadata>,
}

impl BatchItem {
    pub(crate) fn from_outcome(
        requested_model: &str,
        outcome: Result<GenerationResult, ScriptoriumError>,
    ) -> Self {
        match outcome {
            Ok(result) => Self {
                success: true,
                content: Some(result.content),
                error: None,
                model: result.model,
                metadata: Some(result.metadata),
            },
            Err(e) => Self {
                success: false,
                content: None,
                error: Some(e.to_string()),
                model: requested_model.to_string(),
                metadata: None,
            },
        }
    }
}

/// Which local pipelines initialized successfully.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalStatus {
    pub text: bool,
    pub code: bool,
    pub summary: bool,
}

/// Approximate token usage: the whitespace-delimited word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GenerationResult {
        GenerationResult {
            content: "hello there".into(),
            model: "gpt-4".into(),
            metadata: GenerationMetadata {
                generation_id: Uuid::new_v4(),
                generation_time: 0.25,
                tokens_used: 2,
                timestamp: Utc::now(),
                content_type: "text".into(),
                max_tokens: 500,
                temperature: 0.7,
                language: "en".into(),
                style: "professional".into(),
                params: BTreeMap::new(),
                cached: false,
            },
        }
    }

    #[test]
    fn replay_mints_new_id_and_marks_cached() {
        let original = sample();
        let replayed = CachedGeneration::from_result(&original).replay();
        assert_ne!(replayed.metadata.generation_id, original.metadata.generation_id);
        assert!(replayed.metadata.cached);
        assert_eq!(replayed.content, original.content);
        assert_eq!(replayed.metadata.timestamp, original.metadata.timestamp);
    }

    #[test]
    fn cached_form_has_no_generation_id() {
        let json = serde_json::to_value(CachedGeneration::from_result(&sample())).unwrap();
        assert!(json.get("generation_id").is_none());
    }

    #[test]
    fn word_count_splits_on_any_whitespace() {
        assert_eq!(word_count("  one\ttwo\nthree  "), 3);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn batch_item_from_error_keeps_requested_model() {
        let item = BatchItem::from_outcome(
            "gpt-4",
            Err(ScriptoriumError::UnknownContentType("bogus".into())),
        );
        assert!(!item.success);
        assert_eq!(item.model, "gpt-4");
        assert!(item.error.unwrap().contains("bogus"));
    }
}
