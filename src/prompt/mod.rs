//! Prompt dispatch table.
//!
//! [`build_prompt`] turns a content type, the caller's prompt and the
//! request's style parameters into the system prompt, user message and
//! effective sampling parameters for a backend call. The per-type data
//! lives in [`strategy`].
//!
//! A strategy may carry a precondition on the input (summaries need at
//! least 50 words). When it fails, [`build_prompt`] returns
//! [`PromptOutcome::ShortCircuit`] with a fixed message and the caller
//! skips the cache, the rate limiter and the backend entirely.

pub mod strategy;

pub use strategy::LocalTask;

use crate::types::{ContentType, DEFAULT_LANGUAGE, GenerationRequest};
use crate::{Result, ScriptoriumError};

use strategy::{Overlay, strategy_for};

/// A fully resolved backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltPrompt {
    pub content_type: ContentType,
    pub system_prompt: String,
    pub user_message: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub local_task: LocalTask,
}

/// What the dispatch table decided for a request.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptOutcome {
    /// Call a backend with this prompt.
    Generate(BuiltPrompt),
    /// Answer immediately with this text; no backend call.
    ShortCircuit(String),
}

/// Build the prompt for `request` using the strategy for `content_type`.
///
/// Fails with `InvalidInput` for an empty prompt, a zero token budget or a
/// non-finite temperature.
pub fn build_prompt(content_type: ContentType, request: &GenerationRequest) -> Result<PromptOutcome> {
    if request.prompt.trim().is_empty() {
        return Err(ScriptoriumError::InvalidInput("prompt is empty".into()));
    }
    if request.max_tokens == 0 {
        return Err(ScriptoriumError::InvalidInput(
            "max_tokens must be positive".into(),
        ));
    }
    if !request.temperature.is_finite() {
        return Err(ScriptoriumError::InvalidInput(format!(
            "temperature must be a finite number, got {}",
            request.temperature
        )));
    }

    let strategy = strategy_for(content_type);

    if let Some(min) = strategy.min_words
        && request.prompt.split_whitespace().count() < min.words
    {
        return Ok(PromptOutcome::ShortCircuit(min.message.to_string()));
    }

    let mut system_prompt = strategy.system_prompt.to_string();
    if let Some(directive) = overlay_directive(strategy.overlay, request) {
        system_prompt.push(' ');
        system_prompt.push_str(&directive);
    }
    if strategy.styled && !request.style.trim().is_empty() {
        system_prompt.push_str(&format!(" Write in a {} style.", request.style.trim()));
    }
    if strategy.overlay != Overlay::Translation
        && !request.language.trim().is_empty()
        && !request.language.trim().eq_ignore_ascii_case(DEFAULT_LANGUAGE)
    {
        system_prompt.push_str(&format!(" Respond in {}.", request.language.trim()));
    }

    let user_message = match strategy.user_template {
        Some(template) => template.replace("{prompt}", &request.prompt),
        None => request.prompt.clone(),
    };

    Ok(PromptOutcome::Generate(BuiltPrompt {
        content_type,
        system_prompt,
        user_message,
        max_tokens: strategy.max_tokens.unwrap_or(request.max_tokens),
        temperature: strategy
            .temperature
            .unwrap_or_else(|| request.temperature.clamp(0.0, 1.0)),
        local_task: strategy.local_task,
    }))
}

fn overlay_directive(overlay: Overlay, request: &GenerationRequest) -> Option<String> {
    match overlay {
        Overlay::None => None,
        Overlay::Platform => Some(
            request
                .str_param("platform")
                .and_then(strategy::platform_guideline)
                .unwrap_or(strategy::GENERIC_PLATFORM)
                .to_string(),
        ),
        Overlay::AdType => request
            .str_param("ad_type")
            .and_then(strategy::ad_type_guideline)
            .map(str::to_string),
        Overlay::Genre => request.str_param("genre").map(|genre| {
            strategy::genre_guideline(genre)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Genre: {genre}."))
        }),
        Overlay::Translation => {
            let target = request
                .str_param("target_language")
                .unwrap_or(request.language.as_str());
            Some(match request.str_param("source_language") {
                Some(source) => format!("Translate from {source} into {target}."),
                None => format!("Detect the source language and translate into {target}."),
            })
        }
    }
}

/// System prompt used by [`Generator::optimize_prompt`](crate::Generator::optimize_prompt).
pub fn optimization_prompt(content_type: ContentType) -> BuiltPrompt {
    BuiltPrompt {
        content_type,
        system_prompt: format!(
            "You are a prompt engineer. Rewrite the user's prompt so that it produces the best \
             possible {} content: make the goal, audience, tone and constraints explicit. \
             Output only the improved prompt.",
            content_type.as_str().replace('_', " ")
        ),
        user_message: String::new(),
        max_tokens: 300,
        temperature: 0.5,
        local_task: LocalTask::Text,
    }
}
