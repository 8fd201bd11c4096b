//! Per-content-type prompt strategies.
//!
//! Each [`ContentType`] maps to one [`ContentStrategy`] record. Adding a
//! content type means adding a variant and a row here; no other code changes.

use serde::{Deserialize, Serialize};

use crate::types::ContentType;

/// Which local pipeline serves a content type when the model is not remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalTask {
    Text,
    Code,
    Summary,
}

impl LocalTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocalTask::Text => "text",
            LocalTask::Code => "code",
            LocalTask::Summary => "summary",
        }
    }

    /// Placeholder returned when the pipeline for this task never initialized.
    pub fn unavailable_message(&self) -> &'static str {
        match self {
            LocalTask::Text => "Text generation model not available",
            LocalTask::Code => "Code generation model not available",
            LocalTask::Summary => "Summarization model not available",
        }
    }
}

/// Sub-parameter a strategy reads from the request's extra parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Overlay {
    None,
    /// `platform`: per-platform posting guidelines.
    Platform,
    /// `ad_type`: per-format advertising guidelines.
    AdType,
    /// `genre`: genre direction for creative writing.
    Genre,
    /// `source_language` / `target_language`.
    Translation,
}

/// Minimum input length below which the request short-circuits.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MinWords {
    pub words: usize,
    pub message: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ContentStrategy {
    pub system_prompt: &'static str,
    /// `{prompt}` is replaced with the caller's prompt. `None` passes it through.
    pub user_template: Option<&'static str>,
    pub overlay: Overlay,
    /// Overrides the request's max tokens.
    pub max_tokens: Option<u32>,
    /// Overrides the request's temperature.
    pub temperature: Option<f32>,
    pub min_words: Option<MinWords>,
    /// Whether the style directive applies.
    pub styled: bool,
    pub local_task: LocalTask,
}

const BASE: ContentStrategy = ContentStrategy {
    system_prompt: "You are a helpful assistant.",
    user_template: None,
    overlay: Overlay::None,
    max_tokens: None,
    temperature: None,
    min_words: None,
    styled: true,
    local_task: LocalTask::Text,
};

pub(crate) const SUMMARY_MIN_WORDS: usize = 50;
pub(crate) const SUMMARY_TOO_SHORT: &str = "Text too short for summarization";
pub(crate) const TRANSLATION_TEMPERATURE: f32 = 0.3;

pub(crate) fn strategy_for(content_type: ContentType) -> ContentStrategy {
    match content_type {
        ContentType::Text => BASE,
        ContentType::Code => ContentStrategy {
            system_prompt: "You are a code generation assistant. Generate clean, well-commented code.",
            styled: false,
            local_task: LocalTask::Code,
            ..BASE
        },
        ContentType::Summary => ContentStrategy {
            system_prompt: "You are a summarization assistant. Provide concise summaries.",
            user_template: Some("Summarize the following text:\n\n{prompt}"),
            max_tokens: Some(150),
            min_words: Some(MinWords {
                words: SUMMARY_MIN_WORDS,
                message: SUMMARY_TOO_SHORT,
            }),
            local_task: LocalTask::Summary,
            ..BASE
        },
        ContentType::Email => ContentStrategy {
            system_prompt: "You are an expert business correspondent. Write a complete email with a \
                subject line, greeting, clear body and sign-off.",
            ..BASE
        },
        ContentType::BlogPost => ContentStrategy {
            system_prompt: "You are an experienced blog writer. Write an engaging blog post with a \
                headline, an introduction, descriptive subheadings and a conclusion.",
            ..BASE
        },
        ContentType::MarketingCopy => ContentStrategy {
            system_prompt: "You are a senior marketing copywriter. Write persuasive copy that \
                highlights benefits and ends with a clear call to action.",
            ..BASE
        },
        ContentType::Translation => ContentStrategy {
            system_prompt: "You are a professional translator. Translate the text faithfully, \
                preserving meaning, tone and formatting. Output only the translation.",
            overlay: Overlay::Translation,
            temperature: Some(TRANSLATION_TEMPERATURE),
            styled: false,
            ..BASE
        },
        ContentType::TechnicalDocs => ContentStrategy {
            system_prompt: "You are a technical writer. Produce precise, well-structured \
                documentation with headings, examples and defined terminology.",
            ..BASE
        },
        ContentType::NewsArticle => ContentStrategy {
            system_prompt: "You are a news journalist. Write an objective article with a headline \
                and lead paragraph, ordering facts by importance.",
            ..BASE
        },
        ContentType::ProductDescription => ContentStrategy {
            system_prompt: "You are an e-commerce copywriter. Describe the product's features and \
                benefits concisely for online shoppers.",
            ..BASE
        },
        ContentType::CreativeWriting => ContentStrategy {
            system_prompt: "You are a creative writer. Write an original piece with vivid imagery, \
                strong voice and a satisfying structure.",
            overlay: Overlay::Genre,
            ..BASE
        },
        ContentType::SocialMedia => ContentStrategy {
            system_prompt: "You are a social media manager. Write a post that is engaging, \
                shareable and fits the platform's conventions.",
            overlay: Overlay::Platform,
            ..BASE
        },
        ContentType::AdCopy => ContentStrategy {
            system_prompt: "You are an advertising copywriter. Write short, high-converting ad copy \
                with a strong hook and call to action.",
            overlay: Overlay::AdType,
            ..BASE
        },
        ContentType::SeoContent => ContentStrategy {
            system_prompt: "You are an SEO content specialist. Write content that reads naturally, \
                uses relevant keywords and includes a meta description.",
            ..BASE
        },
        ContentType::PressRelease => ContentStrategy {
            system_prompt: "You are a public relations specialist. Write a press release with a \
                headline, dateline, quotes and a boilerplate section.",
            ..BASE
        },
        ContentType::ProductReview => ContentStrategy {
            system_prompt: "You are a product reviewer. Write a balanced review covering strengths, \
                weaknesses and a final verdict.",
            ..BASE
        },
        ContentType::Script => ContentStrategy {
            system_prompt: "You are a scriptwriter. Write a script with scene headings, speaker \
                names and stage directions.",
            ..BASE
        },
        ContentType::Poetry => ContentStrategy {
            system_prompt: "You are a poet. Write an evocative poem with deliberate rhythm and \
                imagery.",
            ..BASE
        },
        ContentType::Report => ContentStrategy {
            system_prompt: "You are a business analyst. Write a structured report with an executive \
                summary, findings and recommendations.",
            ..BASE
        },
        ContentType::CoverLetter => ContentStrategy {
            system_prompt: "You are a career coach. Write a tailored cover letter that connects the \
                candidate's experience to the role.",
            ..BASE
        },
    }
}

pub(crate) const GENERIC_PLATFORM: &str =
    "Adapt length, tone and hashtags to the target platform.";

pub(crate) fn platform_guideline(platform: &str) -> Option<&'static str> {
    match platform.to_ascii_lowercase().as_str() {
        "twitter" | "x" => Some(
            "Platform: Twitter/X. Stay under 280 characters and use at most two hashtags.",
        ),
        "linkedin" => Some(
            "Platform: LinkedIn. Use a professional tone, short paragraphs and an insight-led opening.",
        ),
        "facebook" => Some(
            "Platform: Facebook. Use a conversational tone and invite comments.",
        ),
        "instagram" => Some(
            "Platform: Instagram. Write a visual, emoji-friendly caption followed by relevant hashtags.",
        ),
        "tiktok" => Some(
            "Platform: TikTok. Write a punchy hook for the first seconds and a short caption.",
        ),
        _ => None,
    }
}

pub(crate) fn ad_type_guideline(ad_type: &str) -> Option<&'static str> {
    match ad_type.to_ascii_lowercase().as_str() {
        "search" => Some(
            "Format: search ad. Provide three headlines of at most 30 characters and two \
             descriptions of at most 90 characters.",
        ),
        "display" => Some(
            "Format: display ad. Provide a headline, a one-line body and a button label.",
        ),
        "social" => Some(
            "Format: social ad. Provide primary text, a headline and a call to action.",
        ),
        "video" => Some(
            "Format: video ad. Provide a 30-second voice-over script with an opening hook.",
        ),
        _ => None,
    }
}

pub(crate) fn genre_guideline(genre: &str) -> Option<&'static str> {
    match genre.to_ascii_lowercase().as_str() {
        "fiction" => Some("Genre: literary fiction. Focus on character and inner life."),
        "fantasy" => Some("Genre: fantasy. Build a coherent world with its own rules."),
        "mystery" => Some("Genre: mystery. Plant clues fairly and build suspense."),
        "science_fiction" | "sci-fi" | "scifi" => {
            Some("Genre: science fiction. Ground speculative ideas in plausible detail.")
        }
        "romance" => Some("Genre: romance. Center the emotional arc between the characters."),
        "horror" => Some("Genre: horror. Build dread through atmosphere rather than gore."),
        _ => None,
    }
}
