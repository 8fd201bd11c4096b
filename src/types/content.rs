//! Content type tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ScriptoriumError;

/// The kind of content a request asks for.
///
/// Selects the prompt strategy (see [`build_prompt`](crate::prompt::build_prompt))
/// and, for non-remote models, which local pipeline serves the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Text,
    Code,
    Summary,
    Email,
    BlogPost,
    MarketingCopy,
    Translation,
    TechnicalDocs,
    NewsArticle,
    ProductDescription,
    CreativeWriting,
    SocialMedia,
    AdCopy,
    SeoContent,
    PressRelease,
    ProductReview,
    Script,
    Poetry,
    Report,
    CoverLetter,
}

const ALL: [ContentType; 20] = [
    ContentType::Text,
    ContentType::Code,
    ContentType::Summary,
    ContentType::Email,
    ContentType::BlogPost,
    ContentType::MarketingCopy,
    ContentType::Translation,
    ContentType::TechnicalDocs,
    ContentType::NewsArticle,
    ContentType::ProductDescription,
    ContentType::CreativeWriting,
    ContentType::SocialMedia,
    ContentType::AdCopy,
    ContentType::SeoContent,
    ContentType::PressRelease,
    ContentType::ProductReview,
    ContentType::Script,
    ContentType::Poetry,
    ContentType::Report,
    ContentType::CoverLetter,
];

impl ContentType {
    /// Every known content type, in declaration order.
    pub fn all() -> &'static [ContentType] {
        &ALL
    }

    /// Wire tag (`snake_case`), as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Code => "code",
            ContentType::Summary => "summary",
            ContentType::Email => "email",
            ContentType::BlogPost => "blog_post",
            ContentType::MarketingCopy => "marketing_copy",
            ContentType::Translation => "translation",
            ContentType::TechnicalDocs => "technical_docs",
            ContentType::NewsArticle => "news_article",
            ContentType::ProductDescription => "product_description",
            ContentType::CreativeWriting => "creative_writing",
            ContentType::SocialMedia => "social_media",
            ContentType::AdCopy => "ad_copy",
            ContentType::SeoContent => "seo_content",
            ContentType::PressRelease => "press_release",
            ContentType::ProductReview => "product_review",
            ContentType::Script => "script",
            ContentType::Poetry => "poetry",
            ContentType::Report => "report",
            ContentType::CoverLetter => "cover_letter",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ScriptoriumError;

    /// Parse a tag, ignoring ASCII case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        ALL.iter()
            .copied()
            .find(|ct| ct.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| ScriptoriumError::UnknownContentType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip_through_from_str() {
        for ct in ContentType::all() {
            assert_eq!(ct.as_str().parse::<ContentType>().unwrap(), *ct);
        }
    }

    #[test]
    fn serde_tag_matches_as_str() {
        for ct in ContentType::all() {
            let json = serde_json::to_string(ct).unwrap();
            assert_eq!(json, format!("\"{}\"", ct.as_str()));
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(
            "BLOG_POST".parse::<ContentType>().unwrap(),
            ContentType::BlogPost
        );
        assert_eq!(" summary ".parse::<ContentType>().unwrap(), ContentType::Summary);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = "bogus".parse::<ContentType>().unwrap_err();
        assert!(matches!(err, ScriptoriumError::UnknownContentType(tag) if tag == "bogus"));
    }

    #[test]
    fn twenty_variants() {
        assert_eq!(ContentType::all().len(), 20);
    }
}
