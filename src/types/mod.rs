//! Public types for the Scriptorium API.

mod content;
mod request;
mod result;

pub use content::ContentType;
pub use request::{
    DEFAULT_LANGUAGE, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_STYLE, DEFAULT_TEMPERATURE,
    GenerationRequest,
};
pub(crate) use result::CachedGeneration;
pub use result::{BatchItem, GenerationMetadata, GenerationResult, LocalStatus, word_count};
