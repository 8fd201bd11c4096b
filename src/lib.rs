//! Scriptorium - AI content generation core
//!
//! Turns a typed content request (email, blog post, code, summary, ...) into
//! generated text. Each request is dispatched through a per-type prompt
//! strategy, routed to a remote chat-completion API or a local inference
//! pipeline by model name, deduplicated through a write-through cache and
//! admitted by a fixed-window rate limiter.
//!
//! # Example
//!
//! ```rust,no_run
//! use scriptorium::{GenerationRequest, Scriptorium};
//!
//! #[tokio::main]
//! async fn main() -> scriptorium::Result<()> {
//!     let generator = Scriptorium::builder()
//!         .openai("sk-your-key")
//!         .build()?;
//!
//!     let request = GenerationRequest::new("Announce our new office in Lisbon", "social_media")
//!         .model("gpt-4")
//!         .param("platform", "linkedin");
//!
//!     let result = generator.generate(&request).await?;
//!     println!("{}", result.content);
//!     Ok(())
//! }
//! ```
//!
//! # Local pipelines
//!
//! Models outside the remote families (by default anything not starting
//! with `gpt`) run on local pipelines, one per task:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use scriptorium::{LocalTask, OllamaPipeline, Scriptorium};
//!
//! # async fn run() -> scriptorium::Result<()> {
//! let generator = Scriptorium::builder()
//!     .local_pipeline(LocalTask::Code, Arc::new(OllamaPipeline::new("codellama")?))
//!     .init()
//!     .await?;
//!
//! println!("code pipeline ready: {}", generator.local_status().code);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod generator;
pub mod limiter;
pub mod prompt;
pub mod providers;
pub mod telemetry;
pub mod types;
pub mod version;

// Re-export main types at crate root
pub use error::{Result, ScriptoriumError};
pub use generator::{Generator, Scriptorium, ScriptoriumBuilder};
pub use prompt::LocalTask;
pub use providers::{CompletionBackend, LocalPipeline, OllamaPipeline, OpenAiClient};
pub use version::{PKG_VERSION, version_string};

pub use types::{
    BatchItem, ContentType, GenerationMetadata, GenerationRequest, GenerationResult, LocalStatus,
};
