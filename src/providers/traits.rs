//! Backend traits.
//!
//! Two seams, one per backend family:
//!
//! - [`CompletionBackend`] — a remote chat-completion API. Failures are real
//!   errors and propagate to the caller.
//! - [`LocalPipeline`] — a locally hosted model serving one task (text,
//!   code or summary). Pipelines are probed once at startup; a pipeline that
//!   never initialized is simply absent and the selector soft-degrades.

use async_trait::async_trait;

use crate::Result;
use crate::prompt::BuiltPrompt;

/// Remote chat-completion API.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Backend name for logging/debugging.
    fn name(&self) -> &str;

    /// Run one completion and return the first choice's text.
    async fn complete(&self, model: &str, prompt: &BuiltPrompt) -> Result<String>;
}

/// Locally hosted model pipeline.
#[async_trait]
pub trait LocalPipeline: Send + Sync {
    /// Pipeline name for logging/debugging.
    fn name(&self) -> &str;

    /// Identifier of the model behind this pipeline, reported as the model
    /// actually used.
    fn model(&self) -> &str;

    /// Check that the pipeline can serve requests. Called once before the
    /// pipeline is installed.
    async fn probe(&self) -> Result<()> {
        Ok(())
    }

    /// Generate text for a built prompt.
    async fn generate(&self, prompt: &BuiltPrompt) -> Result<String>;
}
