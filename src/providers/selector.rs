//! Backend selection.
//!
//! ```text
//!   model starts with a remote prefix ("gpt", ...)
//!        ├── yes ──► CompletionBackend::complete ──► first choice text
//!        └── no  ──► LocalModels[prompt.local_task]
//!                       ├── installed ──► LocalPipeline::generate
//!                       └── missing   ──► "<Task> model not available"
//! ```

use std::sync::Arc;

use tracing::debug;

use super::local::LocalModels;
use super::traits::CompletionBackend;
use crate::prompt::BuiltPrompt;
use crate::telemetry;
use crate::{Result, ScriptoriumError};

/// Default remote-family prefix.
pub const DEFAULT_REMOTE_PREFIX: &str = "gpt";

/// Which path served an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Remote,
    Local,
    /// No local pipeline; the text is a placeholder.
    Unavailable,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Remote => "remote",
            BackendKind::Local => "local",
            BackendKind::Unavailable => "unavailable",
        }
    }
}

/// Raw output of one backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub text: String,
    /// Model that produced the text.
    pub model_used: String,
    pub backend: BackendKind,
}

/// Routes a built prompt to the remote backend or a local pipeline.
pub struct BackendSelector {
    remote: Option<Arc<dyn CompletionBackend>>,
    local: Arc<LocalModels>,
    remote_prefixes: Vec<String>,
}

impl BackendSelector {
    pub fn new(
        remote: Option<Arc<dyn CompletionBackend>>,
        local: Arc<LocalModels>,
        remote_prefixes: Vec<String>,
    ) -> Self {
        Self {
            remote,
            local,
            remote_prefixes,
        }
    }

    pub fn local_models(&self) -> &LocalModels {
        &self.local
    }

    /// Whether `model` belongs to a remote family.
    pub fn is_remote(&self, model: &str) -> bool {
        self.remote_prefixes
            .iter()
            .any(|prefix| model.starts_with(prefix.as_str()))
    }

    /// Run `prompt` on the backend chosen for `model`.
    pub async fn invoke(&self, prompt: &BuiltPrompt, model: &str) -> Result<Invocation> {
        if self.is_remote(model) {
            let remote = self.remote.as_ref().ok_or_else(|| {
                ScriptoriumError::Configuration(format!(
                    "no remote backend configured for model '{model}'"
                ))
            })?;
            debug!(backend = remote.name(), model, "invoking remote backend");
            let text = remote.complete(model, prompt).await?;
            return Ok(Invocation {
                text,
                model_used: model.to_string(),
                backend: BackendKind::Remote,
            });
        }

        match self.local.get(prompt.local_task) {
            Some(pipeline) => {
                debug!(pipeline = pipeline.name(), model, "invoking local pipeline");
                let text = pipeline.generate(prompt).await?;
                Ok(Invocation {
                    text,
                    model_used: pipeline.model().to_string(),
                    backend: BackendKind::Local,
                })
            }
            None => {
                debug!(task = prompt.local_task.as_str(), model, "local pipeline unavailable");
                metrics::counter!(telemetry::LOCAL_UNAVAILABLE_TOTAL, "task" => prompt.local_task.as_str())
                    .increment(1);
                Ok(Invocation {
                    text: prompt.local_task.unavailable_message().to_string(),
                    model_used: model.to_string(),
                    backend: BackendKind::Unavailable,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::LocalTask;
    use crate::types::ContentType;

    fn prompt(task: LocalTask) -> BuiltPrompt {
        BuiltPrompt {
            content_type: ContentType::Text,
            system_prompt: "sys".into(),
            user_message: "user".into(),
            max_tokens: 10,
            temperature: 0.5,
            local_task: task,
        }
    }

    fn selector() -> BackendSelector {
        BackendSelector::new(
            None,
            Arc::new(LocalModels::new()),
            vec![DEFAULT_REMOTE_PREFIX.to_string()],
        )
    }

    #[test]
    fn prefix_matching() {
        let s = selector();
        assert!(s.is_remote("gpt-3.5-turbo"));
        assert!(s.is_remote("gpt-4"));
        assert!(!s.is_remote("local-text"));
        assert!(!s.is_remote("llama3"));
    }

    #[tokio::test]
    async fn missing_local_pipeline_returns_placeholder() {
        let out = selector()
            .invoke(&prompt(LocalTask::Summary), "local")
            .await
            .unwrap();
        assert_eq!(out.text, "Summarization model not available");
        assert_eq!(out.backend, BackendKind::Unavailable);
        assert_eq!(out.model_used, "local");
    }

    #[tokio::test]
    async fn remote_model_without_backend_is_configuration_error() {
        let err = selector()
            .invoke(&prompt(LocalTask::Text), "gpt-4")
            .await
            .unwrap_err();
        assert!(matches!(err, ScriptoriumError::Configuration(_)));
    }
}
