//! Owned registry of local pipelines.
//!
//! One slot per [`LocalTask`]. A slot is filled at most once, normally at
//! startup via [`LocalModels::initialize`], which probes the pipeline and
//! leaves the slot empty if the probe fails. Empty slots are not errors:
//! the selector answers with the task's "not available" placeholder.

use std::sync::{Arc, OnceLock};

use tracing::{info, warn};

use super::traits::LocalPipeline;
use crate::prompt::LocalTask;
use crate::types::LocalStatus;

/// Local pipelines, one optional slot per task.
#[derive(Default)]
pub struct LocalModels {
    text: OnceLock<Arc<dyn LocalPipeline>>,
    code: OnceLock<Arc<dyn LocalPipeline>>,
    summary: OnceLock<Arc<dyn LocalPipeline>>,
}

impl LocalModels {
    /// No pipelines installed.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, task: LocalTask) -> &OnceLock<Arc<dyn LocalPipeline>> {
        match task {
            LocalTask::Text => &self.text,
            LocalTask::Code => &self.code,
            LocalTask::Summary => &self.summary,
        }
    }

    /// Install a pipeline without probing it.
    ///
    /// Returns `false` if the slot was already filled; the existing pipeline
    /// is kept.
    pub fn install(&self, task: LocalTask, pipeline: Arc<dyn LocalPipeline>) -> bool {
        self.slot(task).set(pipeline).is_ok()
    }

    /// Probe a pipeline and install it if the probe succeeds.
    ///
    /// A failed probe is logged and leaves the slot empty. Returns whether
    /// the task is available afterwards.
    pub async fn initialize(&self, task: LocalTask, pipeline: Arc<dyn LocalPipeline>) -> bool {
        if self.is_available(task) {
            return true;
        }
        match pipeline.probe().await {
            Ok(()) => {
                info!(task = task.as_str(), pipeline = pipeline.name(), "local pipeline ready");
                self.install(task, pipeline);
                true
            }
            Err(e) => {
                warn!(
                    task = task.as_str(),
                    pipeline = pipeline.name(),
                    error = %e,
                    "local pipeline failed to initialize"
                );
                false
            }
        }
    }

    /// Pipeline for a task, if one initialized.
    pub fn get(&self, task: LocalTask) -> Option<Arc<dyn LocalPipeline>> {
        self.slot(task).get().cloned()
    }

    pub fn is_available(&self, task: LocalTask) -> bool {
        self.slot(task).get().is_some()
    }

    pub fn status(&self) -> LocalStatus {
        LocalStatus {
            text: self.is_available(LocalTask::Text),
            code: self.is_available(LocalTask::Code),
            summary: self.is_available(LocalTask::Summary),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::BuiltPrompt;
    use crate::{Result, ScriptoriumError};
    use async_trait::async_trait;

    struct StubPipeline {
        model: &'static str,
        healthy: bool,
    }

    #[async_trait]
    impl LocalPipeline for StubPipeline {
        fn name(&self) -> &str {
            "stub"
        }

        fn model(&self) -> &str {
            self.model
        }

        async fn probe(&self) -> Result<()> {
            if self.healthy {
                Ok(())
            } else {
                Err(ScriptoriumError::Http("connection refused".into()))
            }
        }

        async fn generate(&self, _prompt: &BuiltPrompt) -> Result<String> {
            Ok(self.model.to_string())
        }
    }

    #[tokio::test]
    async fn failed_probe_leaves_slot_empty() {
        let models = LocalModels::new();
        let ok = models
            .initialize(
                LocalTask::Code,
                Arc::new(StubPipeline {
                    model: "broken",
                    healthy: false,
                }),
            )
            .await;
        assert!(!ok);
        assert!(!models.is_available(LocalTask::Code));
        assert_eq!(models.status(), LocalStatus::default());
    }

    #[tokio::test]
    async fn initialize_is_once() {
        let models = LocalModels::new();
        let first = Arc::new(StubPipeline {
            model: "first",
            healthy: true,
        });
        let second = Arc::new(StubPipeline {
            model: "second",
            healthy: true,
        });
        assert!(models.initialize(LocalTask::Text, first).await);
        assert!(models.initialize(LocalTask::Text, second.clone()).await);
        assert!(!models.install(LocalTask::Text, second));
        assert_eq!(models.get(LocalTask::Text).unwrap().model(), "first");
    }

    #[test]
    fn status_reports_each_task() {
        let models = LocalModels::new();
        models.install(
            LocalTask::Summary,
            Arc::new(StubPipeline {
                model: "bart",
                healthy: true,
            }),
        );
        assert_eq!(
            models.status(),
            LocalStatus {
                text: false,
                code: false,
                summary: true
            }
        );
    }
}
