//! Builder for configuring generator instances

use std::sync::Arc;

use super::Generator;
use crate::cache::{CacheConfig, CacheStore, MemoryStore, ResponseCache};
use crate::config::{Config, Secrets};
use crate::limiter::{RateLimitConfig, RateLimiter};
use crate::prompt::LocalTask;
use crate::providers::openai::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::providers::selector::DEFAULT_REMOTE_PREFIX;
use crate::providers::{
    BackendSelector, CompletionBackend, LocalModels, LocalPipeline, OllamaPipeline, OpenAiClient,
};
use crate::{Result, ScriptoriumError};

/// Main entry point for creating generator instances.
pub struct Scriptorium;

impl Scriptorium {
    /// Create a new builder for configuring the generator.
    pub fn builder() -> ScriptoriumBuilder {
        ScriptoriumBuilder::new()
    }
}

/// Builder for configuring generator instances.
pub struct ScriptoriumBuilder {
    store: Option<Arc<dyn CacheStore>>,
    cache: CacheConfig,
    rate_limit: RateLimitConfig,
    remote: Option<Arc<dyn CompletionBackend>>,
    openai_key: Option<String>,
    openai_base_url: Option<String>,
    timeout_secs: Option<u64>,
    remote_prefixes: Vec<String>,
    local_models: Option<Arc<LocalModels>>,
    local_pipelines: Vec<(LocalTask, Arc<dyn LocalPipeline>)>,
    single_flight: bool,
}

impl ScriptoriumBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
            remote: None,
            openai_key: None,
            openai_base_url: None,
            timeout_secs: None,
            remote_prefixes: vec![DEFAULT_REMOTE_PREFIX.to_string()],
            local_models: None,
            local_pipelines: Vec::new(),
            single_flight: true,
        }
    }

    /// Seed a builder from loaded configuration and secrets.
    ///
    /// The OpenAI key comes from `secrets` (or `OPENAI_API_KEY`); each
    /// configured local model becomes an Ollama pipeline for its task.
    pub fn from_config(config: &Config, secrets: &Secrets) -> Result<Self> {
        let mut builder = Self::new()
            .cache(config.cache.to_config())
            .rate_limit(config.rate_limit.to_config())
            .remote_prefixes(config.remote.prefixes.clone())
            .single_flight(config.generation.single_flight)
            .timeout(config.remote.timeout_secs)
            .openai_base_url(config.remote.base_url.clone());

        if let Some(key) = secrets.api_key("openai") {
            builder = builder.openai(key);
        }

        let local = &config.local;
        let models = [
            (LocalTask::Text, &local.text_model),
            (LocalTask::Code, &local.code_model),
            (LocalTask::Summary, &local.summary_model),
        ];
        for (task, model) in models {
            if let Some(model) = model {
                let pipeline =
                    OllamaPipeline::with_base_url(local.base_url.clone(), model.clone(), local.timeout_secs)?;
                builder = builder.local_pipeline(task, Arc::new(pipeline));
            }
        }

        Ok(builder)
    }

    /// Use a shared store for the cache and the rate limiter
    /// (default: an in-memory store sized by [`CacheConfig::max_entries`]).
    pub fn store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the response cache configuration.
    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    /// Set the rate limiter configuration.
    pub fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = config;
        self
    }

    /// Use a custom remote completion backend. Takes precedence over
    /// [`openai`](Self::openai).
    pub fn remote(mut self, backend: Arc<dyn CompletionBackend>) -> Self {
        self.remote = Some(backend);
        self
    }

    /// Configure the OpenAI remote backend.
    pub fn openai(mut self, api_key: impl Into<String>) -> Self {
        self.openai_key = Some(api_key.into());
        self
    }

    /// Point the OpenAI backend at a compatible gateway.
    pub fn openai_base_url(mut self, url: impl Into<String>) -> Self {
        self.openai_base_url = Some(url.into());
        self
    }

    /// Set the timeout for remote requests (seconds).
    pub fn timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Model-name prefixes routed to the remote backend (default: `["gpt"]`).
    pub fn remote_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.remote_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Use an existing set of local pipelines.
    pub fn local_models(mut self, models: Arc<LocalModels>) -> Self {
        self.local_models = Some(models);
        self
    }

    /// Register a local pipeline for a task.
    pub fn local_pipeline(mut self, task: LocalTask, pipeline: Arc<dyn LocalPipeline>) -> Self {
        self.local_pipelines.push((task, pipeline));
        self
    }

    /// Enable or disable the per-key single-flight guard (default: enabled).
    pub fn single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    /// Build the generator, installing local pipelines without probing them.
    pub fn build(self) -> Result<Generator> {
        let (generator, pending) = self.assemble()?;
        let models = generator.local_models();
        for (task, pipeline) in pending {
            models.install(task, pipeline);
        }
        Ok(generator)
    }

    /// Build the generator and probe each local pipeline once.
    ///
    /// A pipeline whose probe fails is left out; its task answers with the
    /// "not available" placeholder.
    pub async fn init(self) -> Result<Generator> {
        let (generator, pending) = self.assemble()?;
        let models = generator.local_models();
        for (task, pipeline) in pending {
            models.initialize(task, pipeline).await;
        }
        Ok(generator)
    }

    #[allow(clippy::type_complexity)]
    fn assemble(self) -> Result<(Generator, Vec<(LocalTask, Arc<dyn LocalPipeline>)>)> {
        if self.rate_limit.max_requests == 0 {
            return Err(ScriptoriumError::Configuration(
                "rate limit must admit at least one request".into(),
            ));
        }
        if self.rate_limit.window.is_zero() {
            return Err(ScriptoriumError::Configuration(
                "rate limit window must be positive".into(),
            ));
        }

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::with_max_entries(self.cache.max_entries)));

        let remote = match (self.remote, self.openai_key) {
            (Some(backend), _) => Some(backend),
            (None, Some(key)) => {
                let client = OpenAiClient::with_base_url(
                    key,
                    self.openai_base_url
                        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                    self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
                )?;
                Some(Arc::new(client) as Arc<dyn CompletionBackend>)
            }
            (None, None) => None,
        };

        let local = self.local_models.unwrap_or_default();
        let selector = BackendSelector::new(remote, local, self.remote_prefixes);

        let generator = Generator::new(
            ResponseCache::new(store.clone(), self.cache.ttl),
            RateLimiter::new(store, self.rate_limit),
            selector,
            self.single_flight,
        );
        Ok((generator, self.local_pipelines))
    }
}

impl Default for ScriptoriumBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn zero_window_is_rejected() {
        let result = Scriptorium::builder()
            .rate_limit(RateLimitConfig::new().window(Duration::ZERO))
            .build();
        assert!(matches!(result, Err(ScriptoriumError::Configuration(_))));
    }

    #[test]
    fn builds_without_any_backend() {
        let generator = Scriptorium::builder().build().unwrap();
        assert_eq!(generator.local_status(), Default::default());
    }

    #[test]
    fn from_config_registers_local_pipelines() {
        let config = Config::from_toml(
            r#"
            [local]
            code_model = "codellama"
        "#,
        )
        .unwrap();
        let generator = ScriptoriumBuilder::from_config(&config, &Secrets::default())
            .unwrap()
            .build()
            .unwrap();
        let status = generator.local_status();
        assert!(status.code);
        assert!(!status.text);
        assert!(!status.summary);
        assert_eq!(
            generator
                .local_models()
                .get(LocalTask::Code)
                .unwrap()
                .model(),
            "codellama"
        );
    }
}
