//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. explicit path (e.g. `--config <path>`)
//! 2. `~/.scriptorium/config.toml` (user)
//! 3. `/etc/scriptorium/config.toml` (system)
//!
//! Every section is optional; with no file at all the defaults apply.
//!
//! Secrets are loaded separately with mandatory permission checks:
//! 1. `~/.scriptorium/secrets.toml` (user, must be 0600)
//! 2. `/etc/scriptorium/secrets.toml` (system, must be 0600)
//!
//! and fall back to environment variables.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::cache::CacheConfig;
use crate::limiter::{RateLimitConfig, RateLimitScope};
use crate::providers::ollama::DEFAULT_OLLAMA_URL;
use crate::providers::openai::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::providers::selector::DEFAULT_REMOTE_PREFIX;
use crate::{Result, ScriptoriumError};

const CONFIG_DIR: &str = ".scriptorium";
const SYSTEM_DIR: &str = "/etc/scriptorium";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    #[serde(default)]
    pub remote: RemoteSettings,
    #[serde(default)]
    pub local: LocalSettings,
    #[serde(default)]
    pub cache: CacheSettings,
}

/// Orchestrator behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationSettings {
    /// Collapse concurrent identical misses into one backend call (default: true).
    #[serde(default = "default_true")]
    pub single_flight: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            single_flight: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Fixed-window limiter settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    /// Requests per window (default: 100).
    #[serde(default = "default_max_requests")]
    pub max_requests: u64,
    /// Window length in seconds (default: 60).
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// "global" or "per_caller" (default: "global").
    #[serde(default)]
    pub scope: RateLimitScope,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            scope: RateLimitScope::default(),
        }
    }
}

impl RateLimitSettings {
    pub fn to_config(&self) -> RateLimitConfig {
        RateLimitConfig::new()
            .max_requests(self.max_requests)
            .window(Duration::from_secs(self.window_secs))
            .scope(self.scope)
    }
}

fn default_max_requests() -> u64 {
    100
}

fn default_window_secs() -> u64 {
    60
}

/// Remote completion backend.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSettings {
    /// Base URL of the OpenAI-compatible API (default: https://api.openai.com).
    #[serde(default = "default_remote_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 120).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Model-name prefixes routed to the remote backend (default: ["gpt"]).
    #[serde(default = "default_prefixes")]
    pub prefixes: Vec<String>,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: default_remote_url(),
            timeout_secs: default_timeout(),
            prefixes: default_prefixes(),
        }
    }
}

fn default_remote_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_prefixes() -> Vec<String> {
    vec![DEFAULT_REMOTE_PREFIX.to_string()]
}

/// Local inference pipelines. A task without a model stays unavailable.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalSettings {
    /// Ollama-compatible server (default: http://localhost:11434).
    #[serde(default = "default_local_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub text_model: Option<String>,
    #[serde(default)]
    pub code_model: Option<String>,
    #[serde(default)]
    pub summary_model: Option<String>,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            base_url: default_local_url(),
            timeout_secs: default_timeout(),
            text_model: None,
            code_model: None,
            summary_model: None,
        }
    }
}

fn default_local_url() -> String {
    DEFAULT_OLLAMA_URL.to_string()
}

/// Response cache.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// Capacity of the in-memory store (default: 10000).
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    /// Entry lifetime in seconds (default: 3600).
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl CacheSettings {
    pub fn to_config(&self) -> CacheConfig {
        CacheConfig::new()
            .max_entries(self.max_entries)
            .ttl(Duration::from_secs(self.ttl_secs))
    }
}

fn default_max_entries() -> u64 {
    10_000
}

fn default_ttl_secs() -> u64 {
    3600
}

/// Secrets configuration (API keys).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub openai: Option<ApiKeySecret>,
}

/// A single API key secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeySecret {
    pub api_key: String,
}

/// Provider name → environment variable name mapping.
const PROVIDER_ENV_VARS: &[(&str, &str)] = &[("openai", "OPENAI_API_KEY")];

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// An explicit path must exist. Without one, the first existing file
    /// among the user and system locations is used, or the defaults if
    /// there is none.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                debug!("no config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ScriptoriumError::Configuration(format!("Failed to parse config: {e}")))
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ScriptoriumError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            ScriptoriumError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(ScriptoriumError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(CONFIG_DIR).join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = Path::new(SYSTEM_DIR).join("config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Returns empty secrets if no file exists (keys may come from env vars).
    pub fn load() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(CONFIG_DIR).join("secrets.toml");
            if user_secrets.exists() {
                return Self::load_from(&user_secrets);
            }
        }

        let system_secrets = Path::new(SYSTEM_DIR).join("secrets.toml");
        if system_secrets.exists() {
            return Self::load_from(&system_secrets);
        }

        Ok(Secrets::default())
    }

    /// Load a specific secrets file after checking its permissions.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::check_permissions(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            ScriptoriumError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            ScriptoriumError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            ScriptoriumError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            return Err(ScriptoriumError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// Get API key for a provider, falling back to its environment variable.
    pub fn api_key(&self, provider: &str) -> Option<String> {
        let from_file = match provider {
            "openai" => self.openai.as_ref(),
            _ => None,
        }
        .map(|s| s.api_key.clone());

        from_file.or_else(|| {
            PROVIDER_ENV_VARS
                .iter()
                .find(|(name, _)| *name == provider)
                .and_then(|(_, env_var)| std::env::var(env_var).ok())
        })
    }
}
