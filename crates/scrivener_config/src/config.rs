//! Configuration types and loading.

use config::{Config, Environment, File, FileFormat, Map};
use scrivener_error::{ConfigError, ScrivenerError, ScrivenerResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../scrivener.toml");

/// Largest accepted retry ceiling.
pub const MAX_RETRY_CEILING: u32 = 10;

/// Highest possible review total.
pub const MAX_REVIEW_TOTAL: i64 = 50;

/// Chat model settings.
#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters, derive_setters::Setters,
)]
#[setters(prefix = "with_", into)]
pub struct LlmConfig {
    /// OpenAI-compatible API base, e.g. `https://api.openai.com/v1`
    #[serde(default = "default_llm_base_url")]
    base_url: String,
    /// Model name
    #[serde(default = "default_llm_model")]
    model: String,
    /// API key; falls back to `OPENAI_API_KEY`
    #[serde(default)]
    #[setters(strip_option)]
    api_key: Option<String>,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    temperature: f32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key: None,
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Image generation settings.
#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters, derive_setters::Setters,
)]
#[setters(prefix = "with_", into)]
pub struct ImageConfig {
    /// Image API base
    #[serde(default = "default_image_base_url")]
    base_url: String,
    /// Image model name
    #[serde(default = "default_image_model")]
    model: String,
    /// API key; falls back to `VOLCENGINE_API_KEY`
    #[serde(default)]
    #[setters(strip_option)]
    api_key: Option<String>,
    /// Default size label
    #[serde(default = "default_image_size")]
    size: String,
}

fn default_image_base_url() -> String {
    "https://ark.cn-beijing.volces.com/api/v3".to_string()
}

fn default_image_model() -> String {
    "doubao-seedream-4-5-251128".to_string()
}

fn default_image_size() -> String {
    "2k".to_string()
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            base_url: default_image_base_url(),
            model: default_image_model(),
            api_key: None,
            size: default_image_size(),
        }
    }
}

/// Workflow policy settings.
#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters, derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct WorkflowConfig {
    /// Retries allowed after the first failed review
    #[serde(default = "default_max_retries")]
    max_retries: u32,
    /// Default target length
    #[serde(default = "default_target_words")]
    target_words: u32,
    /// Default retrieval limit
    #[serde(default = "default_rag_top_k")]
    rag_top_k: usize,
    /// Review totals below this always fail
    #[serde(default = "default_pass_threshold")]
    pass_threshold: i64,
    /// Fetched articles are truncated to this many characters
    #[serde(default = "default_max_source_chars")]
    max_source_chars: usize,
}

fn default_max_retries() -> u32 {
    3
}

fn default_target_words() -> u32 {
    1000
}

fn default_rag_top_k() -> usize {
    3
}

fn default_pass_threshold() -> i64 {
    35
}

fn default_max_source_chars() -> usize {
    50_000
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            target_words: default_target_words(),
            rag_top_k: default_rag_top_k(),
            pass_threshold: default_pass_threshold(),
            max_source_chars: default_max_source_chars(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Complete Scrivener configuration.
///
/// # Examples
///
/// ```
/// use scrivener_config::ScrivenerConfig;
///
/// let config = ScrivenerConfig::default();
/// assert_eq!(config.workflow().pass_threshold(), &35);
/// assert!(config.validate().is_ok());
/// ```
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct ScrivenerConfig {
    /// Chat model settings
    #[serde(default)]
    llm: LlmConfig,
    /// Image generation settings
    #[serde(default)]
    image: ImageConfig,
    /// Workflow policy
    #[serde(default)]
    workflow: WorkflowConfig,
    /// Logging
    #[serde(default)]
    logging: LoggingConfig,
}

impl ScrivenerConfig {
    /// Load configuration from a single file on top of the bundled defaults.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> ScrivenerResult<Self> {
        let config = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                ScrivenerError::from(ConfigError::new(format!(
                    "Failed to read config file {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize::<Self>()
            .map_err(|e| {
                ScrivenerError::from(ConfigError::new(format!(
                    "Failed to parse config file {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?;
        Ok(config.with_env_key_fallbacks(|name| std::env::var(name).ok()))
    }

    /// Load configuration with the standard precedence.
    ///
    /// Precedence (highest to lowest):
    /// 1. `SCRIVENER_*` environment variables
    /// 2. `./scrivener.toml`
    /// 3. `~/.config/scrivener/scrivener.toml`
    /// 4. Bundled defaults
    pub fn load() -> ScrivenerResult<Self> {
        let home_config = dirs::home_dir().map(|home| home.join(".config/scrivener/scrivener.toml"));
        let config = Self::load_layered(home_config.as_deref(), Path::new("scrivener.toml"), None)?;
        Ok(config.with_env_key_fallbacks(|name| std::env::var(name).ok()))
    }

    /// Load with explicit layer locations.
    ///
    /// `env` replaces the process environment as the source of
    /// `SCRIVENER_*` overrides when given. Key fallbacks are not applied.
    pub fn load_layered(
        home_config: Option<&Path>,
        local_config: &Path,
        env: Option<Map<String, String>>,
    ) -> ScrivenerResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home_config) = home_config {
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::from(local_config).required(false))
            .add_source(
                Environment::with_prefix("SCRIVENER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            );

        builder
            .build()
            .map_err(|e| {
                ScrivenerError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                ScrivenerError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Fill missing API keys from the conventional provider variables.
    pub fn with_env_key_fallbacks(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let present = |key: Option<String>| key.filter(|k| !k.trim().is_empty());
        if self.llm.api_key.is_none() {
            self.llm.api_key = present(lookup("OPENAI_API_KEY"));
        }
        if self.image.api_key.is_none() {
            self.image.api_key = present(lookup("VOLCENGINE_API_KEY"));
        }
        self
    }

    /// Reject values the workflow cannot run with.
    pub fn validate(&self) -> ScrivenerResult<()> {
        if self.workflow.target_words == 0 {
            return Err(ConfigError::new("workflow.target_words must be positive").into());
        }
        if self.workflow.pass_threshold > MAX_REVIEW_TOTAL {
            return Err(ConfigError::new(format!(
                "workflow.pass_threshold must be at most {}, got {}",
                MAX_REVIEW_TOTAL, self.workflow.pass_threshold
            ))
            .into());
        }
        if self.workflow.max_retries > MAX_RETRY_CEILING {
            return Err(ConfigError::new(format!(
                "workflow.max_retries must be at most {}, got {}",
                MAX_RETRY_CEILING, self.workflow.max_retries
            ))
            .into());
        }
        Ok(())
    }
}
