//! GlobeGuide configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::llm::LlmError;

/// Environment variable that turns on verbose debug output when set to "1"
pub const DEBUG_ENV_VAR: &str = "GLOBEGUIDE_DEBUG";

/// Whether a value of [`DEBUG_ENV_VAR`] enables debug output
///
/// Only the exact value "1" counts; anything else, including absence, disables.
pub fn debug_flag_enabled(value: Option<&str>) -> bool {
    value == Some("1")
}

/// Read [`DEBUG_ENV_VAR`] from the process environment
pub fn debug_from_env() -> bool {
    debug_flag_enabled(std::env::var(DEBUG_ENV_VAR).ok().as_deref())
}

/// Main GlobeGuide configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// File locations
    pub storage: StorageConfig,

    /// Conversation history policy
    pub history: HistoryConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before starting a chat
    ///
    /// Fails fast when the API key variable is unset.
    pub fn validate(&self) -> Result<()> {
        self.llm.get_api_key()?;
        Ok(())
    }

    /// Load configuration with fallback chain
    ///
    /// 1. Explicit `--config` path
    /// 2. `./.globeguide.yml`
    /// 3. `~/.config/globeguide/globeguide.yml`
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::default_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialised
    ///
    /// Errors are swallowed; the full load reports them once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = match config_path {
            Some(p) => Some(p.clone()),
            None => Self::default_paths().into_iter().find(|p| p.exists()),
        }?;
        Self::load_from_file(&path).ok()?.log_level
    }

    fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".globeguide.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("globeguide").join("globeguide.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name ("openai" for any OpenAI-compatible endpoint, or "anthropic")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per chat reply
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Maximum tokens for a preference extraction reply
    #[serde(rename = "extraction-max-tokens")]
    pub extraction_max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            base_url: "https://api.groq.com/openai".to_string(),
            max_tokens: 1024,
            extraction_max_tokens: 256,
            timeout_ms: 60_000,
        }
    }
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String, LlmError> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(LlmError::MissingApiKey(self.api_key_env.clone())),
        }
    }
}

/// File locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file holding preferences and chat history
    #[serde(rename = "state-file")]
    pub state_file: PathBuf,

    /// JSON array of known destination names
    #[serde(rename = "destinations-file")]
    pub destinations_file: PathBuf,

    /// Directory checked for prompt template overrides
    #[serde(rename = "prompts-dir")]
    pub prompts_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // XDG data directory (~/.local/share/globeguide on Linux)
        let data_dir = dirs::data_local_dir()
            .map(|d| d.join("globeguide"))
            .unwrap_or_else(|| PathBuf::from(".globeguide"));
        let prompts_dir = dirs::config_dir()
            .map(|d| d.join("globeguide").join("prompts"))
            .unwrap_or_else(|| PathBuf::from(".globeguide/prompts"));

        Self {
            state_file: data_dir.join("preferences.json"),
            destinations_file: data_dir.join("destinations.json"),
            prompts_dir,
        }
    }
}

/// Conversation history policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Keep at most this many turns (human and AI each count as one); unbounded when absent
    #[serde(rename = "max-turns")]
    pub max_turns: Option<usize>,
}
