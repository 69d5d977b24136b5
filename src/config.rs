use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::store::memory::{DEFAULT_LONG_TERM_CAPACITY, DEFAULT_SHORT_TERM_CAPACITY};
use crate::store::thought::DEFAULT_THOUGHT_CAPACITY;

/// Engine settings: gateway endpoint, model choices, retry ceiling, and
/// store capacities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_api_url")]
    pub llm_api_url: String,
    #[serde(default)]
    pub llm_api_key: Option<String>,
    #[serde(default = "default_completion_model")]
    pub completion_model: String,
    #[serde(default = "default_articulation_model")]
    pub articulation_model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_thought_capacity")]
    pub max_thought_count: usize,
    #[serde(default = "default_short_term_capacity")]
    pub max_short_term_count: usize,
    #[serde(default = "default_long_term_capacity")]
    pub max_long_term_count: usize,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_completion_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_articulation_model() -> String {
    "gpt-4o".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_retries() -> u32 {
    3
}

fn default_thought_capacity() -> usize {
    DEFAULT_THOUGHT_CAPACITY
}

fn default_short_term_capacity() -> usize {
    DEFAULT_SHORT_TERM_CAPACITY
}

fn default_long_term_capacity() -> usize {
    DEFAULT_LONG_TERM_CAPACITY
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            llm_api_url: default_api_url(),
            llm_api_key: None,
            completion_model: default_completion_model(),
            articulation_model: default_articulation_model(),
            embedding_model: default_embedding_model(),
            temperature: default_temperature(),
            max_retries: default_max_retries(),
            max_thought_count: default_thought_capacity(),
            max_short_term_count: default_short_term_capacity(),
            max_long_term_count: default_long_term_capacity(),
        }
    }
}

impl EngineConfig {
    fn get_base_dir() -> PathBuf {
        match env::current_exe() {
            Ok(exe_path) => exe_path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")),
            Err(_) => PathBuf::from("."),
        }
    }

    /// Path to the config file (next to the executable).
    pub fn config_path() -> PathBuf {
        Self::get_base_dir().join("muser_config.toml")
    }

    /// Load config from `muser_config.toml`, falling back to defaults plus
    /// environment variables when the file is absent or malformed.
    pub fn load() -> Self {
        let path = Self::config_path();
        match Self::load_from(&path) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::warn!(
                    "No usable config at {:?} ({}), using defaults + env vars",
                    path,
                    e
                );
                Self::from_env()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse {:?}", path))
    }

    /// Save config next to the executable.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let toml_string = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write config to {:?}", path))?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Defaults overridden by environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = env::var("LLM_API_URL") {
            config.llm_api_url = url;
        }
        if let Ok(key) = env::var("LLM_API_KEY").or_else(|_| env::var("OPENAI_API_KEY")) {
            config.llm_api_key = Some(key);
        }
        if let Ok(model) = env::var("LLM_MODEL") {
            config.completion_model = model;
        }
        if let Ok(model) = env::var("ARTICULATION_MODEL") {
            config.articulation_model = model;
        }
        if let Ok(model) = env::var("EMBEDDING_MODEL") {
            config.embedding_model = model;
        }
        if let Ok(count) = env::var("MUSER_MAX_THOUGHTS") {
            if let Ok(count) = count.parse() {
                config.max_thought_count = count;
            }
        }
        if let Ok(count) = env::var("MUSER_MAX_SHORT_TERM") {
            if let Ok(count) = count.parse() {
                config.max_short_term_count = count;
            }
        }
        if let Ok(count) = env::var("MUSER_MAX_LONG_TERM") {
            if let Ok(count) = count.parse() {
                config.max_long_term_count = count;
            }
        }

        config
    }
}
