use serde::{Deserialize, Serialize};

use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_CHUNK_PROMPT: &str = "Summarize this part of study notes clearly:";
pub const DEFAULT_COMBINE_PROMPT: &str =
    "Combine these partial summaries into one short, clear study summary:";
pub const DEFAULT_FALLBACK_SUMMARY: &str = "No summary returned.";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub notes_file: PathBuf,
    /// Upper bound for upload request bodies, in bytes
    pub max_upload_size: usize,
    pub summarizer: SummarizerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            notes_file: PathBuf::from("notes.json"),
            max_upload_size: 10 * 1024 * 1024,
            summarizer: SummarizerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Characters per chunk sent to the model
    pub chunk_size: usize,
    pub chunk_prompt: String,
    pub combine_prompt: String,
    pub fallback_summary: String,
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            chunk_size: 2500,
            chunk_prompt: DEFAULT_CHUNK_PROMPT.to_string(),
            combine_prompt: DEFAULT_COMBINE_PROMPT.to_string(),
            fallback_summary: DEFAULT_FALLBACK_SUMMARY.to_string(),
            timeout: None,
        }
    }
}

/// Environment variables that take precedence over the config file.
#[derive(Debug, Default, Deserialize)]
pub struct EnvOverrides {
    pub port: Option<u16>,
    pub notes_file: Option<PathBuf>,
    pub openai_api_key: Option<String>,
    pub openai_api_base: Option<String>,
    pub openai_model: Option<String>,
}

impl Config {
    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document means "all defaults"
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }

    pub fn apply_env(&mut self, overrides: EnvOverrides) {
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(notes_file) = overrides.notes_file {
            self.notes_file = notes_file;
        }
        if let Some(api_key) = overrides.openai_api_key {
            self.summarizer.api_key = Some(api_key);
        }
        if let Some(api_base) = overrides.openai_api_base {
            self.summarizer.api_base = api_base;
        }
        if let Some(model) = overrides.openai_model {
            self.summarizer.model = model;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.summarizer.chunk_size == 0 {
            return Err("summarizer.chunk_size must be greater than zero".to_string());
        }
        if self.max_upload_size == 0 {
            return Err("max_upload_size must be greater than zero".to_string());
        }
        Ok(())
    }
}

fn read_config_file(path: &str) -> Result<Config, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path)?;
    Config::from_yaml(&contents).map_err(Into::into)
}

pub fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    // Retrieve env variable
    let config_path =
        env::var("STUDYBUDDY_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());

    let mut config = if Path::new(&config_path).exists() {
        // Try env path
        tracing::info!("Loading config from '{}'", config_path);
        read_config_file(&config_path)?
    } else if Path::new("config.yaml").exists() {
        // Fallback to config.yaml
        tracing::warn!(
            "Config file '{}' not found, falling back to 'config.yaml'",
            config_path
        );
        read_config_file("config.yaml")?
    } else {
        // Fallback to built-in defaults
        tracing::info!("No config file found, using defaults and environment variables");
        Config::default()
    };

    let overrides = envy::from_env::<EnvOverrides>()
        .map_err(|e| format!("Failed to read environment overrides: {e}"))?;
    config.apply_env(overrides);
    config.validate()?;

    if config.summarizer.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set, summarization requests will be rejected upstream");
    }

    Ok(config)
}
