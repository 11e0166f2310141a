//! Configuration loading and management for pagewise.
//!
//! Loads settings from `pagewise.toml` with environment variable overrides for sensitive data,
//! then resolves them into an immutable [`RunConfig`] for a single run.

use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_FILE_NAME: &str = "pagewise.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("missing required API key for provider: {0}")]
    MissingApiKey(String),
    #[error("invalid document name: {0:?}")]
    InvalidDocument(String),
}

/// Source document settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// File name of the book, e.g. "meditations.pdf"
    pub name: String,
    /// Where to stage the book from when it is not already in place
    pub source: Option<PathBuf>,
}

/// What happens to output from previous runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputPolicy {
    /// Wipe knowledge and summaries before starting
    #[default]
    Fresh,
    /// Keep previous output and append to it
    Resume,
}

/// Page loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Pages between interval summaries; 0 disables them
    pub interval: Option<usize>,
    /// Maximum number of pages to process; absent means the whole book
    pub page_limit: Option<usize>,
    pub policy: OutputPolicy,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// LLM provider: "gemini" or "openai"
    pub provider: String,
    /// Model used to extract knowledge from each page
    pub classifier_model: String,
    /// Model used to write the markdown summaries
    pub summarizer_model: String,
}

/// API keys configuration (loaded from environment)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub gemini_key: Option<String>,
    #[serde(default)]
    pub openai_key: Option<String>,
}

/// Storage paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base directory for staged books, knowledge bases and summaries
    pub path: PathBuf,
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub document: DocumentConfig,
    #[serde(default)]
    pub run: RunSettings,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from the given path, or the default locations, or built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::find_config_file() {
                Some(path) => Self::from_file(&path)?,
                None => Config::default(),
            },
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse configuration from a specific path without environment overrides
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Override API keys from environment variables
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.api.gemini_key = Some(key);
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.api.openai_key = Some(key);
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let local_config = PathBuf::from(CONFIG_FILE_NAME);
        if local_config.exists() {
            return Some(local_config);
        }

        let home_config = dirs::home_dir()?
            .join(".config")
            .join("pagewise")
            .join(CONFIG_FILE_NAME);
        home_config.exists().then_some(home_config)
    }

    /// Get the API key for the configured provider
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        match self.agent.provider.as_str() {
            "gemini" => self
                .api
                .gemini_key
                .as_deref()
                .ok_or_else(|| ConfigError::MissingApiKey("gemini".to_string())),
            "openai" => self
                .api
                .openai_key
                .as_deref()
                .ok_or_else(|| ConfigError::MissingApiKey("openai".to_string())),
            other => Err(ConfigError::MissingApiKey(other.to_string())),
        }
    }

    /// Resolve into the immutable settings for one run
    pub fn run_config(&self) -> Result<RunConfig, ConfigError> {
        let name = self.document.name.trim();
        let stem = Path::new(name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty() && Path::new(name).file_name() == Some(OsStr::new(name)))
            .ok_or_else(|| ConfigError::InvalidDocument(self.document.name.clone()))?;

        Ok(RunConfig {
            document: name.to_string(),
            stem: stem.to_string(),
            source: self
                .document
                .source
                .clone()
                .unwrap_or_else(|| PathBuf::from(name)),
            layout: Layout::new(&self.storage.path),
            interval: self.run.interval.and_then(NonZeroUsize::new),
            page_limit: self.run.page_limit,
            policy: self.run.policy,
        })
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            name: "book.pdf".to_string(),
            source: None,
        }
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            interval: Some(20),
            page_limit: None,
            policy: OutputPolicy::Fresh,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            classifier_model: "gpt-4o-mini".to_string(),
            summarizer_model: "gpt-4o".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("book_analysis"),
        }
    }
}

/// Output directory layout under the storage base
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub base: PathBuf,
    pub pdfs: PathBuf,
    pub knowledge: PathBuf,
    pub summaries: PathBuf,
}

impl Layout {
    pub fn new(base: &Path) -> Self {
        Self {
            base: base.to_path_buf(),
            pdfs: base.join("pdfs"),
            knowledge: base.join("knowledge_bases"),
            summaries: base.join("summaries"),
        }
    }
}

/// Immutable settings for a single run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Document file name as configured
    pub document: String,
    /// Document name without its extension, used in output file names
    pub stem: String,
    /// Fallback location to copy the document from
    pub source: PathBuf,
    pub layout: Layout,
    pub interval: Option<NonZeroUsize>,
    pub page_limit: Option<usize>,
    pub policy: OutputPolicy,
}

impl RunConfig {
    /// Where the document is staged for processing
    pub fn staged_document(&self) -> PathBuf {
        self.layout.pdfs.join(&self.document)
    }

    /// Canonical knowledge base file for this document
    pub fn knowledge_path(&self) -> PathBuf {
        self.layout
            .knowledge
            .join(format!("{}_knowledge.json", self.stem))
    }
}
