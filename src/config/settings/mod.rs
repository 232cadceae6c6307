
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::crawler::CrawlerConfig;
use crate::embeddings::chunking::ChunkingConfig;

pub const CONFIG_FILE_NAME: &str = "seek.toml";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub openai: OpenAiConfig,
    pub paths: PathsConfig,
    pub loader: LoaderConfig,
    pub retrieval: RetrievalConfig,
    pub history: HistoryConfig,
    pub crawler: CrawlerConfig,
    pub chunking: ChunkingConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub chat_model: String,
    pub embedding_model: String,
    pub batch_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    pub retry_attempts: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1/".to_string(),
            api_key: None,
            chat_model: "gpt-3.5-turbo".to_string(),
            embedding_model: "text-embedding-ada-002".to_string(),
            batch_size: 16,
            timeout_seconds: None,
            retry_attempts: 1,
        }
    }
}

/// Locations of every file and directory the tool reads or writes.
/// Relative paths are resolved against [`Config::base_dir`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    pub urls_file: PathBuf,
    pub web_content_dir: PathBuf,
    pub project_dir: PathBuf,
    pub database: PathBuf,
    pub persist_dir: PathBuf,
    pub metadata_source_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            urls_file: PathBuf::from("urls.txt"),
            web_content_dir: PathBuf::from("web_content"),
            project_dir: PathBuf::from("project"),
            database: PathBuf::from("conversations.db"),
            persist_dir: PathBuf::from("persist"),
            metadata_source_dir: PathBuf::from("project/src"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoaderConfig {
    /// File extensions picked up under the project directory, in load order
    pub extensions: Vec<String>,
    /// Extensions loaded through HTML text extraction instead of as plain text
    pub html_extensions: Vec<String>,
    /// Any path with a component equal to this is skipped
    pub exclude_dir: String,
    /// Concurrent reads for the scraped-content directory loader
    pub workers: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            extensions: ["html", "js", "json", "txt", "md", "toml"]
                .into_iter()
                .map(String::from)
                .collect(),
            html_extensions: vec!["html".to_string()],
            exclude_dir: "node_modules".to_string(),
            workers: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    pub results: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { results: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    pub tags: String,
    pub title: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            tags: "example".to_string(),
            title: "Example Conversation".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid batch size: {0} (must be between 1 and 2048)")]
    InvalidBatchSize(u32),
    #[error("Invalid timeout: {0} (must be between 1 and 600 seconds)")]
    InvalidTimeout(u64),
    #[error("Invalid retry attempts: {0} (must be between 1 and 10)")]
    InvalidRetryAttempts(u32),
    #[error("Invalid result count: {0} (must be at least 1)")]
    InvalidResultCount(usize),
    #[error("Invalid loader workers: {0} (must be between 1 and 64)")]
    InvalidWorkers(usize),
    #[error("No file extensions configured for the project loader")]
    NoExtensions,
    #[error("Invalid target chunk size: {0} (must be between 100 and 2048)")]
    InvalidTargetChunkSize(usize),
    #[error("Invalid max chunk size: {0} (must be between 200 and 4096)")]
    InvalidMaxChunkSize(usize),
    #[error("Invalid min chunk size: {0} (must be between 50 and 1024)")]
    InvalidMinChunkSize(usize),
    #[error("Invalid overlap size: {0} (must be between 0 and 512)")]
    InvalidOverlapSize(usize),
    #[error("Max chunk size ({0}) must be greater than target chunk size ({1})")]
    MaxChunkSizeTooSmall(usize, usize),
    #[error("Target chunk size ({0}) must be greater than min chunk size ({1})")]
    TargetChunkSizeTooSmall(usize, usize),
    #[error("No API key configured; set {API_KEY_ENV} or openai.api_key in {CONFIG_FILE_NAME}")]
    MissingApiKey,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Config {
    /// Load `seek.toml` from `config_dir`, falling back to defaults when the
    /// file does not exist. An `OPENAI_API_KEY` environment value wins over
    /// the file.
    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILE_NAME);

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).with_context(|| {
                format!("Failed to read config file: {}", config_path.display())
            })?;
            toml::from_str::<Config>(&content).with_context(|| {
                format!("Failed to parse config file: {}", config_path.display())
            })?
        } else {
            debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };
        config.base_dir = config_dir.as_ref().to_path_buf();
        config.apply_api_key(std::env::var(API_KEY_ENV).ok());

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    /// Take the API key from the environment when one is present
    #[inline]
    pub fn apply_api_key(&mut self, env_key: Option<String>) {
        if let Some(key) = env_key.filter(|k| !k.trim().is_empty()) {
            self.openai.api_key = Some(key);
        }
    }

    #[inline]
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.openai
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }

    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.openai.validate()?;
        self.validate_loader_config()?;
        if self.retrieval.results == 0 {
            return Err(ConfigError::InvalidResultCount(self.retrieval.results));
        }
        if let Some(timeout) = self.crawler.timeout_seconds {
            if !(1..=600).contains(&timeout) {
                return Err(ConfigError::InvalidTimeout(timeout));
            }
        }
        self.validate_chunking_config()?;
        Ok(())
    }

    fn validate_loader_config(&self) -> Result<(), ConfigError> {
        if self.loader.extensions.is_empty() {
            return Err(ConfigError::NoExtensions);
        }
        if !(1..=64).contains(&self.loader.workers) {
            return Err(ConfigError::InvalidWorkers(self.loader.workers));
        }
        Ok(())
    }

    fn validate_chunking_config(&self) -> Result<(), ConfigError> {
        let config = &self.chunking;

        if !(100..=2048).contains(&config.target_chunk_size) {
            return Err(ConfigError::InvalidTargetChunkSize(
                config.target_chunk_size,
            ));
        }

        if !(200..=4096).contains(&config.max_chunk_size) {
            return Err(ConfigError::InvalidMaxChunkSize(config.max_chunk_size));
        }

        if !(50..=1024).contains(&config.min_chunk_size) {
            return Err(ConfigError::InvalidMinChunkSize(config.min_chunk_size));
        }

        if config.overlap_size > 512 {
            return Err(ConfigError::InvalidOverlapSize(config.overlap_size));
        }

        if config.max_chunk_size <= config.target_chunk_size {
            return Err(ConfigError::MaxChunkSizeTooSmall(
                config.max_chunk_size,
                config.target_chunk_size,
            ));
        }

        if config.target_chunk_size <= config.min_chunk_size {
            return Err(ConfigError::TargetChunkSizeTooSmall(
                config.target_chunk_size,
                config.min_chunk_size,
            ));
        }

        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    #[inline]
    pub fn urls_file_path(&self) -> PathBuf {
        self.resolve(&self.paths.urls_file)
    }

    #[inline]
    pub fn web_content_path(&self) -> PathBuf {
        self.resolve(&self.paths.web_content_dir)
    }

    #[inline]
    pub fn project_path(&self) -> PathBuf {
        self.resolve(&self.paths.project_dir)
    }

    /// Get the path for the SQLite conversation database
    #[inline]
    pub fn database_path(&self) -> PathBuf {
        self.resolve(&self.paths.database)
    }

    /// Get the path of the persisted vector index
    #[inline]
    pub fn persist_path(&self) -> PathBuf {
        self.resolve(&self.paths.persist_dir)
    }

    #[inline]
    pub fn metadata_source_path(&self) -> PathBuf {
        self.resolve(&self.paths.metadata_source_dir)
    }
}

impl OpenAiConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api_url()?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidProtocol(url.scheme().to_string()));
        }

        if self.chat_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.chat_model.clone()));
        }

        if self.embedding_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.embedding_model.clone()));
        }

        if self.batch_size == 0 || self.batch_size > 2048 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        if let Some(timeout) = self.timeout_seconds {
            if !(1..=600).contains(&timeout) {
                return Err(ConfigError::InvalidTimeout(timeout));
            }
        }

        if !(1..=10).contains(&self.retry_attempts) {
            return Err(ConfigError::InvalidRetryAttempts(self.retry_attempts));
        }

        Ok(())
    }

    /// Base URL of the API with a trailing slash, so endpoint names join under it
    pub fn api_url(&self) -> Result<Url, ConfigError> {
        let base = if self.api_base.ends_with('/') {
            self.api_base.clone()
        } else {
            format!("{}/", self.api_base)
        };
        Url::parse(&base).map_err(|_| ConfigError::InvalidUrl(self.api_base.clone()))
    }

    pub fn set_chat_model(&mut self, model: String) -> Result<(), ConfigError> {
        if model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(model));
        }
        self.chat_model = model;
        Ok(())
    }
}
