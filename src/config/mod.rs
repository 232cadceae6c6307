// Configuration management module
// Loads `seek.toml` from the working directory and resolves every path against it

pub mod settings;


pub use settings::{
    API_KEY_ENV, CONFIG_FILE_NAME, Config, ConfigError, HistoryConfig, LoaderConfig, OpenAiConfig,
    PathsConfig, RetrievalConfig,
};

/// Directory the tool treats as its base when `--config-dir` is not given
#[inline]
pub fn default_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    std::env::current_dir().map_err(|_| ConfigError::DirectoryError)
}
