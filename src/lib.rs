use thiserror::Error;

pub type Result<T> = std::result::Result<T, SeekError>;

#[derive(Error, Debug)]
pub enum SeekError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod chain;
pub mod commands;
pub mod config;
pub mod content_store;
pub mod conversation;
pub mod crawler;
pub mod database;
pub mod embeddings;
pub mod index;
pub mod llm;
pub mod loaders;
pub mod metadata;
pub mod openai;
pub mod session;

#[cfg(test)]
mod test_support;
