use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{Document, DocumentLoader};
use crate::crawler::extractor::extract_text;

/// Loads a whole file as one document
#[derive(Debug, Clone)]
pub struct TextLoader {
    path: PathBuf,
}

impl TextLoader {
    #[inline]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocumentLoader for TextLoader {
    async fn load(&self) -> Result<Vec<Document>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;

        Ok(vec![Document::from_source(
            content,
            &self.path.display().to_string(),
        )])
    }

    fn describe(&self) -> String {
        format!("text:{}", self.path.display())
    }
}

/// Loads the visible text of an HTML file as one document
#[derive(Debug, Clone)]
pub struct HtmlLoader {
    path: PathBuf,
}

impl HtmlLoader {
    #[inline]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocumentLoader for HtmlLoader {
    async fn load(&self) -> Result<Vec<Document>> {
        let html = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;

        Ok(vec![Document::from_source(
            extract_text(&html),
            &self.path.display().to_string(),
        )])
    }

    fn describe(&self) -> String {
        format!("html:{}", self.path.display())
    }
}
