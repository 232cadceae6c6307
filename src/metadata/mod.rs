//! Description and tag generation for HTML sources.
//!
//! For every `*.html` file directly inside a directory, two chat requests
//! produce a description and a comma-separated tag list, which are written
//! next to the file as `<file>.html-metadata.md`.

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::llm::{ChatClient, ChatMessage};

/// Leading characters of a file sent to the model
pub const EXCERPT_CHARS: usize = 100;
pub const METADATA_SUFFIX: &str = "-metadata.md";
const SYSTEM_PROMPT: &str = "You are a helpful assistant.";
const HTML_EXTENSION: &str = "html";

/// First [`EXCERPT_CHARS`] characters of `text`
#[inline]
pub fn excerpt(text: &str) -> &str {
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Split a model reply on commas, trimming each tag
#[inline]
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.trim().split(',').map(|tag| tag.trim().to_string()).collect()
}

pub fn render_metadata(filename: &str, description: &str, tags: &[String]) -> String {
    let mut rendered = format!("## {filename}\n\n**Description:** {description}\n\n**Tags:**\n\n");
    for tag in tags {
        rendered.push_str("- ");
        rendered.push_str(tag);
        rendered.push('\n');
    }
    rendered
}

#[inline]
pub fn metadata_path(dir: &Path, filename: &str) -> PathBuf {
    dir.join(format!("{filename}{METADATA_SUFFIX}"))
}

/// Files directly in `dir` with an `.html` extension, sorted
pub fn html_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == HTML_EXTENSION) && path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

#[derive(Debug, Clone)]
pub struct MetadataGenerator {
    chat: ChatClient,
}

impl MetadataGenerator {
    #[inline]
    pub fn new(chat: ChatClient) -> Self {
        Self { chat }
    }

    fn ask(&self, question: String) -> Result<String> {
        let messages = [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(question)];
        Ok(self.chat.complete(&messages)?.trim().to_string())
    }

    pub fn describe(&self, text: &str) -> Result<String> {
        self.ask(format!("Describe the following text: {}...", excerpt(text)))
            .context("Failed to generate description")
    }

    pub fn tags(&self, text: &str) -> Result<Vec<String>> {
        let raw = self
            .ask(format!("Give tags for the following text: {}...", excerpt(text)))
            .context("Failed to generate tags")?;
        Ok(split_tags(&raw))
    }

    /// Generate and write the metadata file for one HTML file
    pub fn generate_for_file(&self, path: &Path) -> Result<PathBuf> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow::anyhow!("No file name in {}", path.display()))?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));

        debug!("Generating metadata for {}", path.display());
        let description = self.describe(&text)?;
        let tags = self.tags(&text)?;

        let output = metadata_path(dir, &filename);
        std::fs::write(&output, render_metadata(&filename, &description, &tags))
            .with_context(|| format!("Failed to write {}", output.display()))?;

        info!("Wrote {}", output.display());
        Ok(output)
    }

    /// Process every HTML file in `dir`, stopping at the first failure
    pub fn process_directory(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        html_files(dir)?
            .iter()
            .map(|path| self.generate_for_file(path))
            .collect()
    }
}
