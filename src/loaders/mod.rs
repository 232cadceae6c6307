//! Document loaders feeding the index.
//!
//! Every source (project files, scraped pages, conversation history) is
//! wrapped in a [`DocumentLoader`] and collected into a [`LoaderSet`], which
//! materializes all of them when the index is built.

#[cfg(test)]
mod tests;

pub mod conversation;
pub mod directory;
pub mod file;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};
use walkdir::WalkDir;

pub use conversation::ConversationLoader;
pub use directory::DirectoryLoader;
pub use file::{HtmlLoader, TextLoader};

/// Metadata key holding where a document came from
pub const SOURCE_KEY: &str = "source";
/// Metadata key holding conversation tags
pub const TAGS_KEY: &str = "tags";

/// A unit of text with its metadata, as produced by a loader
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub content: String,
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    #[inline]
    pub fn new(content: String, metadata: BTreeMap<String, String>) -> Self {
        Self { content, metadata }
    }

    #[inline]
    pub fn from_source(content: String, source: &str) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(SOURCE_KEY.to_string(), source.to_string());
        Self { content, metadata }
    }

    #[inline]
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }
}

#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Read the underlying source; calling again re-reads it
    async fn load(&self) -> Result<Vec<Document>>;

    /// Short human-readable name of the source, used in logs
    fn describe(&self) -> String;
}

/// Ordered collection of loaders
#[derive(Default)]
pub struct LoaderSet {
    loaders: Vec<Box<dyn DocumentLoader>>,
}

impl LoaderSet {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, loader: Box<dyn DocumentLoader>) {
        self.loaders.push(loader);
    }

    #[inline]
    pub fn extend(&mut self, loaders: impl IntoIterator<Item = Box<dyn DocumentLoader>>) {
        self.loaders.extend(loaders);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    pub fn descriptions(&self) -> Vec<String> {
        self.loaders.iter().map(|l| l.describe()).collect()
    }

    /// Run every loader in order and concatenate the documents
    pub async fn load_all(&self) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        for loader in &self.loaders {
            let loaded = loader.load().await?;
            debug!("{} yielded {} documents", loader.describe(), loaded.len());
            documents.extend(loaded);
        }

        info!("Creating index of {} documents", documents.len());
        Ok(documents)
    }
}

impl std::fmt::Debug for LoaderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.descriptions()).finish()
    }
}

/// Files under `root` with the given extension, sorted by path.
///
/// Nothing is yielded from a path with a component named `exclude_dir`,
/// `root` and its ancestors included. A missing `root` yields nothing.
pub fn find_files(root: &Path, extension: &str, exclude_dir: Option<&str>) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| {
            exclude_dir.is_none_or(|excluded| !has_component(entry.path(), excluded))
        })
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.extension().is_some_and(|ext| ext == extension))
        .collect();

    files.sort();
    files
}

fn has_component(path: &Path, name: &str) -> bool {
    path.components().any(|component| component.as_os_str() == name)
}

/// Build one loader per project file, grouped by extension in the given order
pub fn discover_project_loaders(
    project_dir: &Path,
    extensions: &[String],
    exclude_dir: &str,
    html_extensions: &[String],
) -> Vec<Box<dyn DocumentLoader>> {
    let mut loaders: Vec<Box<dyn DocumentLoader>> = Vec::new();

    for extension in extensions {
        let is_html = html_extensions.contains(extension);

        for path in find_files(project_dir, extension, Some(exclude_dir)) {
            if is_html {
                info!("Using HTML loader for {}", path.display());
                loaders.push(Box::new(HtmlLoader::new(path)));
            } else {
                info!("Using text loader for {}", path.display());
                loaders.push(Box::new(TextLoader::new(path)));
            }
        }
    }

    loaders
}
