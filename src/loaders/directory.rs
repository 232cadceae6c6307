use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use super::{Document, DocumentLoader, TextLoader, find_files};

/// Loads every file with one extension below a directory, a few at a time
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    dir: PathBuf,
    extension: String,
    workers: usize,
}

impl DirectoryLoader {
    #[inline]
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>, workers: usize) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
            workers: workers.max(1),
        }
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl DocumentLoader for DirectoryLoader {
    async fn load(&self) -> Result<Vec<Document>> {
        let files = find_files(&self.dir, &self.extension, None);
        debug!(
            "Found {} *.{} files under {}",
            files.len(),
            self.extension,
            self.dir.display()
        );

        if files.is_empty() {
            return Ok(Vec::new());
        }

        let bar = if console::user_attended_stderr() {
            ProgressBar::new(files.len() as u64).with_style(
                ProgressStyle::with_template("{bar:40} [{pos}/{len}] Loading {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            )
        } else {
            ProgressBar::hidden()
        };
        bar.set_message(self.dir.display().to_string());

        // `buffered` keeps the sorted file order while reading concurrently
        let batches: Vec<Vec<Document>> = stream::iter(files)
            .map(|path| {
                let bar = bar.clone();
                async move {
                    let documents = TextLoader::new(path).load().await;
                    bar.inc(1);
                    documents
                }
            })
            .buffered(self.workers)
            .try_collect()
            .await?;

        bar.finish_and_clear();

        Ok(batches.into_iter().flatten().collect())
    }

    fn describe(&self) -> String {
        format!("directory:{}/**/*.{}", self.dir.display(), self.extension)
    }
}
