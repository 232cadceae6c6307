
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const PAGE_PREFIX: &str = "page";
const PAGE_EXTENSION: &str = "txt";

/// Flat-file store for scraped page text: one `page<N>.txt` per URL,
/// numbered by the URL's zero-based position in the input list.
#[derive(Debug, Clone)]
pub struct ContentStore {
    dir: PathBuf,
}

impl ContentStore {
    #[inline]
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[inline]
    pub fn page_path(&self, index: usize) -> PathBuf {
        let file_name = format!("{PAGE_PREFIX}{index}.{PAGE_EXTENSION}");
        self.dir.join(file_name)
    }

    /// Write every page, overwriting files left by earlier runs
    #[inline]
    pub fn store_pages(&self, pages: &[String]) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create content directory: {}", self.dir.display())
        })?;

        let mut written = Vec::with_capacity(pages.len());
        for (index, text) in pages.iter().enumerate() {
            let path = self.page_path(index);
            fs::write(&path, text)
                .with_context(|| format!("Failed to write page: {}", path.display()))?;
            written.push(path);
        }

        let stale = self.stale_pages(pages.len())?;
        if !stale.is_empty() {
            warn!(
                "{} page files from an earlier, longer url list are still in {} and will be indexed: {:?}",
                stale.len(),
                self.dir.display(),
                stale
            );
        }

        info!("Stored {} pages in {}", written.len(), self.dir.display());
        Ok(written)
    }

    /// Page files whose index is at or beyond `count`
    #[inline]
    pub fn stale_pages(&self, count: usize) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir).with_context(|| {
            format!("Failed to read content directory: {}", self.dir.display())
        })?;

        let mut stale: Vec<(usize, PathBuf)> = Vec::new();
        for entry in entries {
            let entry = entry.context("Failed to read content directory entry")?;
            let path = entry.path();
            if let Some(index) = page_index(&path) {
                if index >= count {
                    stale.push((index, path));
                }
            }
        }

        stale.sort_by_key(|(index, _)| *index);
        Ok(stale.into_iter().map(|(_, path)| path).collect())
    }
}

/// Parse the N out of `pageN.txt`
fn page_index(path: &Path) -> Option<usize> {
    if path.extension()? != PAGE_EXTENSION {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix(PAGE_PREFIX)?
        .parse()
        .ok()
}
