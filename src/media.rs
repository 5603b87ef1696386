//! Image extraction from `.docx` containers.
//!
//! Word stores every embedded picture as a separate archive member under
//! `word/media/`. Extraction copies those members out verbatim under
//! sequential names (`image_001.png`, `image_002.jpeg`, ...), numbered in
//! central directory order.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use anyhow::{Context, Result};

use crate::io::{LocalFileReader, ReadAt};
use crate::zip::{ZipArchive, ZipEntry};

/// Archive directory holding embedded media in Word documents.
pub const MEDIA_PREFIX: &str = "word/media/";

/// Extension used when an entry name has none.
pub const DEFAULT_EXTENSION: &str = ".png";

/// One file written by an extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRecord {
    /// Entry name inside the container
    pub original: String,
    /// Path the bytes were written to
    pub saved: PathBuf,
    /// Output file name, `image_NNN.ext`
    pub name: String,
}

/// Progress notifications emitted while extracting.
#[derive(Debug, Clone, Copy)]
pub enum Progress<'a> {
    /// Media entries were counted; nothing written yet.
    Found { total: usize },
    /// Entry `index` (1-based) of `total` was written as `name`.
    Extracted {
        index: usize,
        total: usize,
        name: &'a str,
    },
    /// All entries written. `output_dir` is absolute.
    Finished { count: usize, output_dir: &'a Path },
}

/// A media entry paired with the name it will be saved under.
#[derive(Debug, Clone)]
pub struct MediaItem<'a> {
    pub index: usize,
    pub entry: &'a ZipEntry,
    pub file_name: String,
}

/// Extension of an archive entry name, leading dot included.
///
/// Follows the usual "split at the last dot of the final component" rule,
/// where leading dots (as in `.hidden`) do not start an extension. Names
/// without one map to [`DEFAULT_EXTENSION`].
pub fn media_extension(name: &str) -> &str {
    let base = name.rsplit('/').next().unwrap_or(name);
    let stem_start = base.len() - base.trim_start_matches('.').len();
    match base[stem_start..].rfind('.') {
        Some(dot) => &base[stem_start + dot..],
        None => DEFAULT_EXTENSION,
    }
}

/// Output file name for the `index`-th (1-based) media entry.
pub fn output_file_name(index: usize, entry_name: &str) -> String {
    format!("image_{:03}{}", index, media_extension(entry_name))
}

/// Extracts media entries from an opened container.
pub struct MediaExtractor<R: ReadAt> {
    archive: ZipArchive<R>,
    prefix: String,
}

impl MediaExtractor<LocalFileReader> {
    /// Open a container on disk.
    pub async fn open(path: &Path) -> Result<Self> {
        let reader = Arc::new(LocalFileReader::new(path)?);
        Self::from_reader(reader)
            .await
            .with_context(|| format!("Failed to read container {}", path.display()))
    }
}

impl<R: ReadAt> MediaExtractor<R> {
    pub async fn from_reader(reader: Arc<R>) -> Result<Self> {
        Ok(Self {
            archive: ZipArchive::open(reader).await?,
            prefix: MEDIA_PREFIX.to_string(),
        })
    }

    /// Use a different archive directory than [`MEDIA_PREFIX`].
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Media entries in archive order, with their output names.
    ///
    /// Every entry under the prefix counts, including a bare directory
    /// entry such as `word/media/`, which extracts as an empty file.
    pub fn media(&self) -> Vec<MediaItem<'_>> {
        self.archive
            .entries()
            .iter()
            .filter(|e| e.name.starts_with(&self.prefix))
            .enumerate()
            .map(|(i, entry)| MediaItem {
                index: i + 1,
                entry,
                file_name: output_file_name(i + 1, &entry.name),
            })
            .collect()
    }

    /// Extract every media entry into `output_dir`.
    pub async fn extract(&self, output_dir: &Path) -> Result<Vec<ExtractionRecord>> {
        self.extract_with(output_dir, |_| {}).await
    }

    /// Extract every media entry into `output_dir`, reporting progress.
    ///
    /// The directory is created if needed and never cleared; existing files
    /// with the same names are overwritten. The first failure aborts the
    /// run and files already written are left in place.
    pub async fn extract_with<F>(
        &self,
        output_dir: &Path,
        mut on_progress: F,
    ) -> Result<Vec<ExtractionRecord>>
    where
        F: FnMut(Progress<'_>),
    {
        create_output_dir(output_dir).await?;

        let items = self.media();
        let total = items.len();
        tracing::info!(total, prefix = %self.prefix, "found media entries");
        on_progress(Progress::Found { total });

        let mut records = Vec::with_capacity(total);
        for item in items {
            if item.entry.is_directory() {
                tracing::debug!(original = %item.entry.name, "directory entry, writing empty file");
            }
            let data = self.archive.read(item.entry).await?;
            let saved = output_dir.join(&item.file_name);
            write_file(&saved, &data).await?;
            tracing::info!(
                index = item.index,
                total,
                original = %item.entry.name,
                saved = %saved.display(),
                bytes = data.len(),
                "extracted"
            );

            on_progress(Progress::Extracted {
                index: item.index,
                total,
                name: &item.file_name,
            });
            records.push(ExtractionRecord {
                original: item.entry.name.clone(),
                saved,
                name: item.file_name,
            });
        }

        let absolute = std::path::absolute(output_dir)?;
        on_progress(Progress::Finished {
            count: records.len(),
            output_dir: &absolute,
        });

        Ok(records)
    }
}

/// Create `output_dir` and its parents; succeeds if it already exists.
pub async fn create_output_dir(output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("Failed to create {}", output_dir.display()))
}

async fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    let mut file = fs::File::create(path)
        .await
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(data)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    file.flush().await?;
    Ok(())
}

/// Extract the images of the container at `container_path` into
/// `output_dir`.
///
/// The output directory is created before the container is opened, so it
/// exists even when the container turns out to be unreadable. The
/// container is closed before this returns.
pub async fn extract(container_path: &Path, output_dir: &Path) -> Result<Vec<ExtractionRecord>> {
    create_output_dir(output_dir).await?;
    MediaExtractor::open(container_path)
        .await?
        .extract(output_dir)
        .await
}
