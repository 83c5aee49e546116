use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Context;
use tokio::{fs, io::AsyncWriteExt};

use crate::{
    store::{AuditLog, DocumentSink, TranscriptCache},
    AuditRecord, CacheStats,
};

const CACHE_EXTENSION: &str = "txt";

/// Transcript cache stored as `<dir>/<video_id>.txt`
#[derive(Debug, Clone)]
pub struct FsTranscriptCache {
    dir: PathBuf,
}

impl FsTranscriptCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, video_id: &str) -> PathBuf {
        self.dir.join(format!("{video_id}.{CACHE_EXTENSION}"))
    }

    async fn entries(&self) -> anyhow::Result<Vec<PathBuf>> {
        let mut read_dir = match fs::read_dir(&self.dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to list {}", self.dir.display()))
            }
        };

        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == CACHE_EXTENSION) {
                entries.push(path);
            }
        }
        Ok(entries)
    }
}

impl TranscriptCache for FsTranscriptCache {
    #[tracing::instrument(skip(self))]
    async fn get(&self, video_id: &str) -> anyhow::Result<Option<String>> {
        let path = self.entry_path(video_id);

        let text = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                tracing::warn!(error = ?e, path = ?path, "Failed to read cache entry");
                return Ok(None);
            }
        };

        if text.trim().is_empty() {
            tracing::warn!(path = ?path, "Cache entry is empty, discarding it");
            if let Err(e) = fs::remove_file(&path).await {
                tracing::warn!(error = ?e, path = ?path, "Failed to remove empty cache entry");
            }
            return Ok(None);
        }

        tracing::debug!("Loaded transcript from cache");
        Ok(Some(text))
    }

    #[tracing::instrument(skip(self, text), fields(len = text.len()))]
    async fn put(&self, video_id: &str, text: &str) -> anyhow::Result<()> {
        if text.trim().is_empty() {
            tracing::warn!("Refusing to cache empty transcript");
            return Ok(());
        }

        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create cache dir {}", self.dir.display()))?;

        let path = self.entry_path(video_id);
        fs::write(&path, text)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, path = ?path, "Failed to write cache entry"))
            .with_context(|| format!("Failed to write cache entry {}", path.display()))?;

        Ok(())
    }

    async fn stats(&self) -> anyhow::Result<CacheStats> {
        let mut stats = CacheStats::default();
        for path in self.entries().await? {
            let metadata = fs::metadata(&path).await?;
            stats.entry_count += 1;
            stats.total_bytes += metadata.len();
        }
        Ok(stats)
    }

    async fn clear(&self) -> anyhow::Result<usize> {
        let mut removed = 0;
        for path in self.entries().await? {
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(error = ?e, path = ?path, "Failed to remove cache entry"),
            }
        }
        tracing::info!(removed, "Cleared transcript cache");
        Ok(removed)
    }
}

/// Newline-delimited JSON audit log
#[derive(Debug, Clone)]
pub struct JsonlAuditLog {
    path: PathBuf,
}

impl JsonlAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditLog for JsonlAuditLog {
    async fn append(&self, record: &AuditRecord) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create log dir {}", parent.display()))?;
        }

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, path = ?self.path, "Failed to open audit log"))
            .with_context(|| format!("Failed to open audit log {}", self.path.display()))?;

        file.write_all(line.as_bytes())
            .await
            .context("Failed to append audit record")?;
        file.flush().await?;

        Ok(())
    }
}

/// Documents stored as files in a single directory
#[derive(Debug, Clone)]
pub struct FsDocumentSink {
    dir: PathBuf,
}

impl FsDocumentSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DocumentSink for FsDocumentSink {
    async fn exists(&self, name: &str) -> anyhow::Result<bool> {
        Ok(fs::try_exists(self.location(name)).await?)
    }

    #[tracing::instrument(skip(self, content), fields(dir = ?self.dir))]
    async fn write(&self, name: &str, content: &str) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create output dir {}", self.dir.display()))?;

        let path = self.location(name);
        fs::write(&path, content)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, path = ?path, "Failed to write document"))
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(path)
    }

    async fn read(&self, name: &str) -> anyhow::Result<String> {
        let path = self.location(name);
        fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))
    }

    async fn list(&self, extension: &str) -> anyhow::Result<Vec<String>> {
        let mut read_dir = match fs::read_dir(&self.dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to list {}", self.dir.display()))
            }
        };

        let mut names = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            if !path.is_file() || !path.extension().is_some_and(|ext| ext == extension) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn location(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}
