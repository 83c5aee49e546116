use std::{future::Future, path::PathBuf};

use crate::{AuditRecord, CacheStats};

pub mod fs;
pub mod memory;

/// Raw transcript text keyed by video id.
///
/// Implementations never hold blank text: `put` ignores blank input and `get`
/// treats a blank entry as a miss, removing it.
pub trait TranscriptCache {
    fn get(&self, video_id: &str) -> impl Future<Output = anyhow::Result<Option<String>>> + Send;

    fn put(&self, video_id: &str, text: &str) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn stats(&self) -> impl Future<Output = anyhow::Result<CacheStats>> + Send;

    /// Removes every entry, returning how many were removed
    fn clear(&self) -> impl Future<Output = anyhow::Result<usize>> + Send;
}

impl<T: TranscriptCache + Send + Sync> TranscriptCache for &T {
    async fn get(&self, video_id: &str) -> anyhow::Result<Option<String>> {
        (**self).get(video_id).await
    }

    async fn put(&self, video_id: &str, text: &str) -> anyhow::Result<()> {
        (**self).put(video_id, text).await
    }

    async fn stats(&self) -> anyhow::Result<CacheStats> {
        (**self).stats().await
    }

    async fn clear(&self) -> anyhow::Result<usize> {
        (**self).clear().await
    }
}

/// Append-only sink for [`AuditRecord`]s.
pub trait AuditLog {
    fn append(&self, record: &AuditRecord) -> impl Future<Output = anyhow::Result<()>> + Send;
}

impl<T: AuditLog + Send + Sync> AuditLog for &T {
    async fn append(&self, record: &AuditRecord) -> anyhow::Result<()> {
        (**self).append(record).await
    }
}

/// A flat namespace of named text documents.
pub trait DocumentSink {
    fn exists(&self, name: &str) -> impl Future<Output = anyhow::Result<bool>> + Send;

    /// Writes (or overwrites) `name`, returning where it now lives
    fn write(&self, name: &str, content: &str)
        -> impl Future<Output = anyhow::Result<PathBuf>> + Send;

    fn read(&self, name: &str) -> impl Future<Output = anyhow::Result<String>> + Send;

    /// Names of all documents with the given extension, sorted
    fn list(&self, extension: &str) -> impl Future<Output = anyhow::Result<Vec<String>>> + Send;

    /// Where `name` would be stored
    fn location(&self, name: &str) -> PathBuf;
}

impl<T: DocumentSink + Send + Sync> DocumentSink for &T {
    async fn exists(&self, name: &str) -> anyhow::Result<bool> {
        (**self).exists(name).await
    }

    async fn write(&self, name: &str, content: &str) -> anyhow::Result<PathBuf> {
        (**self).write(name, content).await
    }

    async fn read(&self, name: &str) -> anyhow::Result<String> {
        (**self).read(name).await
    }

    async fn list(&self, extension: &str) -> anyhow::Result<Vec<String>> {
        (**self).list(extension).await
    }

    fn location(&self, name: &str) -> PathBuf {
        (**self).location(name)
    }
}
