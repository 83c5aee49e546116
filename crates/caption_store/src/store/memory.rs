use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use itertools::Itertools;

use crate::{
    store::{AuditLog, DocumentSink, TranscriptCache},
    AuditRecord, CacheStats,
};

/// In-memory [`TranscriptCache`]; clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryTranscriptCache {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryTranscriptCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry without the blank-text guard, for seeding stale state
    pub fn insert_raw(&self, video_id: &str, text: &str) {
        self.lock().insert(video_id.to_string(), text.to_string());
    }

    pub fn contains(&self, video_id: &str) -> bool {
        self.lock().contains_key(video_id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TranscriptCache for MemoryTranscriptCache {
    async fn get(&self, video_id: &str) -> anyhow::Result<Option<String>> {
        let mut entries = self.lock();
        match entries.get(video_id) {
            Some(text) if text.trim().is_empty() => {
                entries.remove(video_id);
                Ok(None)
            }
            other => Ok(other.cloned()),
        }
    }

    async fn put(&self, video_id: &str, text: &str) -> anyhow::Result<()> {
        if !text.trim().is_empty() {
            self.lock().insert(video_id.to_string(), text.to_string());
        }
        Ok(())
    }

    async fn stats(&self) -> anyhow::Result<CacheStats> {
        let entries = self.lock();
        Ok(CacheStats {
            entry_count: entries.len(),
            total_bytes: entries.values().map(|t| t.len() as u64).sum(),
        })
    }

    async fn clear(&self) -> anyhow::Result<usize> {
        let mut entries = self.lock();
        let removed = entries.len();
        entries.clear();
        Ok(removed)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryAuditLog {
    records: Arc<Mutex<Vec<AuditRecord>>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl AuditLog for MemoryAuditLog {
    async fn append(&self, record: &AuditRecord) -> anyhow::Result<()> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record.clone());
        Ok(())
    }
}

/// In-memory [`DocumentSink`]. `location` resolves under a virtual root.
#[derive(Debug, Clone)]
pub struct MemoryDocumentSink {
    root: PathBuf,
    documents: Arc<Mutex<HashMap<String, String>>>,
}

impl Default for MemoryDocumentSink {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl MemoryDocumentSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            documents: Arc::default(),
        }
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.lock().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().sorted().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DocumentSink for MemoryDocumentSink {
    async fn exists(&self, name: &str) -> anyhow::Result<bool> {
        Ok(self.lock().contains_key(name))
    }

    async fn write(&self, name: &str, content: &str) -> anyhow::Result<PathBuf> {
        self.lock().insert(name.to_string(), content.to_string());
        Ok(self.location(name))
    }

    async fn read(&self, name: &str) -> anyhow::Result<String> {
        self.get(name)
            .ok_or_else(|| anyhow::anyhow!("Document not found: {name}"))
    }

    async fn list(&self, extension: &str) -> anyhow::Result<Vec<String>> {
        let suffix = format!(".{extension}");
        Ok(self
            .lock()
            .keys()
            .filter(|name| name.ends_with(&suffix))
            .cloned()
            .sorted()
            .collect())
    }

    fn location(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_cache_discards_blank_entries() {
        let cache = MemoryTranscriptCache::new();
        cache.insert_raw("aaaaaaaaaaa", "   ");

        assert_eq!(cache.get("aaaaaaaaaaa").await.unwrap(), None);
        assert!(!cache.contains("aaaaaaaaaaa"));

        cache.put("aaaaaaaaaaa", "").await.unwrap();
        assert!(!cache.contains("aaaaaaaaaaa"));
    }

    #[tokio::test]
    async fn test_memory_sink_clones_share_state() {
        let sink = MemoryDocumentSink::default();
        let other = sink.clone();

        sink.write("b.md", "b").await.unwrap();
        other.write("a.md", "a").await.unwrap();
        other.write("a.txt", "a").await.unwrap();

        assert_eq!(sink.list("md").await.unwrap(), vec!["a.md", "b.md"]);
        assert_eq!(sink.location("a.md"), PathBuf::from("memory/a.md"));
        assert!(sink.read("missing.md").await.is_err());
    }
}
