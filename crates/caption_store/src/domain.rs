use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Outcome recorded for a processed video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Success,
    NoTranscript,
    Error,
}

/// One line of the ingest audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Seconds since the unix epoch
    pub timestamp: f64,
    pub iso_timestamp: String,
    pub video_id: String,
    pub title: String,
    pub slug: String,
    pub model: String,
    pub chunk_count: usize,
    pub status: AuditStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditRecord {
    pub fn new(
        video_id: impl Into<String>,
        title: impl Into<String>,
        slug: impl Into<String>,
        model: impl Into<String>,
        chunk_count: usize,
        status: AuditStatus,
    ) -> Self {
        Self::at(Utc::now(), video_id, title, slug, model, chunk_count, status)
    }

    pub fn at(
        now: DateTime<Utc>,
        video_id: impl Into<String>,
        title: impl Into<String>,
        slug: impl Into<String>,
        model: impl Into<String>,
        chunk_count: usize,
        status: AuditStatus,
    ) -> Self {
        AuditRecord {
            timestamp: now.timestamp_millis() as f64 / 1000.0,
            iso_timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            video_id: video_id.into(),
            title: title.into(),
            slug: slug.into(),
            model: model.into(),
            chunk_count,
            status,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entry_count: usize,
    pub total_bytes: u64,
}
