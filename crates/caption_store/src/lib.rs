//! # Caption Store
//!
//! Storage abstractions backing the caption digest pipeline:
//!
//! * a keyed transcript cache (raw caption text per video id),
//! * an append-only audit log of processed videos,
//! * a document sink for generated markdown, with filename versioning.
//!
//! Each concern is a narrow trait with a filesystem backing used in production
//! and an in-memory backing used by tests.

mod domain;
mod store;
mod versioning;

pub use domain::{AuditRecord, AuditStatus, CacheStats};
pub use store::fs::{FsDocumentSink, FsTranscriptCache, JsonlAuditLog};
pub use store::memory::{MemoryAuditLog, MemoryDocumentSink, MemoryTranscriptCache};
pub use store::{AuditLog, DocumentSink, TranscriptCache};
pub use versioning::{next_available_version, versioned_stem};
