use std::{fmt, path::PathBuf};

/// A reference string that is neither a recognised video URL nor a bare id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("Video reference is empty")]
    Empty,
    #[error("Could not extract a video id from {0:?}")]
    Unrecognized(String),
}

/// Raised by a caption source.
///
/// `Malformed` is the transient case and is retried by the fetcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptionError {
    #[error("No captions available")]
    NoCaptions,
    #[error("Malformed caption response: {0}")]
    Malformed(String),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranscriptError {
    #[error("No transcript available for {video_id}")]
    NoTranscriptAvailable { video_id: String },
    #[error("Failed to fetch transcript for {video_id}: {reason}")]
    FetchFailed { video_id: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum SummarizationError {
    #[error("All inference transports failed: {source}")]
    AllTransportsFailed {
        #[source]
        source: anyhow::Error,
    },
    #[error("No inference transports configured")]
    NoTransports,
}

/// Which of the four prompt templates a validation rule refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Chunk,
    Executive,
    CorpusChunk,
    CorpusExecutive,
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PromptKind::Chunk => "chunk_prompt",
            PromptKind::Executive => "executive_prompt",
            PromptKind::CorpusChunk => "corpus_chunk_prompt",
            PromptKind::CorpusExecutive => "corpus_executive_prompt",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanValidationError {
    #[error("Research plan name cannot be empty")]
    EmptyName,
    #[error("Research plan ID cannot be empty")]
    EmptyPlanId,
    #[error("Must specify either video URLs or video list file")]
    NoVideoSource,
    #[error("{0} cannot be empty")]
    EmptyPrompt(PromptKind),
    #[error("{prompt} must contain {placeholder} placeholder")]
    MissingPlaceholder {
        prompt: PromptKind,
        placeholder: &'static str,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("Research plan not found: {0}")]
    NotFound(String),
    #[error("Research plan already exists: {0}")]
    AlreadyExists(String),
    #[error("Invalid research plan id: {0:?}")]
    InvalidPlanId(String),
    #[error("Invalid research plan {plan_id}: {source}")]
    Invalid {
        plan_id: String,
        #[source]
        source: PlanValidationError,
    },
    #[error("Failed to parse research plan {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Video list file not found: {0}")]
    VideoListNotFound(PathBuf),
    #[error("No video entries found in {0}")]
    EmptyVideoList(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("No video summary files found for aggregation")]
    NoSourceDocuments,
    #[error("Corpus file not found: {path}. Run aggregation first.")]
    CorpusNotFound { path: PathBuf },
    #[error(transparent)]
    Summarization(#[from] SummarizationError),
    #[error("Persistence error: {0:#}")]
    Persistence(#[source] anyhow::Error),
}

/// Everything that can end the processing of a single video
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    #[error(transparent)]
    Transcript(#[from] TranscriptError),
    #[error(transparent)]
    Summarization(#[from] SummarizationError),
    #[error("Persistence error: {0:#}")]
    Persistence(#[source] anyhow::Error),
}

impl Error {
    pub fn is_no_transcript(&self) -> bool {
        matches!(
            self,
            Error::Transcript(TranscriptError::NoTranscriptAvailable { .. })
        )
    }
}
