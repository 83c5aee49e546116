pub mod builder;

use std::{collections::HashSet, path::PathBuf};

use caption_store::{
    next_available_version, versioned_stem, AuditLog, AuditRecord, AuditStatus, DocumentSink,
    TranscriptCache,
};
use chrono::Utc;

use crate::{
    chunker::chunk_text,
    error::Error,
    format::{render_video_markdown, VideoDocument},
    llm::summarizer::{map_reduce, PromptPair, Summarizer},
    parser::{slugify, VideoId},
    yt::{fetcher::TranscriptFetcher, CaptionSource, TitleLookup},
};

const OUTPUT_EXTENSION: &str = "md";
const UNKNOWN_TITLE: &str = "Unknown";
const UNKNOWN_SLUG: &str = "unknown";

/// How per-video output files are named
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputNaming {
    /// `<slug>.md`
    Slug,
    /// A pattern such as `{title}_{video_id}.md`, where `{title}` is the slug
    Pattern(String),
}

impl OutputNaming {
    /// Filename stem for a video, before any version suffix
    fn stem(&self, title: &str, video_id: &VideoId) -> String {
        let slug = slugify(title);
        match self {
            OutputNaming::Slug => slug,
            OutputNaming::Pattern(pattern) => {
                let name = pattern
                    .replace("{title}", &slug)
                    .replace("{video_id}", video_id.as_str());
                name.strip_suffix(&format!(".{OUTPUT_EXTENSION}"))
                    .map(str::to_string)
                    .unwrap_or(name)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingResult {
    /// The resolved id, or the first 11 characters of an unresolvable reference
    pub video_id: String,
    pub title: String,
    pub slug: String,
    pub success: bool,
    pub chunk_count: usize,
    pub error: Option<String>,
    pub output_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessingStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Repeats of an id already seen in the same batch
    pub skipped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub stats: ProcessingStats,
    /// One entry per processed reference, in input order
    pub results: Vec<ProcessingResult>,
}

impl BatchReport {
    pub fn successful(&self) -> impl Iterator<Item = &ProcessingResult> {
        self.results.iter().filter(|r| r.success)
    }

    /// `<id>: <cause>` for every failed video
    pub fn failure_lines(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| !r.success)
            .map(|r| format!("{}: {}", r.video_id, r.error.as_deref().unwrap_or("unknown error")))
            .collect()
    }
}

/// Turns video references into markdown summaries, one video at a time
pub struct VideoProcessor<C, Y, L, S, D, A> {
    fetcher: TranscriptFetcher<C, Y, L>,
    summarizer: S,
    sink: D,
    audit_log: A,
    model: String,
    chunk_size: usize,
    prompts: PromptPair,
    naming: OutputNaming,
    auto_overwrite: bool,
}

impl<C, Y, L, S, D, A> VideoProcessor<C, Y, L, S, D, A>
where
    C: TranscriptCache + Send + Sync,
    Y: CaptionSource + Send + Sync,
    L: TitleLookup + Send + Sync,
    S: Summarizer + Send + Sync,
    D: DocumentSink + Send + Sync,
    A: AuditLog + Send + Sync,
{
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn sink(&self) -> &D {
        &self.sink
    }

    /// Processes one reference. Failures are audited and reported in the result.
    #[tracing::instrument(skip(self))]
    pub async fn process_video(&self, reference: &str) -> ProcessingResult {
        match self.try_process_video(reference).await {
            Ok(result) => result,
            Err(e) => self.record_failure(reference, e).await,
        }
    }

    async fn try_process_video(&self, reference: &str) -> Result<ProcessingResult, Error> {
        let video_id = VideoId::parse(reference)?;
        tracing::info!(video_id = %video_id, "Processing video");

        let transcript = self.fetcher.fetch(&video_id).await?;

        let mut stem = self.naming.stem(&transcript.title, &video_id);
        if !self.auto_overwrite {
            let version = next_available_version(&self.sink, &stem, OUTPUT_EXTENSION)
                .await
                .map_err(Error::Persistence)?;
            if let Some(version) = version {
                stem = versioned_stem(&stem, version);
            }
        }

        let chunks = chunk_text(&transcript.text, self.chunk_size);
        tracing::info!(chunks = chunks.len(), "Split transcript");

        let output = map_reduce(&self.summarizer, &self.model, &self.prompts, &chunks).await?;

        let markdown = render_video_markdown(&VideoDocument {
            video_id: &video_id,
            title: &transcript.title,
            slug: &stem,
            model: &self.model,
            executive: &output.executive,
            sections: &output.sections,
            saved_at: Utc::now(),
        });
        let output_path = self
            .sink
            .write(&format!("{stem}.{OUTPUT_EXTENSION}"), &markdown)
            .await
            .map_err(Error::Persistence)?;

        let chunk_count = output.sections.len();
        self.append_audit(AuditRecord::new(
            video_id.as_str(),
            &transcript.title,
            &stem,
            &self.model,
            chunk_count,
            AuditStatus::Success,
        ))
        .await;

        tracing::info!(chunk_count, path = ?output_path, "Video summarized");
        Ok(ProcessingResult {
            video_id: video_id.to_string(),
            title: transcript.title,
            slug: stem,
            success: true,
            chunk_count,
            error: None,
            output_path: Some(output_path),
        })
    }

    async fn record_failure(&self, reference: &str, error: Error) -> ProcessingResult {
        let video_id = VideoId::parse(reference)
            .map(|id| id.to_string())
            .unwrap_or_else(|_| reference.chars().take(11).collect());

        let (status, message) = if error.is_no_transcript() {
            tracing::warn!(%video_id, "No transcript available");
            (
                AuditStatus::NoTranscript,
                format!("No transcript available for {reference}"),
            )
        } else {
            tracing::error!(%video_id, error = %error, "Video processing failed");
            (
                AuditStatus::Error,
                format!("Processing failed for {reference}: {error}"),
            )
        };

        self.append_audit(
            AuditRecord::new(&video_id, UNKNOWN_TITLE, UNKNOWN_SLUG, &self.model, 0, status)
                .with_error(error.to_string()),
        )
        .await;

        ProcessingResult {
            video_id,
            title: UNKNOWN_TITLE.to_string(),
            slug: UNKNOWN_SLUG.to_string(),
            success: false,
            chunk_count: 0,
            error: Some(message),
            output_path: None,
        }
    }

    async fn append_audit(&self, record: AuditRecord) {
        if let Err(e) = self.audit_log.append(&record).await {
            tracing::warn!(error = ?e, video_id = %record.video_id, "Failed to write audit record");
        }
    }

    /// Processes every reference in order. A failing video never stops the batch.
    #[tracing::instrument(skip_all, fields(count = references.len()))]
    pub async fn process_batch<R: AsRef<str>>(&self, references: &[R]) -> BatchReport {
        let mut report = BatchReport {
            stats: ProcessingStats {
                total: references.len(),
                ..Default::default()
            },
            results: Vec::with_capacity(references.len()),
        };
        let mut seen = HashSet::new();

        for (i, reference) in references.iter().enumerate() {
            let reference = reference.as_ref();
            if let Ok(video_id) = VideoId::parse(reference) {
                if !seen.insert(video_id.to_string()) {
                    tracing::info!(video_id = %video_id, "Skipping duplicate video");
                    report.stats.skipped += 1;
                    continue;
                }
            }

            tracing::info!(item = i + 1, of = references.len(), "Processing batch item");
            let result = self.process_video(reference).await;
            if result.success {
                report.stats.successful += 1;
            } else {
                report.stats.failed += 1;
            }
            report.results.push(result);
        }

        tracing::info!(
            successful = report.stats.successful,
            failed = report.stats.failed,
            skipped = report.stats.skipped,
            "Batch complete"
        );
        report
    }
}
