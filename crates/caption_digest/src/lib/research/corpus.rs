use std::path::PathBuf;

use caption_store::{DocumentSink, FsDocumentSink};
use chrono::Utc;
use itertools::Itertools;

use crate::{
    chunker::chunk_text,
    config::Settings,
    error::CorpusError,
    format::{
        count_video_sections, join_corpus_sections, render_analysis_markdown,
        render_corpus_markdown, render_corpus_section, AnalysisDocument, CorpusDocument,
    },
    llm::summarizer::{map_reduce, Summarizer},
    parser::strip_frontmatter,
    research::plan::ResearchPlanConfig,
};

const SUMMARY_EXTENSION: &str = "md";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusOutcome {
    pub corpus_path: PathBuf,
    /// Set once the corpus has been analyzed
    pub summary_path: Option<PathBuf>,
    pub video_count: usize,
}

/// Aggregates a plan's per-video summaries into a corpus and analyzes it
pub struct CorpusManager<S, D = FsDocumentSink> {
    plan: ResearchPlanConfig,
    summarizer: S,
    video_sink: D,
    corpus_sink: D,
    default_model: String,
    chunk_size: usize,
}

impl<S: Summarizer + Send + Sync> CorpusManager<S, FsDocumentSink> {
    /// Reads from and writes to the directories named by the plan
    pub fn new(plan: ResearchPlanConfig, summarizer: S, settings: &Settings) -> Self {
        let video_sink = FsDocumentSink::new(plan.video_output_dir());
        let corpus_sink = FsDocumentSink::new(plan.corpus_output_dir());
        Self::with_sinks(
            plan,
            summarizer,
            video_sink,
            corpus_sink,
            &settings.model,
            settings.chunk_size,
        )
    }
}

impl<S, D> CorpusManager<S, D>
where
    S: Summarizer + Send + Sync,
    D: DocumentSink + Send + Sync,
{
    pub fn with_sinks(
        plan: ResearchPlanConfig,
        summarizer: S,
        video_sink: D,
        corpus_sink: D,
        default_model: &str,
        chunk_size: usize,
    ) -> Self {
        Self {
            plan,
            summarizer,
            video_sink,
            corpus_sink,
            default_model: default_model.to_string(),
            chunk_size,
        }
    }

    pub fn plan(&self) -> &ResearchPlanConfig {
        &self.plan
    }

    /// Combines the plan's per-video summaries into one corpus document.
    ///
    /// With `video_ids`, only summaries whose filename contains one of the ids
    /// are included.
    #[tracing::instrument(skip_all, fields(plan_id = %self.plan.plan_id))]
    pub async fn aggregate_video_summaries(
        &self,
        video_ids: Option<&[String]>,
    ) -> Result<CorpusOutcome, CorpusError> {
        let candidates = self
            .video_sink
            .list(SUMMARY_EXTENSION)
            .await
            .map_err(CorpusError::Persistence)?;

        let selected = match video_ids {
            None => candidates,
            Some(ids) => candidates
                .into_iter()
                .filter(|name| ids.iter().any(|id| name.contains(id.as_str())))
                .sorted()
                .dedup()
                .collect(),
        };

        let mut sections = Vec::with_capacity(selected.len());
        let mut included = Vec::with_capacity(selected.len());
        for name in selected {
            let content = match self.video_sink.read(&name).await {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(error = %e, file = %name, "Skipping unreadable video summary");
                    continue;
                }
            };
            let stem = name
                .strip_suffix(&format!(".{SUMMARY_EXTENSION}"))
                .unwrap_or(&name);
            sections.push(render_corpus_section(stem, strip_frontmatter(&content)));
            included.push(name);
        }

        if included.is_empty() {
            tracing::warn!("No video summaries to aggregate");
            return Err(CorpusError::NoSourceDocuments);
        }

        tracing::info!(videos = included.len(), "Aggregating video summaries into corpus");

        let body = join_corpus_sections(&sections);
        let markdown = render_corpus_markdown(&CorpusDocument {
            plan_name: &self.plan.name,
            plan_id: &self.plan.plan_id,
            description: &self.plan.description,
            created_at: Utc::now(),
            video_files: &included,
            body: &body,
        });

        let corpus_path = self
            .corpus_sink
            .write(&self.plan.corpus_filename(), &markdown)
            .await
            .map_err(CorpusError::Persistence)?;

        tracing::info!(path = ?corpus_path, "Corpus created");
        Ok(CorpusOutcome {
            corpus_path,
            summary_path: None,
            video_count: included.len(),
        })
    }

    /// Runs map-reduce over the aggregated corpus with the plan's corpus prompts
    #[tracing::instrument(skip_all, fields(plan_id = %self.plan.plan_id))]
    pub async fn analyze_corpus(&self, model: Option<&str>) -> Result<CorpusOutcome, CorpusError> {
        let model = model.unwrap_or(&self.default_model);
        let corpus_name = self.plan.corpus_filename();

        let exists = self
            .corpus_sink
            .exists(&corpus_name)
            .await
            .map_err(CorpusError::Persistence)?;
        if !exists {
            return Err(CorpusError::CorpusNotFound {
                path: self.corpus_sink.location(&corpus_name),
            });
        }

        let corpus = self
            .corpus_sink
            .read(&corpus_name)
            .await
            .map_err(CorpusError::Persistence)?;
        let body = strip_frontmatter(&corpus).trim();

        let chunks = chunk_text(body, self.chunk_size);
        tracing::info!(chunks = chunks.len(), "Split corpus for analysis");

        let output = map_reduce(&self.summarizer, model, &self.plan.corpus_prompts(), &chunks)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Corpus analysis failed"))?;

        let markdown = render_analysis_markdown(&AnalysisDocument {
            plan_name: &self.plan.name,
            plan_id: &self.plan.plan_id,
            model,
            created_at: Utc::now(),
            executive: &output.executive,
            sections: &output.sections,
        });

        let summary_path = self
            .corpus_sink
            .write(&self.plan.corpus_summary_filename(), &markdown)
            .await
            .map_err(CorpusError::Persistence)?;

        tracing::info!(path = ?summary_path, "Corpus analysis completed");
        Ok(CorpusOutcome {
            corpus_path: self.corpus_sink.location(&corpus_name),
            summary_path: Some(summary_path),
            video_count: count_video_sections(&corpus),
        })
    }

    /// Aggregation followed by analysis; stops at the first failing stage
    pub async fn full_corpus_pipeline(
        &self,
        video_ids: Option<&[String]>,
        model: Option<&str>,
    ) -> Result<CorpusOutcome, CorpusError> {
        let aggregated = self.aggregate_video_summaries(video_ids).await?;
        let analyzed = self.analyze_corpus(model).await?;

        Ok(CorpusOutcome {
            corpus_path: aggregated.corpus_path,
            summary_path: analyzed.summary_path,
            video_count: aggregated.video_count,
        })
    }
}
