use std::future::Future;

use crate::{
    chunker::Chunk,
    error::SummarizationError,
    llm::{GenerateOptions, InferenceTransport},
};

pub const CHUNK_PLACEHOLDER: &str = "{chunk}";
pub const SUMMARIES_PLACEHOLDER: &str = "{bullet_summaries}";

pub const DEFAULT_CHUNK_PROMPT: &str = "You are a helpful assistant that summarizes video transcript content. Please provide a clear, concise summary of the key points discussed in this transcript chunk:

{chunk}

Focus on the main topics, important information, and key takeaways.";

pub const DEFAULT_EXECUTIVE_PROMPT: &str = "Please create a comprehensive executive summary by combining these individual section summaries into a cohesive overview:

{bullet_summaries}

Provide a clear, well-structured summary that captures the overall content and main themes.";

/// Turns a fully rendered prompt into generated text
pub trait Summarizer {
    fn summarize(
        &self,
        model: &str,
        prompt: &str,
    ) -> impl Future<Output = Result<String, SummarizationError>> + Send;
}

impl<T: Summarizer + Send + Sync> Summarizer for &T {
    async fn summarize(&self, model: &str, prompt: &str) -> Result<String, SummarizationError> {
        (**self).summarize(model, prompt).await
    }
}

/// Tries each transport in order until one succeeds
pub struct TieredSummarizer {
    transports: Vec<Box<dyn InferenceTransport>>,
    options: GenerateOptions,
}

impl TieredSummarizer {
    pub fn new(options: GenerateOptions) -> Self {
        Self {
            transports: Vec::new(),
            options,
        }
    }

    pub fn with_transport(mut self, transport: impl InferenceTransport + 'static) -> Self {
        self.transports.push(Box::new(transport));
        self
    }
}

impl Summarizer for TieredSummarizer {
    #[tracing::instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    async fn summarize(&self, model: &str, prompt: &str) -> Result<String, SummarizationError> {
        let mut last_error = None;

        for transport in &self.transports {
            if let Some(e) = &last_error {
                tracing::warn!(
                    error = %e,
                    transport = transport.name(),
                    "Inference transport failed, falling back"
                );
            }

            match transport.generate(model, prompt, &self.options).await {
                Ok(text) => return Ok(text.trim().to_string()),
                Err(e) => last_error = Some(e),
            }
        }

        match last_error {
            Some(source) => {
                tracing::error!(error = ?source, "All inference transports failed");
                Err(SummarizationError::AllTransportsFailed { source })
            }
            None => Err(SummarizationError::NoTransports),
        }
    }
}

/// Chunk-level and reduce-level templates used together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    /// Contains `{chunk}`
    pub chunk: String,
    /// Contains `{bullet_summaries}`
    pub reduce: String,
}

impl Default for PromptPair {
    fn default() -> Self {
        Self {
            chunk: DEFAULT_CHUNK_PROMPT.into(),
            reduce: DEFAULT_EXECUTIVE_PROMPT.into(),
        }
    }
}

impl PromptPair {
    pub fn new(chunk: impl Into<String>, reduce: impl Into<String>) -> Self {
        Self {
            chunk: chunk.into(),
            reduce: reduce.into(),
        }
    }

    /// Prefixes both templates with `RESEARCH CONTEXT: <context>`; blank context is ignored
    pub fn with_context(self, context: &str) -> Self {
        if context.trim().is_empty() {
            return self;
        }
        Self {
            chunk: format!("RESEARCH CONTEXT: {context}\n\n{}", self.chunk),
            reduce: format!("RESEARCH CONTEXT: {context}\n\n{}", self.reduce),
        }
    }

    pub fn render_chunk(&self, chunk: &str) -> String {
        self.chunk.replace(CHUNK_PLACEHOLDER, chunk)
    }

    pub fn render_reduce(&self, summaries: &[String]) -> String {
        self.reduce
            .replace(SUMMARIES_PLACEHOLDER, &summaries.join("\n\n"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapReduceOutput {
    pub executive: String,
    /// One summary per chunk, in chunk order
    pub sections: Vec<String>,
}

/// Summarizes every chunk in order, then the collected summaries as a whole
#[tracing::instrument(skip_all, fields(model = %model, chunks = chunks.len()))]
pub async fn map_reduce<S: Summarizer>(
    summarizer: &S,
    model: &str,
    prompts: &PromptPair,
    chunks: &[Chunk],
) -> Result<MapReduceOutput, SummarizationError> {
    let mut sections = Vec::with_capacity(chunks.len());

    for chunk in chunks {
        tracing::info!(part = chunk.ordinal + 1, of = chunks.len(), "Summarizing chunk");
        let summary = summarizer
            .summarize(model, &prompts.render_chunk(&chunk.text))
            .await
            .inspect_err(|e| tracing::error!(error = %e, ordinal = chunk.ordinal, "Failed to summarize chunk"))?;
        sections.push(summary);
    }

    tracing::info!("Generating executive summary");
    let executive = summarizer
        .summarize(model, &prompts.render_reduce(&sections))
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Failed to generate executive summary"))?;

    Ok(MapReduceOutput {
        executive,
        sections,
    })
}
