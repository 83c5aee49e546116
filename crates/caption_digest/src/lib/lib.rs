pub mod chunker;
pub mod config;
mod error;
pub mod format;
pub mod llm;
pub mod parser;
mod processor;
pub mod research;
pub mod tracing;
pub mod yt;

pub use config::Settings;
pub use error::{
    CaptionError, CorpusError, Error, PlanError, PlanValidationError, PromptKind, ReferenceError,
    SummarizationError, TranscriptError,
};
pub use llm::{
    ollama::{OllamaClient, OllamaError, RawHttpTransport},
    summarizer::{map_reduce, MapReduceOutput, PromptPair, Summarizer, TieredSummarizer},
    GenerateOptions, InferenceTransport,
};
pub use parser::VideoId;
pub use processor::{
    builder::VideoProcessorBuilder, BatchReport, OutputNaming, ProcessingResult, ProcessingStats,
    VideoProcessor,
};
