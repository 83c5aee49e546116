use std::{path::PathBuf, time::Duration};

use anyhow::Context;

/// Runtime settings shared by every pipeline stage.
#[derive(Debug, Clone)]
pub struct Settings {
    pub ollama_url: String,
    pub model: String,
    /// Token budget per chunk
    pub chunk_size: usize,
    /// Minimum spacing between caption source calls
    pub rate_limit_delay: Duration,
    pub data_dir: PathBuf,
    /// Transcript cache directory
    pub raw_dir: PathBuf,
    /// Per-video summaries outside of a research plan
    pub docs_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub audit_log: PathBuf,
    pub default_video_list: PathBuf,
    pub plans_dir: PathBuf,
    pub inference_timeout: Duration,
    pub youtube_timeout: Duration,
    pub retry_base_delay: Duration,
    pub max_fetch_retries: u32,
    pub temperature: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_dirs("data", "docs", "logs")
    }
}

impl Settings {
    pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
    pub const DEFAULT_MODEL: &str = "llama3.2:latest";
    pub const DEFAULT_CHUNK_SIZE: usize = 2048;

    /// Default settings with the raw cache and audit log derived from the given directories
    pub fn from_dirs(
        data_dir: impl Into<PathBuf>,
        docs_dir: impl Into<PathBuf>,
        logs_dir: impl Into<PathBuf>,
    ) -> Self {
        let data_dir = data_dir.into();
        let logs_dir = logs_dir.into();

        Settings {
            ollama_url: Self::DEFAULT_OLLAMA_URL.into(),
            model: Self::DEFAULT_MODEL.into(),
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
            rate_limit_delay: Duration::from_secs(2),
            raw_dir: data_dir.join("raw"),
            data_dir,
            docs_dir: docs_dir.into(),
            audit_log: logs_dir.join("ingest.jsonl"),
            logs_dir,
            default_video_list: PathBuf::from("videos.txt"),
            plans_dir: PathBuf::from("research_plans"),
            inference_timeout: Duration::from_secs(300),
            youtube_timeout: Duration::from_secs(30),
            retry_base_delay: Duration::from_secs(2),
            max_fetch_retries: 2,
            temperature: 0.7,
        }
    }

    /// `{ollama_url}/api/{endpoint}`
    pub fn ollama_api_url(&self, endpoint: &str) -> String {
        format!("{}/api/{endpoint}", self.ollama_url.trim_end_matches('/'))
    }

    pub fn create_directories(&self) -> anyhow::Result<()> {
        for dir in [&self.raw_dir, &self.docs_dir, &self.logs_dir] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}
