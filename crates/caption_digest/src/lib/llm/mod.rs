pub mod ollama;
pub mod summarizer;

use serde::Serialize;

/// Sampling options forwarded to the inference service
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerateOptions {
    pub temperature: f64,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self { temperature: 0.7 }
    }
}

/// One way of reaching the inference service
#[async_trait::async_trait]
pub trait InferenceTransport: Send + Sync {
    /// Short label used in logs
    fn name(&self) -> &str;

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> anyhow::Result<String>;
}
