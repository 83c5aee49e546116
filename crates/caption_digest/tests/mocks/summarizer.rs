use std::sync::{Arc, Mutex};

use caption_digest::{SummarizationError, Summarizer};

#[derive(Clone)]
pub struct MockSummarizer {
    pub summary: String,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
}

impl MockSummarizer {
    pub fn new(summary: &str) -> Self {
        Self {
            summary: summary.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            summary: String::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(msg.to_string()),
        }
    }
}

impl Summarizer for MockSummarizer {
    async fn summarize(&self, _model: &str, prompt: &str) -> Result<String, SummarizationError> {
        self.calls.lock().unwrap().push(prompt.to_string());
        if let Some(ref msg) = self.fail_with {
            return Err(SummarizationError::AllTransportsFailed {
                source: anyhow::anyhow!("{}", msg),
            });
        }
        Ok(self.summary.clone())
    }
}
