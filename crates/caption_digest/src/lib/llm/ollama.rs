use std::time::Duration;

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::{Deserialize, Serialize};

use crate::llm::{GenerateOptions, InferenceTransport};

#[derive(Debug, thiserror::Error)]
pub enum OllamaError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Response is missing the generated text")]
    MissingResponse,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: &'a GenerateOptions,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// Typed Ollama client; transient HTTP failures are retried by middleware
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: ClientWithMiddleware,
    base_url: String,
}

impl OllamaClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, OllamaError> {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        let client = ClientBuilder::new(reqwest::Client::builder().timeout(timeout).build()?)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn send_generate_request(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> Result<GenerateResponse, OllamaError> {
        let body = serde_json::to_vec(&GenerateRequest {
            model,
            prompt,
            stream: false,
            options,
        })?;

        let resp = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(OllamaError::Api { status, message });
        }

        Ok(resp.json::<GenerateResponse>().await?)
    }

    /// Names of the models the server has pulled
    pub async fn list_models(&self) -> Result<Vec<String>, OllamaError> {
        let resp = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(OllamaError::Api { status, message });
        }

        let tags = resp.json::<TagsResponse>().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait::async_trait]
impl InferenceTransport for OllamaClient {
    fn name(&self) -> &str {
        "ollama-client"
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> anyhow::Result<String> {
        let response = self.send_generate_request(model, prompt, options).await?;
        Ok(response.response)
    }
}

/// Untyped `POST /api/generate` over a plain client, used as the fallback
#[derive(Debug, Clone)]
pub struct RawHttpTransport {
    client: reqwest::Client,
    url: String,
}

impl RawHttpTransport {
    pub fn new(generate_url: impl Into<String>, timeout: Duration) -> Result<Self, OllamaError> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            url: generate_url.into(),
        })
    }
}

#[async_trait::async_trait]
impl InferenceTransport for RawHttpTransport {
    fn name(&self) -> &str {
        "raw-http"
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> anyhow::Result<String> {
        let payload = serde_json::json!({
            "model": model,
            "prompt": prompt,
            "stream": false,
            "options": { "temperature": options.temperature },
        });

        let resp = self.client.post(&self.url).json(&payload).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(OllamaError::Api { status, message }.into());
        }

        let json = resp.json::<serde_json::Value>().await?;
        json["response"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| OllamaError::MissingResponse.into())
    }
}
