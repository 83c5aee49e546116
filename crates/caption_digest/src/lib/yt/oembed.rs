use std::time::Duration;

use serde::Deserialize;

use crate::{parser::VideoId, yt::TitleLookup};

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
}

/// Title lookup through YouTube's oEmbed endpoint
#[derive(Debug, Clone)]
pub struct OEmbedTitleLookup {
    http_client: reqwest::Client,
    endpoint: String,
}

impl OEmbedTitleLookup {
    const OEMBED_URL: &str = "https://www.youtube.com/oembed";

    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            endpoint: Self::OEMBED_URL.into(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn fetch_title(&self, video_id: &VideoId) -> anyhow::Result<Option<String>> {
        let resp = self
            .http_client
            .get(&self.endpoint)
            .query(&[("url", video_id.short_url().as_str()), ("format", "json")])
            .send()
            .await?
            .error_for_status()?;

        Ok(resp.json::<OEmbedResponse>().await?.title)
    }
}

impl TitleLookup for OEmbedTitleLookup {
    #[tracing::instrument(skip(self), fields(video_id = %video_id))]
    async fn lookup_title(&self, video_id: &VideoId) -> String {
        match self.fetch_title(video_id).await {
            Ok(Some(title)) if !title.trim().is_empty() => title,
            Ok(_) => video_id.to_string(),
            Err(e) => {
                tracing::warn!(error = ?e, "Failed to fetch title, using video id");
                video_id.to_string()
            }
        }
    }
}
