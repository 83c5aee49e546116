use std::{sync::Arc, time::Duration};

use caption_store::TranscriptCache;

use crate::{
    error::{CaptionError, TranscriptError},
    parser::VideoId,
    yt::{rate_limiter::RateLimiter, render_snippets, select_track, CaptionSource, TitleLookup},
};

/// A transcript ready for chunking. `text` is never blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptRecord {
    pub video_id: VideoId,
    pub title: String,
    pub text: String,
    /// Served from the transcript cache
    pub cached: bool,
}

/// Cache-first transcript retrieval with pacing and bounded retries
#[derive(Debug)]
pub struct TranscriptFetcher<C, S, L> {
    cache: C,
    source: S,
    titles: L,
    limiter: Arc<RateLimiter>,
    max_retries: u32,
    base_delay: Duration,
    use_cache: bool,
}

impl<C, S, L> TranscriptFetcher<C, S, L>
where
    C: TranscriptCache + Send + Sync,
    S: CaptionSource + Send + Sync,
    L: TitleLookup + Send + Sync,
{
    pub fn new(cache: C, source: S, titles: L, limiter: Arc<RateLimiter>) -> Self {
        Self {
            cache,
            source,
            titles,
            limiter,
            max_retries: 2,
            base_delay: Duration::from_secs(2),
            use_cache: true,
        }
    }

    /// Transient failures are retried `max_retries` times, waiting `attempt * base_delay`
    pub fn with_retry_policy(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    /// When disabled the cache is neither read nor written
    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    #[tracing::instrument(skip(self), fields(video_id = %video_id))]
    pub async fn fetch(&self, video_id: &VideoId) -> Result<TranscriptRecord, TranscriptError> {
        if self.use_cache {
            match self.cache.get(video_id.as_str()).await {
                Ok(Some(text)) => {
                    let title = self.titles.lookup_title(video_id).await;
                    tracing::info!("Using cached transcript");
                    return Ok(TranscriptRecord {
                        video_id: video_id.clone(),
                        title,
                        text,
                        cached: true,
                    });
                }
                Ok(None) => tracing::debug!("No cached transcript, fetching"),
                Err(e) => tracing::warn!(error = ?e, "Failed to read transcript cache"),
            }
        }

        let mut attempt = 0;
        let text = loop {
            self.limiter.acquire().await;

            match self.fetch_once(video_id).await {
                Ok(text) => break text,
                Err(CaptionError::NoCaptions) => {
                    tracing::warn!("No transcript available");
                    return Err(TranscriptError::NoTranscriptAvailable {
                        video_id: video_id.to_string(),
                    });
                }
                Err(CaptionError::Malformed(reason)) if attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.base_delay * attempt;
                    tracing::warn!(
                        %reason,
                        attempt,
                        delay_secs = delay.as_secs_f64(),
                        "Malformed caption response, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, attempts = attempt + 1, "Failed to fetch transcript");
                    return Err(TranscriptError::FetchFailed {
                        video_id: video_id.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        };

        let title = self.titles.lookup_title(video_id).await;

        if self.use_cache {
            if let Err(e) = self.cache.put(video_id.as_str(), &text).await {
                tracing::warn!(error = ?e, "Failed to cache transcript");
            }
        }

        tracing::info!(len = text.len(), "Fetched transcript");
        Ok(TranscriptRecord {
            video_id: video_id.clone(),
            title,
            text,
            cached: false,
        })
    }

    async fn fetch_once(&self, video_id: &VideoId) -> Result<String, CaptionError> {
        let tracks = self.source.list_tracks(video_id).await?;
        let track = select_track(&tracks).ok_or(CaptionError::NoCaptions)?;
        tracing::debug!(language = %track.language_code, kind = ?track.kind, "Selected caption track");

        let snippets = self.source.fetch_track(track).await?;
        let text = render_snippets(&snippets);
        if text.trim().is_empty() {
            return Err(CaptionError::Malformed("received empty transcript".into()));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use caption_store::MemoryTranscriptCache;

    use super::*;
    use crate::yt::{CaptionSnippet, CaptionTrack, TrackKind};

    /// Replays scripted `list_tracks` outcomes, then succeeds
    struct ScriptedSource {
        script: Mutex<Vec<CaptionError>>,
        list_calls: Mutex<usize>,
    }

    impl ScriptedSource {
        fn new(script: Vec<CaptionError>) -> Self {
            Self {
                script: Mutex::new(script),
                list_calls: Mutex::new(0),
            }
        }

        fn list_calls(&self) -> usize {
            *self.list_calls.lock().unwrap()
        }
    }

    impl CaptionSource for ScriptedSource {
        async fn list_tracks(&self, _: &VideoId) -> Result<Vec<CaptionTrack>, CaptionError> {
            *self.list_calls.lock().unwrap() += 1;
            let mut script = self.script.lock().unwrap();
            if !script.is_empty() {
                return Err(script.remove(0));
            }
            Ok(vec![CaptionTrack {
                language_code: "en".into(),
                kind: TrackKind::Manual,
                url: "https://captions.test/en".into(),
            }])
        }

        async fn fetch_track(&self, _: &CaptionTrack) -> Result<Vec<CaptionSnippet>, CaptionError> {
            Ok(vec![CaptionSnippet {
                text: "fresh text".into(),
                start: 0.0,
                duration: 1.0,
            }])
        }
    }

    struct FixedTitle;

    impl TitleLookup for FixedTitle {
        async fn lookup_title(&self, _: &VideoId) -> String {
            "A Title".into()
        }
    }

    fn fetcher<'a>(
        cache: &'a MemoryTranscriptCache,
        source: &'a ScriptedSource,
    ) -> TranscriptFetcher<&'a MemoryTranscriptCache, &'a ScriptedSource, FixedTitle> {
        TranscriptFetcher::new(
            cache,
            source,
            FixedTitle,
            Arc::new(RateLimiter::new(Duration::from_secs(2))),
        )
    }

    fn id() -> VideoId {
        VideoId::parse("dQw4w9WgXcQ").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hit_skips_source() {
        let cache = MemoryTranscriptCache::new();
        cache.put("dQw4w9WgXcQ", "cached text").await.unwrap();
        let source = ScriptedSource::new(vec![]);

        let record = fetcher(&cache, &source).fetch(&id()).await.unwrap();

        assert!(record.cached);
        assert_eq!(record.text, "cached text");
        assert_eq!(record.title, "A Title");
        assert_eq!(source.list_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_miss_fetches_and_writes_through() {
        let cache = MemoryTranscriptCache::new();
        let source = ScriptedSource::new(vec![]);

        let record = fetcher(&cache, &source).fetch(&id()).await.unwrap();

        assert!(!record.cached);
        assert_eq!(record.text, "fresh text");
        assert_eq!(
            cache.get("dQw4w9WgXcQ").await.unwrap().as_deref(),
            Some("fresh text")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_disabled_neither_reads_nor_writes() {
        let cache = MemoryTranscriptCache::new();
        cache.put("dQw4w9WgXcQ", "stale").await.unwrap();
        let source = ScriptedSource::new(vec![]);

        let record = fetcher(&cache, &source)
            .use_cache(false)
            .fetch(&id())
            .await
            .unwrap();

        assert_eq!(record.text, "fresh text");
        assert!(!record.cached);
        assert_eq!(
            cache.get("dQw4w9WgXcQ").await.unwrap().as_deref(),
            Some("stale")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_back_off_linearly() {
        let cache = MemoryTranscriptCache::new();
        let source = ScriptedSource::new(vec![
            CaptionError::Malformed("no element found".into()),
            CaptionError::Malformed("no element found".into()),
        ]);

        let start = tokio::time::Instant::now();
        let record = fetcher(&cache, &source).fetch(&id()).await.unwrap();

        assert_eq!(record.text, "fresh text");
        assert_eq!(source.list_calls(), 3);
        // 2s + 4s of backoff; the rate limiter interval is already covered by it
        assert!(start.elapsed() >= Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_bound_escalates_to_fetch_failed() {
        let cache = MemoryTranscriptCache::new();
        let source = ScriptedSource::new(vec![
            CaptionError::Malformed("xml".into()),
            CaptionError::Malformed("xml".into()),
            CaptionError::Malformed("xml".into()),
        ]);

        let err = fetcher(&cache, &source).fetch(&id()).await.unwrap_err();

        assert!(matches!(err, TranscriptError::FetchFailed { .. }));
        assert_eq!(source.list_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_absence_is_not_retried() {
        let cache = MemoryTranscriptCache::new();
        let source = ScriptedSource::new(vec![CaptionError::NoCaptions]);

        let err = fetcher(&cache, &source).fetch(&id()).await.unwrap_err();

        assert_eq!(
            err,
            TranscriptError::NoTranscriptAvailable {
                video_id: "dQw4w9WgXcQ".into()
            }
        );
        assert_eq!(source.list_calls(), 1);
        assert!(!cache.contains("dQw4w9WgXcQ"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_errors_are_not_retried() {
        let cache = MemoryTranscriptCache::new();
        let source = ScriptedSource::new(vec![CaptionError::Other("HTTP 429".into())]);

        let err = fetcher(&cache, &source).fetch(&id()).await.unwrap_err();

        assert!(matches!(err, TranscriptError::FetchFailed { reason, .. } if reason == "HTTP 429"));
        assert_eq!(source.list_calls(), 1);
    }
}
