use std::{sync::Arc, time::Duration};

use caption_store::{AuditLog, DocumentSink, TranscriptCache};

use crate::{
    config::Settings,
    llm::summarizer::{PromptPair, Summarizer},
    processor::{OutputNaming, VideoProcessor},
    yt::{fetcher::TranscriptFetcher, rate_limiter::RateLimiter, CaptionSource, TitleLookup},
};

/// Assembles a [`VideoProcessor`]; `build` is only available once every
/// collaborator has been supplied.
pub struct VideoProcessorBuilder<C = (), Y = (), L = (), S = (), D = (), A = ()> {
    cache: C,
    captions: Y,
    titles: L,
    summarizer: S,
    sink: D,
    audit_log: A,
    limiter: Arc<RateLimiter>,
    model: String,
    chunk_size: usize,
    max_retries: u32,
    retry_base_delay: Duration,
    use_cache: bool,
    auto_overwrite: bool,
    prompts: PromptPair,
    naming: OutputNaming,
}

impl VideoProcessorBuilder {
    pub fn new(settings: &Settings) -> Self {
        Self {
            cache: (),
            captions: (),
            titles: (),
            summarizer: (),
            sink: (),
            audit_log: (),
            limiter: Arc::new(RateLimiter::new(settings.rate_limit_delay)),
            model: settings.model.clone(),
            chunk_size: settings.chunk_size,
            max_retries: settings.max_fetch_retries,
            retry_base_delay: settings.retry_base_delay,
            use_cache: true,
            auto_overwrite: false,
            prompts: PromptPair::default(),
            naming: OutputNaming::Slug,
        }
    }
}

impl<C, Y, L, S, D, A> VideoProcessorBuilder<C, Y, L, S, D, A> {
    pub fn transcript_cache<C2: TranscriptCache + Send + Sync>(
        self,
        cache: C2,
    ) -> VideoProcessorBuilder<C2, Y, L, S, D, A> {
        VideoProcessorBuilder {
            cache,
            captions: self.captions,
            titles: self.titles,
            summarizer: self.summarizer,
            sink: self.sink,
            audit_log: self.audit_log,
            limiter: self.limiter,
            model: self.model,
            chunk_size: self.chunk_size,
            max_retries: self.max_retries,
            retry_base_delay: self.retry_base_delay,
            use_cache: self.use_cache,
            auto_overwrite: self.auto_overwrite,
            prompts: self.prompts,
            naming: self.naming,
        }
    }

    pub fn caption_source<Y2: CaptionSource + Send + Sync>(
        self,
        captions: Y2,
    ) -> VideoProcessorBuilder<C, Y2, L, S, D, A> {
        VideoProcessorBuilder {
            cache: self.cache,
            captions,
            titles: self.titles,
            summarizer: self.summarizer,
            sink: self.sink,
            audit_log: self.audit_log,
            limiter: self.limiter,
            model: self.model,
            chunk_size: self.chunk_size,
            max_retries: self.max_retries,
            retry_base_delay: self.retry_base_delay,
            use_cache: self.use_cache,
            auto_overwrite: self.auto_overwrite,
            prompts: self.prompts,
            naming: self.naming,
        }
    }

    pub fn title_lookup<L2: TitleLookup + Send + Sync>(
        self,
        titles: L2,
    ) -> VideoProcessorBuilder<C, Y, L2, S, D, A> {
        VideoProcessorBuilder {
            cache: self.cache,
            captions: self.captions,
            titles,
            summarizer: self.summarizer,
            sink: self.sink,
            audit_log: self.audit_log,
            limiter: self.limiter,
            model: self.model,
            chunk_size: self.chunk_size,
            max_retries: self.max_retries,
            retry_base_delay: self.retry_base_delay,
            use_cache: self.use_cache,
            auto_overwrite: self.auto_overwrite,
            prompts: self.prompts,
            naming: self.naming,
        }
    }

    pub fn summarizer<S2: Summarizer + Send + Sync>(
        self,
        summarizer: S2,
    ) -> VideoProcessorBuilder<C, Y, L, S2, D, A> {
        VideoProcessorBuilder {
            cache: self.cache,
            captions: self.captions,
            titles: self.titles,
            summarizer,
            sink: self.sink,
            audit_log: self.audit_log,
            limiter: self.limiter,
            model: self.model,
            chunk_size: self.chunk_size,
            max_retries: self.max_retries,
            retry_base_delay: self.retry_base_delay,
            use_cache: self.use_cache,
            auto_overwrite: self.auto_overwrite,
            prompts: self.prompts,
            naming: self.naming,
        }
    }

    pub fn document_sink<D2: DocumentSink + Send + Sync>(
        self,
        sink: D2,
    ) -> VideoProcessorBuilder<C, Y, L, S, D2, A> {
        VideoProcessorBuilder {
            cache: self.cache,
            captions: self.captions,
            titles: self.titles,
            summarizer: self.summarizer,
            sink,
            audit_log: self.audit_log,
            limiter: self.limiter,
            model: self.model,
            chunk_size: self.chunk_size,
            max_retries: self.max_retries,
            retry_base_delay: self.retry_base_delay,
            use_cache: self.use_cache,
            auto_overwrite: self.auto_overwrite,
            prompts: self.prompts,
            naming: self.naming,
        }
    }

    pub fn audit_log<A2: AuditLog + Send + Sync>(
        self,
        audit_log: A2,
    ) -> VideoProcessorBuilder<C, Y, L, S, D, A2> {
        VideoProcessorBuilder {
            cache: self.cache,
            captions: self.captions,
            titles: self.titles,
            summarizer: self.summarizer,
            sink: self.sink,
            audit_log,
            limiter: self.limiter,
            model: self.model,
            chunk_size: self.chunk_size,
            max_retries: self.max_retries,
            retry_base_delay: self.retry_base_delay,
            use_cache: self.use_cache,
            auto_overwrite: self.auto_overwrite,
            prompts: self.prompts,
            naming: self.naming,
        }
    }

    /// Shares pacing with other fetchers instead of using a private limiter
    pub fn rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn retry_policy(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_base_delay = base_delay;
        self
    }

    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    /// Replace existing outputs instead of writing `_vN` variants
    pub fn auto_overwrite(mut self, auto_overwrite: bool) -> Self {
        self.auto_overwrite = auto_overwrite;
        self
    }

    pub fn prompts(mut self, prompts: PromptPair) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn naming(mut self, naming: OutputNaming) -> Self {
        self.naming = naming;
        self
    }
}

impl<C, Y, L, S, D, A> VideoProcessorBuilder<C, Y, L, S, D, A>
where
    C: TranscriptCache + Send + Sync,
    Y: CaptionSource + Send + Sync,
    L: TitleLookup + Send + Sync,
    S: Summarizer + Send + Sync,
    D: DocumentSink + Send + Sync,
    A: AuditLog + Send + Sync,
{
    pub fn build(self) -> VideoProcessor<C, Y, L, S, D, A> {
        let fetcher = TranscriptFetcher::new(self.cache, self.captions, self.titles, self.limiter)
            .with_retry_policy(self.max_retries, self.retry_base_delay)
            .use_cache(self.use_cache);

        VideoProcessor {
            fetcher,
            summarizer: self.summarizer,
            sink: self.sink,
            audit_log: self.audit_log,
            model: self.model,
            chunk_size: self.chunk_size,
            prompts: self.prompts,
            naming: self.naming,
            auto_overwrite: self.auto_overwrite,
        }
    }
}
