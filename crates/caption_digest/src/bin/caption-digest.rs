use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use caption_digest::{
    research::{
        plan::read_video_list, CorpusManager, CorpusOutcome, PlanStore, ResearchPlanConfig,
    },
    tracing::init_tracing_subscriber,
    yt::{captions::YtDlpCaptionSource, oembed::OEmbedTitleLookup},
    BatchReport, GenerateOptions, OllamaClient, OutputNaming, PromptPair, RawHttpTransport,
    Settings, TieredSummarizer, VideoId, VideoProcessor, VideoProcessorBuilder,
};
use caption_store::{FsDocumentSink, FsTranscriptCache, JsonlAuditLog, TranscriptCache};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "caption-digest",
    about = "Summarize YouTube captions into markdown and research corpora"
)]
struct Cli {
    /// Base URL of the Ollama server
    #[arg(long, env = "OLLAMA_URL", default_value = Settings::DEFAULT_OLLAMA_URL, global = true)]
    ollama_url: String,

    /// Model used for summarization
    #[arg(long, env = "OLLAMA_MODEL", default_value = Settings::DEFAULT_MODEL, global = true)]
    model: String,

    /// Token budget per transcript chunk
    #[arg(long, env = "CHUNK_SIZE", default_value = "2048", global = true)]
    chunk_size: usize,

    /// Minimum seconds between caption requests
    #[arg(long, env = "RATE_LIMIT_DELAY", default_value = "2.0", global = true)]
    rate_limit_delay: f64,

    /// Inference request timeout in seconds
    #[arg(long, env = "OLLAMA_TIMEOUT", default_value = "300", global = true)]
    ollama_timeout: u64,

    /// Caption and title request timeout in seconds
    #[arg(long, env = "YOUTUBE_TIMEOUT", default_value = "30", global = true)]
    youtube_timeout: u64,

    #[arg(long, env = "DATA_DIR", default_value = "data", global = true)]
    data_dir: PathBuf,

    /// Output directory for summaries made outside a research plan
    #[arg(long, env = "DOCS_DIR", default_value = "docs", global = true)]
    docs_dir: PathBuf,

    #[arg(long, env = "LOGS_DIR", default_value = "logs", global = true)]
    logs_dir: PathBuf,

    #[arg(long, env = "PLANS_DIR", default_value = "research_plans", global = true)]
    plans_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            ollama_url: self.ollama_url.clone(),
            model: self.model.clone(),
            chunk_size: self.chunk_size,
            rate_limit_delay: Duration::from_secs_f64(self.rate_limit_delay.max(0.0)),
            inference_timeout: Duration::from_secs(self.ollama_timeout),
            youtube_timeout: Duration::from_secs(self.youtube_timeout),
            plans_dir: self.plans_dir.clone(),
            ..Settings::from_dirs(&self.data_dir, &self.docs_dir, &self.logs_dir)
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Summarize individual videos into the docs directory
    Process {
        /// Video URLs or ids
        references: Vec<String>,

        /// File with one video reference per line
        #[arg(long)]
        list_file: Option<PathBuf>,

        /// Replace existing summaries instead of writing `_vN` variants
        #[arg(long)]
        overwrite: bool,

        /// Neither read nor write the transcript cache
        #[arg(long)]
        no_cache: bool,
    },
    /// Manage and run research plans
    Plan {
        #[command(subcommand)]
        command: PlanCommand,
    },
    /// Build or analyze a research plan's corpus
    Corpus {
        plan_id: String,

        #[command(subcommand)]
        command: CorpusCommand,
    },
    /// Inspect or empty the transcript cache
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
    /// Check that the inference server is reachable and has the model
    Check,
}

#[derive(Subcommand)]
enum PlanCommand {
    List,
    Create {
        plan_id: String,

        /// Display name, defaults to the plan id
        #[arg(long)]
        name: Option<String>,

        #[arg(long, default_value = "")]
        description: String,
    },
    Show {
        plan_id: String,
    },
    /// Summarize the plan's videos, then build its corpus
    Run {
        plan_id: String,

        #[arg(long, value_enum, default_value = "full")]
        corpus: CorpusMode,

        #[arg(long)]
        overwrite: bool,

        #[arg(long)]
        no_cache: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CorpusMode {
    Full,
    Aggregate,
    Skip,
}

#[derive(Subcommand)]
enum CorpusCommand {
    Aggregate {
        /// Only include summaries of these videos
        #[arg(long = "video")]
        videos: Vec<String>,
    },
    Analyze,
    Full {
        #[arg(long = "video")]
        videos: Vec<String>,
    },
}

#[derive(Subcommand)]
enum CacheCommand {
    Stats,
    Clear,
}

type CliProcessor = VideoProcessor<
    FsTranscriptCache,
    YtDlpCaptionSource,
    OEmbedTitleLookup,
    TieredSummarizer,
    FsDocumentSink,
    JsonlAuditLog,
>;

fn build_summarizer(settings: &Settings) -> anyhow::Result<TieredSummarizer> {
    let primary = OllamaClient::new(&settings.ollama_url, settings.inference_timeout, 2)?;
    let fallback = RawHttpTransport::new(
        settings.ollama_api_url("generate"),
        settings.inference_timeout,
    )?;

    Ok(TieredSummarizer::new(GenerateOptions {
        temperature: settings.temperature,
    })
    .with_transport(primary)
    .with_transport(fallback))
}

fn build_processor(
    settings: &Settings,
    output_dir: PathBuf,
    prompts: PromptPair,
    naming: OutputNaming,
    use_cache: bool,
    overwrite: bool,
) -> anyhow::Result<CliProcessor> {
    let processor = VideoProcessorBuilder::new(settings)
        .transcript_cache(FsTranscriptCache::new(&settings.raw_dir))
        .caption_source(YtDlpCaptionSource::new(settings.youtube_timeout)?)
        .title_lookup(OEmbedTitleLookup::new(settings.youtube_timeout)?)
        .summarizer(build_summarizer(settings)?)
        .document_sink(FsDocumentSink::new(output_dir))
        .audit_log(JsonlAuditLog::new(&settings.audit_log))
        .prompts(prompts)
        .naming(naming)
        .use_cache(use_cache)
        .auto_overwrite(overwrite)
        .build();

    Ok(processor)
}

fn print_report(report: &BatchReport) {
    for result in &report.results {
        match (&result.output_path, &result.error) {
            (Some(path), _) => println!(
                "✓ {}: {} chunks → {}",
                result.video_id,
                result.chunk_count,
                path.display()
            ),
            (None, Some(error)) => println!("✗ {}: {error}", result.video_id),
            (None, None) => println!("✗ {}", result.video_id),
        }
    }

    let stats = &report.stats;
    println!("\nTotal: {}", stats.total);
    println!("Successful: {}", stats.successful);
    println!("Failed: {}", stats.failed);
    if stats.skipped > 0 {
        println!("Skipped: {}", stats.skipped);
    }
}

fn print_corpus_outcome(outcome: &CorpusOutcome) {
    println!("Corpus: {}", outcome.corpus_path.display());
    if let Some(summary_path) = &outcome.summary_path {
        println!("Analysis: {}", summary_path.display());
    }
    println!("Videos included: {}", outcome.video_count);
}

/// Normalizes `--video` arguments to ids so they match summary filenames
fn video_filter(videos: &[String]) -> anyhow::Result<Option<Vec<String>>> {
    if videos.is_empty() {
        return Ok(None);
    }
    let ids = videos
        .iter()
        .map(|v| VideoId::parse(v).map(|id| id.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(ids))
}

async fn load_valid_plan(store: &PlanStore, plan_id: &str) -> anyhow::Result<ResearchPlanConfig> {
    let plan = store.load_plan(plan_id).await?;
    plan.ensure_valid()?;
    Ok(plan)
}

async fn process(
    settings: &Settings,
    references: Vec<String>,
    list_file: Option<PathBuf>,
    overwrite: bool,
    no_cache: bool,
) -> anyhow::Result<()> {
    let mut references = references;
    if let Some(list_file) = &list_file {
        references.extend(read_video_list(list_file).await?);
    }
    if references.is_empty() {
        tracing::info!(path = ?settings.default_video_list, "No videos given, reading default list");
        references = read_video_list(&settings.default_video_list).await?;
    }

    let processor = build_processor(
        settings,
        settings.docs_dir.clone(),
        PromptPair::default(),
        OutputNaming::Slug,
        !no_cache,
        overwrite,
    )?;

    let report = processor.process_batch(&references).await;
    print_report(&report);
    Ok(())
}

async fn run_plan(
    settings: &Settings,
    store: &PlanStore,
    plan_id: &str,
    corpus: CorpusMode,
    overwrite: bool,
    no_cache: bool,
) -> anyhow::Result<()> {
    let plan = load_valid_plan(store, plan_id).await?;
    let videos = plan.video_list().await?;
    println!("Research plan: {} ({} videos)", plan.name, videos.len());

    let processor = build_processor(
        settings,
        plan.video_output_dir(),
        plan.video_prompts(),
        plan.output_naming(),
        !no_cache,
        overwrite,
    )?;
    let report = processor.process_batch(&videos).await;
    print_report(&report);

    if matches!(corpus, CorpusMode::Skip) {
        return Ok(());
    }

    let ids = report
        .successful()
        .map(|r| r.video_id.clone())
        .collect::<Vec<_>>();
    if ids.is_empty() {
        anyhow::bail!("No videos processed successfully, skipping corpus");
    }

    let manager = CorpusManager::new(plan, build_summarizer(settings)?, settings);
    let outcome = match corpus {
        CorpusMode::Aggregate => {
            manager
                .aggregate_video_summaries(Some(ids.as_slice()))
                .await?
        }
        _ => {
            manager
                .full_corpus_pipeline(Some(ids.as_slice()), None)
                .await?
        }
    };
    print_corpus_outcome(&outcome);
    Ok(())
}

async fn plan_command(settings: &Settings, command: PlanCommand) -> anyhow::Result<()> {
    let store = PlanStore::new(&settings.plans_dir);

    match command {
        PlanCommand::List => {
            let plans = store.list_plans().await?;
            if plans.is_empty() {
                println!("No research plans in {}", store.plans_dir().display());
            }
            for plan_id in plans {
                match store.load_plan(&plan_id).await {
                    Ok(plan) => println!("{plan_id}\t{}", plan.name),
                    Err(e) => println!("{plan_id}\t(unreadable: {e})"),
                }
            }
        }
        PlanCommand::Create {
            plan_id,
            name,
            description,
        } => {
            let name = name.unwrap_or_else(|| plan_id.clone());
            let path = store
                .create_plan_from_template(&plan_id, &name, &description)
                .await?;
            println!("Created {}", path.display());
        }
        PlanCommand::Show { plan_id } => {
            let plan = store.load_plan(&plan_id).await?;
            print!("{}", plan.to_yaml()?);
            if let Err(e) = plan.validate() {
                println!("\nValidation: {e}");
            }
        }
        PlanCommand::Run {
            plan_id,
            corpus,
            overwrite,
            no_cache,
        } => run_plan(settings, &store, &plan_id, corpus, overwrite, no_cache).await?,
    }

    Ok(())
}

async fn corpus_command(
    settings: &Settings,
    plan_id: &str,
    command: CorpusCommand,
) -> anyhow::Result<()> {
    let store = PlanStore::new(&settings.plans_dir);
    let plan = load_valid_plan(&store, plan_id).await?;
    let manager = CorpusManager::new(plan, build_summarizer(settings)?, settings);

    let outcome = match command {
        CorpusCommand::Aggregate { videos } => {
            let ids = video_filter(&videos)?;
            manager.aggregate_video_summaries(ids.as_deref()).await?
        }
        CorpusCommand::Analyze => manager.analyze_corpus(None).await?,
        CorpusCommand::Full { videos } => {
            let ids = video_filter(&videos)?;
            manager.full_corpus_pipeline(ids.as_deref(), None).await?
        }
    };

    print_corpus_outcome(&outcome);
    Ok(())
}

async fn cache_command(settings: &Settings, command: CacheCommand) -> anyhow::Result<()> {
    let cache = FsTranscriptCache::new(&settings.raw_dir);

    match command {
        CacheCommand::Stats => {
            let stats = cache.stats().await?;
            println!("Cached transcripts: {}", stats.entry_count);
            println!("Total size: {:.1} KiB", stats.total_bytes as f64 / 1024.0);
        }
        CacheCommand::Clear => {
            let removed = cache.clear().await?;
            println!("Removed {removed} cached transcripts");
        }
    }

    Ok(())
}

async fn check(settings: &Settings) -> anyhow::Result<()> {
    let client = OllamaClient::new(&settings.ollama_url, Duration::from_secs(10), 0)?;
    let models = client
        .list_models()
        .await
        .with_context(|| format!("Ollama is not reachable at {}", settings.ollama_url))?;

    println!("Ollama reachable at {}", settings.ollama_url);
    if !models.iter().any(|m| m == &settings.model) {
        anyhow::bail!(
            "Model {} is not available. Installed: {}",
            settings.model,
            models.join(", ")
        );
    }
    println!("Model {} is available", settings.model);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    ));

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    let settings = cli.settings();
    settings.create_directories()?;

    match cli.command {
        Command::Process {
            references,
            list_file,
            overwrite,
            no_cache,
        } => process(&settings, references, list_file, overwrite, no_cache).await,
        Command::Plan { command } => plan_command(&settings, command).await,
        Command::Corpus { plan_id, command } => corpus_command(&settings, &plan_id, command).await,
        Command::Cache { command } => cache_command(&settings, command).await,
        Command::Check => check(&settings).await,
    }
}
