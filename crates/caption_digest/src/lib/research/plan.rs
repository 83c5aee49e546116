use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use itertools::Itertools;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::{
    error::{PlanError, PlanValidationError, PromptKind},
    llm::summarizer::{PromptPair, CHUNK_PLACEHOLDER, SUMMARIES_PLACEHOLDER},
    parser::slugify,
    processor::OutputNaming,
};

static UNSAFE_FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f\x7f-\x9f]"#).unwrap());

const PLAN_NAME_PLACEHOLDER: &str = "{research_plan_name}";
const PLAN_EXTENSION: &str = "yaml";
const PROJECT_ROOT_MARKERS: [&str; 4] = ["Cargo.toml", ".git", "research_plans", "src"];

#[derive(Debug, Default, Serialize, Deserialize)]
struct PlanDocument {
    #[serde(default)]
    research_plan: PlanMeta,
    #[serde(default)]
    videos: VideoSources,
    #[serde(default)]
    prompts: PlanPrompts,
    #[serde(default)]
    output: OutputLayout,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PlanMeta {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct VideoSources {
    #[serde(default)]
    urls: Vec<String>,
    #[serde(default)]
    list_file: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PlanPrompts {
    #[serde(default)]
    chunk_prompt: String,
    #[serde(default)]
    executive_prompt: String,
    #[serde(default)]
    corpus_chunk_prompt: String,
    #[serde(default)]
    corpus_executive_prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct OutputLayout {
    #[serde(default = "default_video_summaries_dir")]
    video_summaries_dir: String,
    #[serde(default = "default_corpus_dir")]
    corpus_dir: String,
    #[serde(default = "default_video_filename_pattern")]
    video_filename_pattern: String,
    #[serde(default = "default_corpus_filename")]
    corpus_filename: String,
    #[serde(default = "default_corpus_summary_filename")]
    corpus_summary_filename: String,
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self {
            video_summaries_dir: default_video_summaries_dir(),
            corpus_dir: default_corpus_dir(),
            video_filename_pattern: default_video_filename_pattern(),
            corpus_filename: default_corpus_filename(),
            corpus_summary_filename: default_corpus_summary_filename(),
        }
    }
}

fn default_video_summaries_dir() -> String {
    "data/videos/".into()
}

fn default_corpus_dir() -> String {
    "data/corpus/".into()
}

fn default_video_filename_pattern() -> String {
    "{title}_{video_id}.md".into()
}

fn default_corpus_filename() -> String {
    "{research_plan_name}.md".into()
}

fn default_corpus_summary_filename() -> String {
    "{research_plan_name}_summary.md".into()
}

/// A research plan: which videos to read, how to prompt, and where results go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResearchPlanConfig {
    pub name: String,
    pub description: String,
    pub plan_id: String,
    pub video_urls: Vec<String>,
    pub video_list_file: Option<String>,
    pub chunk_prompt: String,
    pub executive_prompt: String,
    pub corpus_chunk_prompt: String,
    pub corpus_executive_prompt: String,
    pub video_summaries_dir: String,
    pub corpus_dir: String,
    pub video_filename_pattern: String,
    pub corpus_filename: String,
    pub corpus_summary_filename: String,
    /// Directory the plan was loaded from, used when resolving the video list file
    pub plans_dir: Option<PathBuf>,
}

impl ResearchPlanConfig {
    pub fn from_yaml(yaml: &str, plan_id: impl Into<String>) -> Result<Self, serde_yaml::Error> {
        let doc = if yaml.trim().is_empty() {
            PlanDocument::default()
        } else {
            serde_yaml::from_str::<PlanDocument>(yaml)?
        };
        Ok(Self::from_document(doc, plan_id.into()))
    }

    fn from_document(doc: PlanDocument, plan_id: String) -> Self {
        let PlanDocument {
            research_plan,
            videos,
            prompts,
            output,
        } = doc;

        ResearchPlanConfig {
            name: research_plan.name,
            description: research_plan.description,
            plan_id,
            video_urls: videos.urls,
            video_list_file: videos.list_file,
            chunk_prompt: prompts.chunk_prompt,
            executive_prompt: prompts.executive_prompt,
            corpus_chunk_prompt: prompts.corpus_chunk_prompt,
            corpus_executive_prompt: prompts.corpus_executive_prompt,
            video_summaries_dir: output.video_summaries_dir,
            corpus_dir: output.corpus_dir,
            video_filename_pattern: output.video_filename_pattern,
            corpus_filename: output.corpus_filename,
            corpus_summary_filename: output.corpus_summary_filename,
            plans_dir: None,
        }
    }

    fn to_document(&self) -> PlanDocument {
        PlanDocument {
            research_plan: PlanMeta {
                name: self.name.clone(),
                description: self.description.clone(),
            },
            videos: VideoSources {
                urls: self.video_urls.clone(),
                list_file: self.video_list_file.clone(),
            },
            prompts: PlanPrompts {
                chunk_prompt: self.chunk_prompt.clone(),
                executive_prompt: self.executive_prompt.clone(),
                corpus_chunk_prompt: self.corpus_chunk_prompt.clone(),
                corpus_executive_prompt: self.corpus_executive_prompt.clone(),
            },
            output: OutputLayout {
                video_summaries_dir: self.video_summaries_dir.clone(),
                corpus_dir: self.corpus_dir.clone(),
                video_filename_pattern: self.video_filename_pattern.clone(),
                corpus_filename: self.corpus_filename.clone(),
                corpus_summary_filename: self.corpus_summary_filename.clone(),
            },
        }
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.to_document())
    }

    /// Checks the plan, reporting the first rule it breaks
    pub fn validate(&self) -> Result<(), PlanValidationError> {
        if self.name.trim().is_empty() {
            return Err(PlanValidationError::EmptyName);
        }
        if self.plan_id.trim().is_empty() {
            return Err(PlanValidationError::EmptyPlanId);
        }

        let has_list_file = self.video_list_file.as_deref().is_some_and(|f| !f.is_empty());
        if self.video_urls.is_empty() && !has_list_file {
            return Err(PlanValidationError::NoVideoSource);
        }

        let prompts = [
            (PromptKind::Chunk, &self.chunk_prompt, CHUNK_PLACEHOLDER),
            (PromptKind::Executive, &self.executive_prompt, SUMMARIES_PLACEHOLDER),
            (PromptKind::CorpusChunk, &self.corpus_chunk_prompt, CHUNK_PLACEHOLDER),
            (
                PromptKind::CorpusExecutive,
                &self.corpus_executive_prompt,
                SUMMARIES_PLACEHOLDER,
            ),
        ];

        for (kind, prompt, placeholder) in prompts {
            if prompt.trim().is_empty() {
                return Err(PlanValidationError::EmptyPrompt(kind));
            }
            if !prompt.contains(placeholder) {
                return Err(PlanValidationError::MissingPlaceholder {
                    prompt: kind,
                    placeholder,
                });
            }
        }

        Ok(())
    }

    /// [`validate`](Self::validate), reported as a [`PlanError`]
    pub fn ensure_valid(&self) -> Result<(), PlanError> {
        self.validate().map_err(|source| PlanError::Invalid {
            plan_id: self.plan_id.clone(),
            source,
        })
    }

    pub fn video_output_dir(&self) -> PathBuf {
        PathBuf::from(&self.video_summaries_dir)
    }

    pub fn corpus_output_dir(&self) -> PathBuf {
        PathBuf::from(&self.corpus_dir)
    }

    pub fn corpus_filename(&self) -> String {
        self.corpus_filename.replace(PLAN_NAME_PLACEHOLDER, &self.plan_id)
    }

    pub fn corpus_summary_filename(&self) -> String {
        self.corpus_summary_filename.replace(PLAN_NAME_PLACEHOLDER, &self.plan_id)
    }

    /// Per-video filename; `{title}` becomes the title's slug
    pub fn video_filename(&self, title: &str, video_id: &str) -> String {
        self.video_filename_pattern
            .replace("{title}", &slugify(title))
            .replace("{video_id}", video_id)
    }

    pub fn output_naming(&self) -> OutputNaming {
        OutputNaming::Pattern(self.video_filename_pattern.clone())
    }

    /// Prompts used for each video of the plan
    pub fn video_prompts(&self) -> PromptPair {
        PromptPair::new(&self.chunk_prompt, &self.executive_prompt)
    }

    /// Prompts used over the aggregated corpus, prefixed with the plan description
    pub fn corpus_prompts(&self) -> PromptPair {
        PromptPair::new(&self.corpus_chunk_prompt, &self.corpus_executive_prompt)
            .with_context(&self.description)
    }

    /// Direct URLs plus list file entries, deduplicated in first-seen order
    pub async fn video_list(&self) -> Result<Vec<String>, PlanError> {
        let cwd = std::env::current_dir()?;
        self.video_list_from(&cwd).await
    }

    /// [`video_list`](Self::video_list) with relative list files resolved against `cwd`
    pub async fn video_list_from(&self, cwd: &Path) -> Result<Vec<String>, PlanError> {
        let mut videos = self
            .video_urls
            .iter()
            .filter(|url| !url.is_empty() && !url.trim().starts_with('#'))
            .cloned()
            .collect::<Vec<_>>();

        if let Some(list_file) = self
            .video_list_file
            .as_deref()
            .filter(|f| !f.trim().is_empty())
        {
            let path = self.resolve_list_file(list_file, cwd).await?;
            tracing::debug!(path = ?path, "Reading video list file");
            videos.extend(read_video_list(&path).await?);
        }

        Ok(videos.into_iter().unique().collect())
    }

    async fn resolve_list_file(&self, list_file: &str, cwd: &Path) -> Result<PathBuf, PlanError> {
        let path = Path::new(list_file);
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }

        let mut candidates = vec![cwd.join(path), find_project_root(cwd).await.join(path)];
        if let Some(plans_parent) = self.plans_dir.as_deref().and_then(Path::parent) {
            candidates.push(plans_parent.join(path));
        }

        for candidate in candidates {
            if fs::try_exists(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(PlanError::VideoListNotFound(path.to_path_buf()))
    }
}

/// Nearest ancestor of `start` (inclusive) holding a project marker, else `start`
pub async fn find_project_root(start: &Path) -> PathBuf {
    for dir in start.ancestors() {
        for marker in PROJECT_ROOT_MARKERS {
            if fs::try_exists(dir.join(marker)).await.unwrap_or(false) {
                return dir.to_path_buf();
            }
        }
    }
    start.to_path_buf()
}

/// One reference per line; blank lines and `#` comments are skipped
pub async fn read_video_list(path: &Path) -> Result<Vec<String>, PlanError> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(PlanError::VideoListNotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };

    let videos = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect::<Vec<_>>();

    if videos.is_empty() {
        return Err(PlanError::EmptyVideoList(path.to_path_buf()));
    }
    Ok(videos)
}

fn sanitize_plan_id(plan_id: &str) -> Option<String> {
    let sanitized = UNSAFE_FILENAME_RE.replace_all(plan_id, "");
    let sanitized = sanitized.trim_matches(|c| c == '.' || c == ' ');
    (!sanitized.is_empty()).then(|| sanitized.to_string())
}

/// Research plans stored as `<plans_dir>/<plan_id>.yaml`
#[derive(Debug, Clone)]
pub struct PlanStore {
    plans_dir: PathBuf,
}

impl PlanStore {
    pub fn new(plans_dir: impl Into<PathBuf>) -> Self {
        Self {
            plans_dir: plans_dir.into(),
        }
    }

    pub fn plans_dir(&self) -> &Path {
        &self.plans_dir
    }

    pub fn plan_path(&self, plan_id: &str) -> PathBuf {
        self.plans_dir.join(format!("{plan_id}.{PLAN_EXTENSION}"))
    }

    /// Sorted ids of every stored plan
    pub async fn list_plans(&self) -> Result<Vec<String>, PlanError> {
        let mut read_dir = match fs::read_dir(&self.plans_dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            paths.push(entry.path());
        }

        let ids = paths
            .into_iter()
            .filter(|path| path.extension().is_some_and(|ext| ext == PLAN_EXTENSION))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .sorted()
            .collect();

        Ok(ids)
    }

    pub async fn plan_exists(&self, plan_id: &str) -> Result<bool, PlanError> {
        Ok(fs::try_exists(self.plan_path(plan_id)).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn load_plan(&self, plan_id: &str) -> Result<ResearchPlanConfig, PlanError> {
        let path = self.plan_path(plan_id);
        let yaml = match fs::read_to_string(&path).await {
            Ok(yaml) => yaml,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PlanError::NotFound(plan_id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let mut plan = ResearchPlanConfig::from_yaml(&yaml, plan_id)
            .inspect_err(|e| tracing::error!(error = %e, "Invalid research plan YAML"))
            .map_err(|source| PlanError::Parse {
                path: path.clone(),
                source,
            })?;
        plan.plans_dir = Some(self.plans_dir.clone());

        tracing::info!("Loaded research plan");
        Ok(plan)
    }

    /// Writes a starter plan; refuses to replace an existing one
    #[tracing::instrument(skip(self, description))]
    pub async fn create_plan_from_template(
        &self,
        plan_id: &str,
        name: &str,
        description: &str,
    ) -> Result<PathBuf, PlanError> {
        let plan_id = sanitize_plan_id(plan_id)
            .ok_or_else(|| PlanError::InvalidPlanId(plan_id.to_string()))?;
        let path = self.plan_path(&plan_id);
        if fs::try_exists(&path).await? {
            return Err(PlanError::AlreadyExists(plan_id));
        }

        let template = template_plan(&plan_id, name, description);
        let yaml = template.to_yaml().map_err(|source| PlanError::Parse {
            path: path.clone(),
            source,
        })?;

        fs::create_dir_all(&self.plans_dir).await?;
        fs::write(&path, yaml).await?;

        tracing::info!(path = ?path, "Created research plan");
        Ok(path)
    }

    pub async fn delete_plan(&self, plan_id: &str) -> Result<(), PlanError> {
        match fs::remove_file(self.plan_path(plan_id)).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PlanError::NotFound(plan_id.to_string()))
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(plan_id, "Deleted research plan");
        Ok(())
    }
}

fn template_plan(plan_id: &str, name: &str, description: &str) -> ResearchPlanConfig {
    let description = if description.trim().is_empty() {
        "Research plan for focused content extraction"
    } else {
        description
    };
    let output = OutputLayout::default();

    ResearchPlanConfig {
        name: name.to_string(),
        description: description.to_string(),
        plan_id: plan_id.to_string(),
        video_urls: Vec::new(),
        video_list_file: None,
        chunk_prompt: "You are analyzing YouTube video transcripts for focused content extraction.\n\
            Extract and summarize only the relevant content from this transcript chunk:\n\n\
            {chunk}\n\n\
            Focus on the specific topics and information relevant to the research plan."
            .into(),
        executive_prompt: "Create a comprehensive summary by combining these extracted content sections:\n\n\
            {bullet_summaries}\n\n\
            Provide a clear, well-structured summary that captures the key information and themes."
            .into(),
        corpus_chunk_prompt: "You are analyzing a collection of research summaries from multiple videos.\n\
            Identify patterns, themes, and insights from this content:\n\n\
            {chunk}\n\n\
            Focus on connections and recurring themes across the research corpus."
            .into(),
        corpus_executive_prompt: "Create a comprehensive analysis of the research corpus by synthesizing these insights:\n\n\
            {bullet_summaries}\n\n\
            Organize findings by themes, highlight key patterns, and provide actionable insights."
            .into(),
        video_summaries_dir: output.video_summaries_dir,
        corpus_dir: output.corpus_dir,
        video_filename_pattern: output.video_filename_pattern,
        corpus_filename: output.corpus_filename,
        corpus_summary_filename: output.corpus_summary_filename,
        plans_dir: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_PLAN: &str = r##"
research_plan:
  name: Rust Talks
  description: Conference talks about Rust
videos:
  urls:
    - https://youtu.be/aaaaaaaaaaa
    - "# https://youtu.be/commented0"
    - bbbbbbbbbbb
    - https://youtu.be/aaaaaaaaaaa
prompts:
  chunk_prompt: "Summarize: {chunk}"
  executive_prompt: "Combine: {bullet_summaries}"
  corpus_chunk_prompt: "Analyze: {chunk}"
  corpus_executive_prompt: "Synthesize: {bullet_summaries}"
"##;

    fn valid_plan() -> ResearchPlanConfig {
        ResearchPlanConfig::from_yaml(VALID_PLAN, "rust_talks").unwrap()
    }

    #[test]
    fn test_parses_with_output_defaults() {
        let plan = valid_plan();
        assert_eq!(plan.name, "Rust Talks");
        assert_eq!(plan.video_summaries_dir, "data/videos/");
        assert_eq!(plan.corpus_filename(), "rust_talks.md");
        assert_eq!(plan.corpus_summary_filename(), "rust_talks_summary.md");
        assert_eq!(
            plan.video_filename("Hello, World!", "aaaaaaaaaaa"),
            "hello-world_aaaaaaaaaaa.md"
        );
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_validation_rules_in_order() {
        let mut plan = valid_plan();
        plan.name = "  ".into();
        plan.plan_id = String::new();
        assert_eq!(plan.validate(), Err(PlanValidationError::EmptyName));

        let mut plan = valid_plan();
        plan.plan_id = " ".into();
        assert_eq!(plan.validate(), Err(PlanValidationError::EmptyPlanId));

        let mut plan = valid_plan();
        plan.video_urls.clear();
        assert_eq!(plan.validate(), Err(PlanValidationError::NoVideoSource));
        plan.video_list_file = Some("videos.txt".into());
        assert!(plan.validate().is_ok());

        let mut plan = valid_plan();
        plan.executive_prompt = "\n".into();
        assert_eq!(
            plan.validate(),
            Err(PlanValidationError::EmptyPrompt(PromptKind::Executive))
        );

        let mut plan = valid_plan();
        plan.corpus_chunk_prompt = "Analyze: {bullet_summaries}".into();
        assert_eq!(
            plan.validate(),
            Err(PlanValidationError::MissingPlaceholder {
                prompt: PromptKind::CorpusChunk,
                placeholder: "{chunk}",
            })
        );

        let mut plan = valid_plan();
        plan.corpus_executive_prompt = "Synthesize: {chunk}".into();
        assert_eq!(
            plan.validate().unwrap_err().to_string(),
            "corpus_executive_prompt must contain {bullet_summaries} placeholder"
        );
    }

    #[test]
    fn test_empty_document_fails_validation() {
        let plan = ResearchPlanConfig::from_yaml("", "empty").unwrap();
        assert_eq!(plan.validate(), Err(PlanValidationError::EmptyName));
    }

    #[test]
    fn test_corpus_prompts_carry_description() {
        let prompts = valid_plan().corpus_prompts();
        assert_eq!(
            prompts.render_chunk("x"),
            "RESEARCH CONTEXT: Conference talks about Rust\n\nAnalyze: x"
        );
        assert_eq!(valid_plan().video_prompts().render_chunk("x"), "Summarize: x");
    }

    #[tokio::test]
    async fn test_video_list_skips_comments_and_dedupes() {
        let dir = tempfile::tempdir().unwrap();
        let videos = valid_plan().video_list_from(dir.path()).await.unwrap();
        assert_eq!(videos, vec!["https://youtu.be/aaaaaaaaaaa", "bbbbbbbbbbb"]);
    }

    #[tokio::test]
    async fn test_video_list_merges_list_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("videos.txt"),
            "# talks\n\nbbbbbbbbbbb\n  ccccccccccc  \n",
        )
        .unwrap();

        let mut plan = valid_plan();
        plan.video_list_file = Some("videos.txt".into());

        let videos = plan.video_list_from(dir.path()).await.unwrap();
        assert_eq!(
            videos,
            vec!["https://youtu.be/aaaaaaaaaaa", "bbbbbbbbbbb", "ccccccccccc"]
        );
    }

    #[tokio::test]
    async fn test_video_list_file_found_at_project_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("root_videos.txt"), "ddddddddddd\n").unwrap();

        let mut plan = valid_plan();
        plan.video_urls.clear();
        plan.video_list_file = Some("root_videos.txt".into());

        assert_eq!(plan.video_list_from(&nested).await.unwrap(), vec!["ddddddddddd"]);
    }

    #[tokio::test]
    async fn test_missing_list_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut plan = valid_plan();
        plan.video_list_file = Some("nope.txt".into());

        assert!(matches!(
            plan.video_list_from(dir.path()).await,
            Err(PlanError::VideoListNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_read_video_list_rejects_files_without_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("videos.txt");
        std::fs::write(&path, "# only a comment\n\n").unwrap();

        assert!(matches!(read_video_list(&path).await, Err(PlanError::EmptyVideoList(_))));
    }

    #[tokio::test]
    async fn test_plan_store_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = PlanStore::new(dir.path().join("research_plans"));

        assert!(store.list_plans().await.unwrap().is_empty());

        let path = store
            .create_plan_from_template("zeta", "Zeta Plan", "")
            .await
            .unwrap();
        assert!(path.ends_with("zeta.yaml"));
        store
            .create_plan_from_template("al:pha?", "Alpha Plan", "About alpha")
            .await
            .unwrap();

        assert_eq!(store.list_plans().await.unwrap(), vec!["alpha", "zeta"]);
        assert!(matches!(
            store.create_plan_from_template("zeta", "Again", "").await,
            Err(PlanError::AlreadyExists(_))
        ));

        let plan = store.load_plan("zeta").await.unwrap();
        assert_eq!(plan.name, "Zeta Plan");
        assert_eq!(plan.description, "Research plan for focused content extraction");
        assert_eq!(plan.plans_dir.as_deref(), Some(store.plans_dir()));
        // templates ship without videos
        assert_eq!(plan.validate(), Err(PlanValidationError::NoVideoSource));

        assert!(store.plan_exists("zeta").await.unwrap());
        store.delete_plan("zeta").await.unwrap();
        assert!(!store.plan_exists("zeta").await.unwrap());
        assert!(matches!(store.load_plan("zeta").await, Err(PlanError::NotFound(_))));
        assert!(matches!(store.delete_plan("zeta").await, Err(PlanError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_yaml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = PlanStore::new(dir.path());
        std::fs::write(store.plan_path("broken"), "research_plan: [unclosed").unwrap();

        assert!(matches!(store.load_plan("broken").await, Err(PlanError::Parse { .. })));
    }
}
