//! # Parser
//!
//! Small text parsers shared by the pipeline: video references, title slugs and
//! markdown frontmatter.

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;

use crate::error::ReferenceError;

static VIDEO_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:watch\?v=|youtu\.be/|embed/)([A-Za-z0-9_-]{11})").unwrap());

static BARE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap());

static SLUG_STRIP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());

static SLUG_COLLAPSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-\s]+").unwrap());

const SLUG_MAX_LEN: usize = 50;
const FRONTMATTER_DELIMITER: &str = "---";

/// Canonical 11 character YouTube video id
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VideoId(String);

impl VideoId {
    /// Extracts the id from a watch, short-link or embed URL, or accepts a bare id.
    ///
    /// # Examples
    /// ```
    /// use caption_digest::parser::VideoId;
    ///
    /// let id = VideoId::parse("https://youtu.be/dQw4w9WgXcQ?t=42").unwrap();
    /// assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    /// ```
    pub fn parse(reference: &str) -> Result<Self, ReferenceError> {
        let cleaned = reference.trim();
        if cleaned.is_empty() {
            return Err(ReferenceError::Empty);
        }

        if let Some(id) = VIDEO_URL_RE.captures(cleaned).and_then(|c| c.get(1)) {
            return Ok(VideoId(id.as_str().to_string()));
        }

        if BARE_ID_RE.is_match(cleaned) {
            return Ok(VideoId(cleaned.to_string()));
        }

        Err(ReferenceError::Unrecognized(reference.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }

    pub fn short_url(&self) -> String {
        format!("https://youtu.be/{}", self.0)
    }
}

impl FromStr for VideoId {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VideoId::parse(s)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lowercased, hyphen separated, filesystem safe form of `text`, at most 50 chars.
///
/// Falls back to `untitled` when nothing survives.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = SLUG_STRIP_RE.replace_all(&lowered, "");
    let collapsed = SLUG_COLLAPSE_RE.replace_all(&stripped, "-");
    let mut slug = collapsed.trim_matches('-').to_string();

    if slug.chars().count() > SLUG_MAX_LEN {
        slug = slug.chars().take(SLUG_MAX_LEN).collect::<String>();
        slug.truncate(slug.trim_end_matches('-').len());
    }

    if slug.is_empty() {
        return "untitled".into();
    }
    slug
}

/// Drops a leading `---` delimited frontmatter block.
///
/// Content without a closed block is returned unchanged.
pub fn strip_frontmatter(content: &str) -> &str {
    let mut lines = content.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return content;
    };
    if first.trim() != FRONTMATTER_DELIMITER {
        return content;
    }

    let mut offset = first.len();
    for line in lines {
        offset += line.len();
        if line.trim() == FRONTMATTER_DELIMITER {
            return &content[offset..];
        }
    }
    content
}
