//! Markdown rendering for per-video summaries, corpus documents and corpus analyses.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::parser::VideoId;

pub const VIDEO_SECTION_MARKER: &str = "## Video Summary:";
const CORPUS_SEPARATOR: &str = "\n\n---\n\n";

pub struct VideoDocument<'a> {
    pub video_id: &'a VideoId,
    pub title: &'a str,
    pub slug: &'a str,
    pub model: &'a str,
    pub executive: &'a str,
    pub sections: &'a [String],
    pub saved_at: DateTime<Utc>,
}

pub fn render_video_markdown(doc: &VideoDocument<'_>) -> String {
    let mut out = format!(
        "---\nvideo_id: {id}\nurl: {url}\ntitle: \"{title}\"\nslug: \"{slug}\"\nsaved: {saved}\nmodel: {model}\nchunk_count: {count}\ntags: [youtube, transcript]\n---",
        id = doc.video_id,
        url = doc.video_id.short_url(),
        title = doc.title.replace('"', "\\\""),
        slug = doc.slug,
        saved = doc.saved_at.format("%Y-%m-%dT%H:%M:%SZ"),
        model = doc.model,
        count = doc.sections.len(),
    );

    out.push_str(&format!("\n\n## Executive Summary\n\n{}", doc.executive));

    if !doc.sections.is_empty() {
        out.push_str("\n\n## Part Summaries\n");
        for (i, summary) in doc.sections.iter().enumerate() {
            out.push_str(&format!("\n### Part {}\n\n{summary}\n", i + 1));
        }
    }

    out
}

/// `## Video Summary: <stem>` followed by the body
pub fn render_corpus_section(stem: &str, body: &str) -> String {
    format!("{VIDEO_SECTION_MARKER} {stem}\n\n{}", body.trim())
}

pub fn join_corpus_sections(sections: &[String]) -> String {
    sections.join(CORPUS_SEPARATOR)
}

pub struct CorpusDocument<'a> {
    pub plan_name: &'a str,
    pub plan_id: &'a str,
    pub description: &'a str,
    pub created_at: DateTime<Utc>,
    pub video_files: &'a [String],
    pub body: &'a str,
}

pub fn render_corpus_markdown(doc: &CorpusDocument<'_>) -> String {
    let mut lines = vec![
        "---".to_string(),
        format!("research_plan: {}", doc.plan_name),
        format!("plan_id: {}", doc.plan_id),
        format!(
            "created: {}",
            doc.created_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ),
        format!("video_count: {}", doc.video_files.len()),
        "video_files:".to_string(),
    ];
    lines.extend(doc.video_files.iter().map(|name| format!("  - {name}")));
    lines.push(format!("description: {}", doc.description));
    lines.push("---".to_string());
    lines.push(String::new());

    format!(
        "{}\n# Research Corpus: {}\n\n{}",
        lines.join("\n"),
        doc.plan_name,
        doc.body
    )
}

pub struct AnalysisDocument<'a> {
    pub plan_name: &'a str,
    pub plan_id: &'a str,
    pub model: &'a str,
    pub created_at: DateTime<Utc>,
    pub executive: &'a str,
    pub sections: &'a [String],
}

pub fn render_analysis_markdown(doc: &AnalysisDocument<'_>) -> String {
    let frontmatter = [
        "---".to_string(),
        format!("research_plan: {}", doc.plan_name),
        format!("plan_id: {}", doc.plan_id),
        format!(
            "analysis_created: {}",
            doc.created_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ),
        format!("model: {}", doc.model),
        format!("chunk_count: {}", doc.sections.len()),
        format!(
            "description: Comprehensive analysis of {} research corpus",
            doc.plan_name
        ),
        "---".to_string(),
        String::new(),
    ];

    let mut content = vec![
        format!("# Corpus Analysis: {}", doc.plan_name),
        String::new(),
        "## Executive Analysis".to_string(),
        String::new(),
        doc.executive.to_string(),
        String::new(),
        "## Detailed Analysis Sections".to_string(),
        String::new(),
    ];
    for (i, analysis) in doc.sections.iter().enumerate() {
        content.push(format!("### Analysis Section {}", i + 1));
        content.push(String::new());
        content.push(analysis.clone());
        content.push(String::new());
    }

    frontmatter.join("\n") + &content.join("\n")
}

/// Number of per-video sections in a corpus document
pub fn count_video_sections(corpus: &str) -> usize {
    corpus.matches(VIDEO_SECTION_MARKER).count()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::parser::strip_frontmatter;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_video_markdown_layout() {
        let id = VideoId::parse("dQw4w9WgXcQ").unwrap();
        let sections = vec!["first".to_string(), "second".to_string()];
        let md = render_video_markdown(&VideoDocument {
            video_id: &id,
            title: "A \"quoted\" title",
            slug: "a-quoted-title",
            model: "llama3.2:latest",
            executive: "overall",
            sections: &sections,
            saved_at: at(),
        });

        let expected = "---\n\
video_id: dQw4w9WgXcQ\n\
url: https://youtu.be/dQw4w9WgXcQ\n\
title: \"A \\\"quoted\\\" title\"\n\
slug: \"a-quoted-title\"\n\
saved: 2024-05-01T12:30:00Z\n\
model: llama3.2:latest\n\
chunk_count: 2\n\
tags: [youtube, transcript]\n\
---\n\n\
## Executive Summary\n\n\
overall\n\n\
## Part Summaries\n\
\n### Part 1\n\nfirst\n\
\n### Part 2\n\nsecond\n";
        assert_eq!(md, expected);
    }

    #[test]
    fn test_corpus_markdown_frontmatter() {
        let files = vec!["a_aaaaaaaaaaa.md".to_string(), "b_bbbbbbbbbbb.md".to_string()];
        let body = join_corpus_sections(&[
            render_corpus_section("a_aaaaaaaaaaa", "\nbody a\n"),
            render_corpus_section("b_bbbbbbbbbbb", "body b"),
        ]);
        let md = render_corpus_markdown(&CorpusDocument {
            plan_name: "Rust Talks",
            plan_id: "rust_talks",
            description: "Talks about Rust",
            created_at: at(),
            video_files: &files,
            body: &body,
        });

        assert!(md.starts_with("---\nresearch_plan: Rust Talks\nplan_id: rust_talks\n"));
        assert!(md.contains("video_count: 2\nvideo_files:\n  - a_aaaaaaaaaaa.md\n  - b_bbbbbbbbbbb.md\n"));
        assert!(md.contains("description: Talks about Rust\n---\n\n# Research Corpus: Rust Talks\n\n"));
        assert!(md.contains("## Video Summary: a_aaaaaaaaaaa\n\nbody a\n\n---\n\n## Video Summary: b_bbbbbbbbbbb\n\nbody b"));
        assert_eq!(count_video_sections(&md), 2);

        let stripped = strip_frontmatter(&md);
        assert!(stripped.trim_start().starts_with("# Research Corpus: Rust Talks"));
    }

    #[test]
    fn test_analysis_markdown_layout() {
        let sections = vec!["s1".to_string()];
        let md = render_analysis_markdown(&AnalysisDocument {
            plan_name: "Rust Talks",
            plan_id: "rust_talks",
            model: "m",
            created_at: at(),
            executive: "exec",
            sections: &sections,
        });

        assert!(md.contains("chunk_count: 1\n"));
        assert!(md.contains("description: Comprehensive analysis of Rust Talks research corpus\n---\n# Corpus Analysis: Rust Talks\n"));
        assert!(md.contains("## Executive Analysis\n\nexec\n\n## Detailed Analysis Sections\n\n### Analysis Section 1\n\ns1\n"));
        assert_eq!(md.matches("## Executive Analysis").count(), 1);
    }
}
