use std::{collections::BTreeMap, time::Duration};

use reqwest::Url;
use serde::Deserialize;
use tokio::process::Command;

use crate::{
    error::CaptionError,
    parser::VideoId,
    yt::{CaptionSnippet, CaptionSource, CaptionTrack, TrackKind},
};

const CAPTION_FORMAT: &str = "json3";

/// Lists caption tracks through `yt-dlp` metadata and downloads them over HTTP
#[derive(Debug, Clone)]
pub struct YtDlpCaptionSource {
    binary: String,
    http_client: reqwest::Client,
}

impl YtDlpCaptionSource {
    pub fn new(timeout: Duration) -> Result<Self, CaptionError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CaptionError::Other(e.to_string()))?;

        Ok(Self {
            binary: "yt-dlp".into(),
            http_client,
        })
    }

    /// Overrides the `yt-dlp` executable
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    #[tracing::instrument(skip(self))]
    async fn video_metadata(&self, video_id: &VideoId) -> Result<VideoMetadata, CaptionError> {
        let output = Command::new(&self.binary)
            .arg("-J")
            .arg("--skip-download")
            .arg("--no-warnings")
            .arg(video_id.watch_url())
            .output()
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to run yt-dlp"))
            .map_err(|e| CaptionError::Other(format!("Failed to run {}: {e}", self.binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(CaptionError::Other(stderr));
        }

        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Err(CaptionError::Malformed("yt-dlp returned no metadata".into()));
        }

        serde_json::from_slice::<VideoMetadata>(&output.stdout)
            .map_err(|e| CaptionError::Malformed(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct VideoMetadata {
    #[serde(default)]
    subtitles: BTreeMap<String, Vec<SubtitleFormat>>,
    #[serde(default)]
    automatic_captions: BTreeMap<String, Vec<SubtitleFormat>>,
}

#[derive(Debug, Deserialize)]
struct SubtitleFormat {
    ext: String,
    url: String,
}

impl VideoMetadata {
    fn into_tracks(self) -> Vec<CaptionTrack> {
        let manual = json3_tracks(self.subtitles, TrackKind::Manual);

        // machine translations carry a `tlang` parameter; keep the spoken-language track
        let generated = json3_tracks(self.automatic_captions, TrackKind::Generated);
        let (original, translated): (Vec<_>, Vec<_>) = generated
            .into_iter()
            .partition(|t| !t.url.contains("tlang="));
        let generated = if original.is_empty() {
            translated
        } else {
            original
        };

        manual.into_iter().chain(generated).collect()
    }
}

fn json3_tracks(
    formats: BTreeMap<String, Vec<SubtitleFormat>>,
    kind: TrackKind,
) -> Vec<CaptionTrack> {
    formats
        .into_iter()
        .filter(|(language, _)| language != "live_chat")
        .filter_map(|(language, formats)| {
            formats
                .into_iter()
                .find(|f| f.ext == CAPTION_FORMAT)
                .map(|f| CaptionTrack {
                    language_code: language.trim_end_matches("-orig").to_string(),
                    kind,
                    url: f.url,
                })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct Json3Document {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs", default)]
    start_ms: u64,
    #[serde(rename = "dDurationMs", default)]
    duration_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Segment>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Parses a `json3` caption body into snippets, dropping empty events
fn parse_json3(body: &str) -> Result<Vec<CaptionSnippet>, CaptionError> {
    if body.trim().is_empty() {
        return Err(CaptionError::Malformed("empty caption body".into()));
    }

    let document = serde_json::from_str::<Json3Document>(body)
        .map_err(|e| CaptionError::Malformed(e.to_string()))?;

    let snippets = document
        .events
        .into_iter()
        .filter_map(|event| {
            let text = event
                .segs
                .iter()
                .map(|s| s.utf8.as_str())
                .collect::<String>()
                .trim()
                .to_string();
            (!text.is_empty()).then(|| CaptionSnippet {
                text,
                start: event.start_ms as f64 / 1000.0,
                duration: event.duration_ms as f64 / 1000.0,
            })
        })
        .collect();

    Ok(snippets)
}

/// Forces the `json3` format onto a track url, replacing any other `fmt`
fn caption_download_url(raw: &str) -> Result<Url, CaptionError> {
    let mut url = Url::parse(raw)
        .map_err(|e| CaptionError::Other(format!("invalid caption url {raw:?}: {e}")))?;

    let pairs = url
        .query_pairs()
        .filter(|(key, _)| key != "fmt")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect::<Vec<_>>();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("fmt", CAPTION_FORMAT);

    Ok(url)
}

impl CaptionSource for YtDlpCaptionSource {
    async fn list_tracks(&self, video_id: &VideoId) -> Result<Vec<CaptionTrack>, CaptionError> {
        let tracks = self.video_metadata(video_id).await?.into_tracks();
        tracing::debug!(video_id = %video_id, count = tracks.len(), "Listed caption tracks");

        if tracks.is_empty() {
            return Err(CaptionError::NoCaptions);
        }
        Ok(tracks)
    }

    #[tracing::instrument(skip(self), fields(language = %track.language_code))]
    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<CaptionSnippet>, CaptionError> {
        let url = caption_download_url(&track.url)?;

        let resp = self
            .http_client
            .get(url)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))
            .map_err(|e| CaptionError::Other(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            return Err(CaptionError::Other(format!(
                "caption download failed with status {status}"
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| CaptionError::Malformed(e.to_string()))?;

        parse_json3(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json3() {
        let body = r#"{
            "events": [
                {"tStartMs": 0, "dDurationMs": 1500, "segs": [{"utf8": "hello "}, {"utf8": "there"}]},
                {"tStartMs": 1500, "dDurationMs": 10, "segs": [{"utf8": "\n"}]},
                {"tStartMs": 1600},
                {"tStartMs": 2000, "dDurationMs": 900, "segs": [{"utf8": "general kenobi"}]}
            ]
        }"#;

        let snippets = parse_json3(body).unwrap();
        assert_eq!(snippets.len(), 2);
        assert_eq!(snippets[0].text, "hello there");
        assert_eq!(snippets[0].duration, 1.5);
        assert_eq!(snippets[1].start, 2.0);
    }

    #[test]
    fn test_parse_json3_rejects_garbage_as_malformed() {
        assert!(matches!(parse_json3(""), Err(CaptionError::Malformed(_))));
        assert!(matches!(
            parse_json3("<?xml version"),
            Err(CaptionError::Malformed(_))
        ));
    }

    #[test]
    fn test_metadata_orders_manual_before_generated() {
        let json = serde_json::json!({
            "subtitles": {
                "en": [{"ext": "vtt", "url": "https://s/en.vtt"}, {"ext": "json3", "url": "https://s/en?fmt=json3"}],
                "live_chat": [{"ext": "json3", "url": "https://s/chat"}]
            },
            "automatic_captions": {
                "de": [{"ext": "json3", "url": "https://a/x?lang=en&tlang=de&fmt=json3"}],
                "en-orig": [{"ext": "json3", "url": "https://a/x?lang=en&fmt=json3"}]
            }
        });

        let tracks = serde_json::from_value::<VideoMetadata>(json)
            .unwrap()
            .into_tracks();

        assert_eq!(
            tracks,
            vec![
                CaptionTrack {
                    language_code: "en".into(),
                    kind: TrackKind::Manual,
                    url: "https://s/en?fmt=json3".into(),
                },
                CaptionTrack {
                    language_code: "en".into(),
                    kind: TrackKind::Generated,
                    url: "https://a/x?lang=en&fmt=json3".into(),
                },
            ]
        );
    }

    #[test]
    fn test_caption_download_url_sets_format() {
        let url = caption_download_url("https://s/api/timedtext?v=abc&lang=en").unwrap();
        assert_eq!(url.as_str(), "https://s/api/timedtext?v=abc&lang=en&fmt=json3");

        let url = caption_download_url("https://s/api/timedtext").unwrap();
        assert_eq!(url.as_str(), "https://s/api/timedtext?fmt=json3");

        let url = caption_download_url("https://s/x?fmt=vtt&lang=en").unwrap();
        assert_eq!(url.as_str(), "https://s/x?lang=en&fmt=json3");
    }

    #[test]
    fn test_caption_download_url_rejects_relative_urls() {
        assert!(matches!(
            caption_download_url("/api/timedtext?v=abc"),
            Err(CaptionError::Other(_))
        ));
    }

    #[test]
    fn test_metadata_without_captions_has_no_tracks() {
        let metadata = serde_json::from_str::<VideoMetadata>(r#"{"id": "x"}"#).unwrap();
        assert!(metadata.into_tracks().is_empty());
    }
}
