use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use caption_digest::{
    yt::{CaptionSnippet, CaptionSource, CaptionTrack, TrackKind},
    CaptionError, VideoId,
};

/// Serves one English track per known video; unknown videos have no captions
#[derive(Clone, Default)]
pub struct MockCaptionSource {
    pub transcripts: HashMap<String, String>,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
}

impl MockCaptionSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transcript(mut self, video_id: &str, text: &str) -> Self {
        self.transcripts
            .insert(video_id.to_string(), text.to_string());
        self
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl CaptionSource for MockCaptionSource {
    async fn list_tracks(&self, video_id: &VideoId) -> Result<Vec<CaptionTrack>, CaptionError> {
        self.calls.lock().unwrap().push(video_id.to_string());
        if let Some(ref msg) = self.fail_with {
            return Err(CaptionError::Other(msg.clone()));
        }

        if !self.transcripts.contains_key(video_id.as_str()) {
            return Ok(Vec::new());
        }
        Ok(vec![CaptionTrack {
            language_code: "en".into(),
            kind: TrackKind::Manual,
            url: video_id.to_string(),
        }])
    }

    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<CaptionSnippet>, CaptionError> {
        let text = self
            .transcripts
            .get(&track.url)
            .ok_or_else(|| CaptionError::Malformed("unknown track".into()))?;

        Ok(text
            .lines()
            .enumerate()
            .map(|(i, line)| CaptionSnippet {
                text: line.to_string(),
                start: i as f64,
                duration: 1.0,
            })
            .collect())
    }
}
