pub mod captions;
pub mod fetcher;
pub mod oembed;
pub mod rate_limiter;

use std::future::Future;

use crate::{error::CaptionError, parser::VideoId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    /// Uploaded by the channel
    Manual,
    /// Speech recognition output
    Generated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrack {
    pub language_code: String,
    pub kind: TrackKind,
    pub url: String,
}

impl CaptionTrack {
    pub fn is_english(&self) -> bool {
        self.language_code == "en" || self.language_code.starts_with("en-")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptionSnippet {
    pub text: String,
    /// Seconds from the start of the video
    pub start: f64,
    pub duration: f64,
}

/// Source of caption tracks for a video.
///
/// `list_tracks` returns manual tracks before generated ones. An empty list, or
/// [`CaptionError::NoCaptions`], means the video has no captions at all.
pub trait CaptionSource {
    fn list_tracks(
        &self,
        video_id: &VideoId,
    ) -> impl Future<Output = Result<Vec<CaptionTrack>, CaptionError>> + Send;

    fn fetch_track(
        &self,
        track: &CaptionTrack,
    ) -> impl Future<Output = Result<Vec<CaptionSnippet>, CaptionError>> + Send;
}

impl<T: CaptionSource + Send + Sync> CaptionSource for &T {
    async fn list_tracks(&self, video_id: &VideoId) -> Result<Vec<CaptionTrack>, CaptionError> {
        (**self).list_tracks(video_id).await
    }

    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<CaptionSnippet>, CaptionError> {
        (**self).fetch_track(track).await
    }
}

/// Resolves a display title, falling back to the id itself
pub trait TitleLookup {
    fn lookup_title(&self, video_id: &VideoId) -> impl Future<Output = String> + Send;
}

impl<T: TitleLookup + Send + Sync> TitleLookup for &T {
    async fn lookup_title(&self, video_id: &VideoId) -> String {
        (**self).lookup_title(video_id).await
    }
}

/// Picks manual English, then generated English, then the first track listed
pub fn select_track(tracks: &[CaptionTrack]) -> Option<&CaptionTrack> {
    tracks
        .iter()
        .find(|t| t.kind == TrackKind::Manual && t.is_english())
        .or_else(|| {
            tracks
                .iter()
                .find(|t| t.kind == TrackKind::Generated && t.is_english())
        })
        .or_else(|| tracks.first())
}

/// One line per snippet
pub fn render_snippets(snippets: &[CaptionSnippet]) -> String {
    snippets
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
