use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use caption_digest::{yt::TitleLookup, VideoId};

#[derive(Clone, Default)]
pub struct MockTitleLookup {
    pub titles: HashMap<String, String>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockTitleLookup {
    pub fn new(titles: &[(&str, &str)]) -> Self {
        Self {
            titles: titles
                .iter()
                .map(|(id, title)| (id.to_string(), title.to_string()))
                .collect(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl TitleLookup for MockTitleLookup {
    async fn lookup_title(&self, video_id: &VideoId) -> String {
        self.calls.lock().unwrap().push(video_id.to_string());
        self.titles
            .get(video_id.as_str())
            .cloned()
            .unwrap_or_else(|| video_id.to_string())
    }
}
