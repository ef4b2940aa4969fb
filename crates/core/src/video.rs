use async_trait::async_trait;

use crate::{
    error::Result,
    types::{TimelineClip, VideoHandle},
};

/// Hosting, indexing, search and rendering for source videos.
#[async_trait]
pub trait VideoService: Send + Sync {
    async fn upload(&self, url: &str) -> Result<VideoHandle>;

    /// Build the spoken-word index `search` runs against.
    async fn index_spoken_words(&self, video: &VideoHandle) -> Result<()>;

    async fn transcript_text(&self, video: &VideoHandle) -> Result<String>;

    /// Keyword matches as `(start, end)` seconds. No match is `Ok(vec![])`.
    async fn search(&self, video: &VideoHandle, query: &str) -> Result<Vec<(f64, f64)>>;

    /// Compile the clips into one playable stream and return its URL.
    async fn render_timeline(&self, clips: &[TimelineClip]) -> Result<String>;
}
