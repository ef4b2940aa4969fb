use std::path::PathBuf;
use thiserror::Error;

use crate::provider::ProviderError;

#[derive(Error, Debug)]
pub enum SpoilerError {
    #[error("Upload failed for {url}: {reason}")]
    UploadFailed { url: String, reason: String },

    #[error("Spoken-word indexing failed for video {video_id}: {reason}")]
    IndexingFailed { video_id: String, reason: String },

    #[error("Base prompt is not configured: {reason}")]
    MissingBasePrompt { reason: String },

    #[error("Chunk size must be greater than zero")]
    InvalidChunkSize,

    #[error("Invalid segment [{start}, {end}]: {reason}")]
    InvalidSegment { start: f64, end: f64, reason: String },

    #[error("Invalid target duration {value}: {reason}")]
    InvalidTarget { value: f64, reason: String },

    #[error("No segments fit into the timeline ({candidates} candidates considered)")]
    NoSegmentsAssembled { candidates: usize },

    #[error("Stream rendering failed: {reason}")]
    RenderFailed { reason: String },

    #[error("LLM request failed: {reason}")]
    Llm { reason: String },

    #[error("Search failed for {query:?}: {reason}")]
    Search { query: String, reason: String },

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: &'static str, secs: u64 },

    #[error("Config error in {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, SpoilerError>;
