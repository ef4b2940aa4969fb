//! Spoiler Core Library
//!
//! Turns a video URL into a short highlight reel: an LLM picks transcript
//! sentences, the video service maps them to time ranges, and a greedy
//! assembler packs them into a duration-bounded timeline.

pub mod assembler;
pub mod audit;
pub mod chunker;
pub mod config;
pub mod error;
pub mod format;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod ranking;
pub mod resolver;
pub mod retry;
pub mod selector;
pub mod tasks;
pub mod types;
pub mod video;
pub mod videodb;
pub mod workers;

pub use assembler::{Assembler, OverlapPolicy};
pub use config::Config;
pub use error::{Result, SpoilerError};
pub use format::{format_output_readable, format_timeline, format_timestamp};
pub use llm::{ChatCompletionsClient, LlmClient};
pub use pipeline::{Pipeline, PipelineObserver, PipelineOutput, Stage};
pub use provider::{Provider, ProviderConfig};
pub use ranking::{Chronological, NarrativeArc, RankingStrategy};
pub use resolver::{FirstMatch, LongestMatch, MatchStrategy};
pub use tasks::{TaskRegistry, TaskSnapshot, TaskStatus};
pub use types::{DurationMode, JobSpec, Segment, TargetDuration, Timeline, VideoHandle};
pub use video::VideoService;
pub use videodb::VideoDbClient;
pub use workers::{JobQueue, SubmitError};
