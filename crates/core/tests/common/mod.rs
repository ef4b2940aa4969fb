#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use spoiler_core::{
    Config, LlmClient, Pipeline, Result, SpoilerError, TargetDuration, VideoHandle, VideoService,
    types::{JobSpec, TimelineClip},
};

/// In-memory video service keyed by exact search query.
#[derive(Default)]
pub struct FakeVideo {
    pub transcript: String,
    pub length: Option<f64>,
    pub matches: HashMap<String, Vec<(f64, f64)>>,
    pub failing_searches: Vec<String>,
    pub fail_upload: bool,
    pub fail_render: bool,
    pub upload_delay: Option<Duration>,
    pub rendered: Mutex<Vec<Vec<TimelineClip>>>,
    pub searches: Mutex<Vec<String>>,
}

impl FakeVideo {
    pub fn new(transcript: &str) -> Self {
        Self {
            transcript: transcript.to_string(),
            ..Default::default()
        }
    }

    pub fn with_match(mut self, query: &str, shots: &[(f64, f64)]) -> Self {
        self.matches.insert(query.to_string(), shots.to_vec());
        self
    }

    pub fn rendered(&self) -> Vec<Vec<TimelineClip>> {
        self.rendered.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoService for FakeVideo {
    async fn upload(&self, url: &str) -> Result<VideoHandle> {
        if let Some(delay) = self.upload_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_upload {
            return Err(SpoilerError::UploadFailed {
                url: url.to_string(),
                reason: "unreachable".to_string(),
            });
        }
        Ok(VideoHandle {
            id: "m-1".to_string(),
            source_url: url.to_string(),
            length: self.length,
        })
    }

    async fn index_spoken_words(&self, _video: &VideoHandle) -> Result<()> {
        Ok(())
    }

    async fn transcript_text(&self, _video: &VideoHandle) -> Result<String> {
        Ok(self.transcript.clone())
    }

    async fn search(&self, _video: &VideoHandle, query: &str) -> Result<Vec<(f64, f64)>> {
        self.searches.lock().unwrap().push(query.to_string());
        if self.failing_searches.iter().any(|q| q == query) {
            return Err(SpoilerError::Search {
                query: query.to_string(),
                reason: "index unavailable".to_string(),
            });
        }
        Ok(self.matches.get(query).cloned().unwrap_or_default())
    }

    async fn render_timeline(&self, clips: &[TimelineClip]) -> Result<String> {
        if self.fail_render {
            return Err(SpoilerError::RenderFailed {
                reason: "compile error".to_string(),
            });
        }
        let mut rendered = self.rendered.lock().unwrap();
        rendered.push(clips.to_vec());
        Ok(format!("https://stream.example/{}.m3u8", rendered.len()))
    }
}

type Reply = Box<dyn Fn(&str) -> Result<String> + Send + Sync>;

/// LLM that answers from a closure over the chunk prompt.
pub struct FakeLlm {
    reply: Reply,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeLlm {
    pub fn new(reply: impl Fn(&str) -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            reply: Box::new(reply),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn constant(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::new(move |_| Ok(reply.clone()))
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for FakeLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.reply)(prompt)
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.audit.csv_path = None;
    config.retry = spoiler_core::retry::RetryPolicy::none();
    config
}

pub fn job(target: TargetDuration) -> JobSpec {
    JobSpec {
        video_url: "https://example.com/heist.mp4".to_string(),
        title: "The Heist".to_string(),
        genres: vec!["Thriller".to_string()],
        target,
    }
}

pub fn pipeline(video: Arc<FakeVideo>, llm: Arc<FakeLlm>, config: Config) -> Pipeline {
    Pipeline::new(video, llm, config)
}
