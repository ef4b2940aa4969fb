use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    assembler::Assembler,
    audit::AuditLog,
    chunker::chunk_transcript,
    config::Config,
    error::{Result, SpoilerError},
    llm::LlmClient,
    prompt::{full_prompt, load_base_prompt},
    resolver::{MatchStrategy, ResolverOptions, resolve_segments},
    retry::{retry, with_timeout},
    selector::{SelectorOptions, select_sentences},
    tasks::{TaskRegistry, TaskStatus},
    types::{JobSpec, Timeline, TimelineClip, VideoHandle},
    video::VideoService,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Uploading,
    Indexing,
    Selecting,
    Resolving,
    Assembling,
    Rendering,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Uploading => "Uploading video",
            Stage::Indexing => "Indexing spoken words",
            Stage::Selecting => "Selecting sentences",
            Stage::Resolving => "Resolving segments",
            Stage::Assembling => "Assembling timeline",
            Stage::Rendering => "Rendering stream",
        }
    }
}

/// Receives stage transitions and timeline fill progress of one run.
pub trait PipelineObserver: Send {
    fn stage(&mut self, stage: Stage);
    fn progress(&mut self, percent: f64);
}

/// Mirrors a run into the task registry.
pub struct TaskObserver {
    registry: TaskRegistry,
    task_id: uuid::Uuid,
}

impl TaskObserver {
    pub fn new(registry: TaskRegistry, task_id: uuid::Uuid) -> Self {
        Self { registry, task_id }
    }
}

impl PipelineObserver for TaskObserver {
    fn stage(&mut self, stage: Stage) {
        let status = match stage {
            Stage::Uploading | Stage::Indexing => TaskStatus::Uploading,
            _ => TaskStatus::Processing,
        };
        self.registry.set_status(&self.task_id, status);
    }

    fn progress(&mut self, percent: f64) {
        self.registry.set_progress(&self.task_id, percent);
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub video: VideoHandle,
    pub prompt: String,
    pub timeline: Timeline,
    pub stream_url: String,
}

/// Upload → select → resolve → assemble → render, for one job at a time.
pub struct Pipeline {
    video_service: Arc<dyn VideoService>,
    llm: Arc<dyn LlmClient>,
    config: Config,
    assembler: Assembler,
    match_strategy: Box<dyn MatchStrategy>,
    audit: Option<AuditLog>,
}

impl Pipeline {
    pub fn new(
        video_service: Arc<dyn VideoService>,
        llm: Arc<dyn LlmClient>,
        config: Config,
    ) -> Self {
        let assembler = Assembler::from_config(&config.assembly);
        let match_strategy = config.assembly.match_strategy.strategy();
        let audit = config.audit.csv_path.clone().map(AuditLog::new);
        Self {
            video_service,
            llm,
            config,
            assembler,
            match_strategy,
            audit,
        }
    }

    pub fn with_assembler(mut self, assembler: Assembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_match_strategy(mut self, strategy: Box<dyn MatchStrategy>) -> Self {
        self.match_strategy = strategy;
        self
    }

    pub async fn run(
        &self,
        job: &JobSpec,
        observer: &mut dyn PipelineObserver,
    ) -> Result<PipelineOutput> {
        let base_prompt = load_base_prompt(&self.config.prompt).await?;
        let prompt = full_prompt(&base_prompt, job);
        let video_timeout = self.config.video.timeout_secs;

        observer.stage(Stage::Uploading);
        let video = with_timeout(
            "upload",
            video_timeout,
            self.video_service.upload(&job.video_url),
        )
        .await
        .map_err(|e| match e {
            SpoilerError::UploadFailed { .. } => e,
            other => SpoilerError::UploadFailed {
                url: job.video_url.clone(),
                reason: other.to_string(),
            },
        })?;

        observer.stage(Stage::Indexing);
        with_timeout(
            "indexing",
            video_timeout,
            self.video_service.index_spoken_words(&video),
        )
        .await
        .map_err(|e| match e {
            SpoilerError::IndexingFailed { .. } => e,
            other => SpoilerError::IndexingFailed {
                video_id: video.id.clone(),
                reason: other.to_string(),
            },
        })?;

        let transcript = retry(self.config.retry, || {
            with_timeout(
                "transcript",
                video_timeout,
                self.video_service.transcript_text(&video),
            )
        })
        .await?;
        info!("Transcript for {} has {} chars", video.id, transcript.len());

        observer.stage(Stage::Selecting);
        let llm_config = &self.config.llm;
        let chunks = chunk_transcript(&transcript, llm_config.chunk_size, llm_config.chunk_unit)?;
        let sentences = select_sentences(
            Arc::clone(&self.llm),
            &chunks,
            &prompt,
            SelectorOptions {
                concurrency: llm_config.concurrency,
                timeout_secs: llm_config.timeout_secs,
                retry: self.config.retry,
            },
        )
        .await;
        info!(
            "Text prompter found {} sentences in {} chunks",
            sentences.len(),
            chunks.len()
        );

        observer.stage(Stage::Resolving);
        let segments = resolve_segments(
            self.video_service.as_ref(),
            &video,
            &sentences,
            self.match_strategy.as_ref(),
            ResolverOptions {
                timeout_secs: video_timeout,
                retry: self.config.retry,
            },
        )
        .await;

        observer.stage(Stage::Assembling);
        let timeline = self.assembler.assemble(
            segments,
            job.target,
            video.length,
            &mut |percent| observer.progress(percent),
        )?;

        observer.stage(Stage::Rendering);
        let clips: Vec<TimelineClip> = timeline
            .segments
            .iter()
            .map(|s| TimelineClip {
                video_id: video.id.clone(),
                start: s.start(),
                end: s.end(),
            })
            .collect();
        let stream_url = with_timeout(
            "render",
            video_timeout,
            self.video_service.render_timeline(&clips),
        )
        .await
        .map_err(|e| match e {
            SpoilerError::RenderFailed { .. } => e,
            other => SpoilerError::RenderFailed {
                reason: other.to_string(),
            },
        })?;
        info!("Stream ready for {}: {stream_url}", job.video_url);

        if let Some(audit) = &self.audit {
            if let Err(e) = audit.append(&job.video_url, &prompt, &stream_url).await {
                warn!("Failed to write audit record: {e}");
            }
        }

        Ok(PipelineOutput {
            video,
            prompt,
            timeline,
            stream_url,
        })
    }

    /// Run a job and record the outcome in the task registry.
    pub async fn run_task(&self, job: &JobSpec, registry: &TaskRegistry, task_id: uuid::Uuid) {
        let mut observer = TaskObserver::new(registry.clone(), task_id);
        match self.run(job, &mut observer).await {
            Ok(output) => registry.complete(&task_id, output.stream_url),
            Err(e) => {
                warn!("Task {task_id} failed: {e}");
                registry.fail(&task_id, e.to_string());
            }
        }
    }
}
