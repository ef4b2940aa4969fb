use std::sync::Arc;

use tokio::sync::{Mutex, broadcast, mpsc};
use tracing::{debug, info};

use crate::{pipeline::Pipeline, tasks::TaskRegistry, workers::Job};

/// Shared receiving end of the job queue.
pub type JobInbox = Arc<Mutex<mpsc::Receiver<Job>>>;

/// One pipeline worker. Jobs are taken from the shared inbox one at a time
/// and run to completion before the next is taken.
pub struct PipelineWorker {
    pub id: usize,
    pipeline: Arc<Pipeline>,
    registry: TaskRegistry,
}

impl PipelineWorker {
    pub fn new(id: usize, pipeline: Arc<Pipeline>, registry: TaskRegistry) -> Self {
        Self {
            id,
            pipeline,
            registry,
        }
    }

    async fn handle(&mut self, job: Job) {
        info!("Worker {} picked up task {}", self.id, job.task_id);
        self.pipeline
            .run_task(&job.spec, &self.registry, job.task_id)
            .await;
    }

    pub async fn run(mut self, inbox: JobInbox, mut shutdown: broadcast::Receiver<()>) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    debug!("Worker {} shutting down", self.id);
                    return;
                }
                job = next_job(&inbox) => match job {
                    Some(job) => self.handle(job).await,
                    None => {
                        debug!("Worker {} inbox closed", self.id);
                        return;
                    }
                },
            }
        }
    }
}

async fn next_job(inbox: &JobInbox) -> Option<Job> {
    inbox.lock().await.recv().await
}
