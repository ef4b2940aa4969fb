use std::sync::Arc;

use tokio::{
    sync::{Mutex, broadcast, mpsc},
    task::JoinHandle,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    pipeline::Pipeline,
    tasks::TaskRegistry,
    types::JobSpec,
    workers::{Job, PipelineWorker},
};

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Job queue is full ({capacity} pending jobs)")]
    QueueFull { capacity: usize },

    #[error("Job queue is closed")]
    Closed,
}

/// Bounded queue in front of a fixed pool of pipeline workers.
pub struct JobQueue {
    sender: mpsc::Sender<Job>,
    registry: TaskRegistry,
    capacity: usize,
    shutdown_tx: broadcast::Sender<()>,
    handles: Vec<JoinHandle<()>>,
}

impl JobQueue {
    pub fn start(
        pipeline: Arc<Pipeline>,
        registry: TaskRegistry,
        workers: usize,
        capacity: usize,
    ) -> Self {
        let workers = workers.max(1);
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel::<Job>(capacity);
        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let inbox = Arc::new(Mutex::new(receiver));

        let handles = (0..workers)
            .map(|id| {
                let worker = PipelineWorker::new(id, Arc::clone(&pipeline), registry.clone());
                tokio::spawn(worker.run(Arc::clone(&inbox), shutdown_tx.subscribe()))
            })
            .collect();
        info!("Started {workers} pipeline workers, queue capacity {capacity}");

        Self {
            sender,
            registry,
            capacity,
            shutdown_tx,
            handles,
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Register a task for `spec` and enqueue it without waiting for a worker.
    /// A rejected submission leaves its task in the error state.
    pub fn submit(&self, spec: JobSpec) -> Result<Uuid, SubmitError> {
        let task_id = self.registry.create();
        let job = Job { task_id, spec };

        match self.sender.try_send(job) {
            Ok(()) => {
                info!("Queued task {task_id}");
                Ok(task_id)
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                let err = SubmitError::QueueFull {
                    capacity: self.capacity,
                };
                warn!("Rejected task {task_id}: {err}");
                self.registry.fail(&task_id, err.to_string());
                Err(err)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.registry.fail(&task_id, SubmitError::Closed.to_string());
                Err(SubmitError::Closed)
            }
        }
    }

    /// Stop idle workers and wait for in-flight jobs to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        drop(self.sender);
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!("Worker ended abnormally: {e}");
            }
        }
    }
}
