pub mod job_queue;
pub mod worker;

pub use job_queue::*;
pub use worker::*;

use uuid::Uuid;

use crate::types::JobSpec;

#[derive(Debug, Clone)]
pub struct Job {
    pub task_id: Uuid,
    pub spec: JobSpec,
}
