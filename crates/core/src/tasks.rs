use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    time::{Duration, Instant},
};

use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Uploading,
    Processing,
    Completed,
    Error,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Error)
    }
}

/// Point-in-time view of one task, as served to pollers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSnapshot {
    pub status: TaskStatus,
    pub progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TaskSnapshot {
    fn queued() -> Self {
        Self {
            status: TaskStatus::Queued,
            progress: 0.0,
            stream_url: None,
            message: None,
        }
    }
}

struct TaskEntry {
    snapshot: TaskSnapshot,
    finished_at: Option<Instant>,
}

/// Shared task table. Every write replaces a whole snapshot under the lock,
/// so readers never see a half-updated record.
///
/// Finished tasks stay until [`TaskRegistry::evict_finished`] removes them;
/// the server runs that sweep periodically.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    inner: Arc<RwLock<HashMap<Uuid, TaskEntry>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.inner
            .write()
            .expect("TaskRegistry poisoned")
            .insert(
                id,
                TaskEntry {
                    snapshot: TaskSnapshot::queued(),
                    finished_at: None,
                },
            );
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<TaskSnapshot> {
        self.inner
            .read()
            .expect("TaskRegistry poisoned")
            .get(id)
            .map(|entry| entry.snapshot.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("TaskRegistry poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop tasks that finished at least `age` ago. Returns how many went.
    pub fn evict_finished(&self, age: Duration) -> usize {
        let mut tasks = self.inner.write().expect("TaskRegistry poisoned");
        let before = tasks.len();
        tasks.retain(|_, entry| {
            entry
                .finished_at
                .is_none_or(|finished| finished.elapsed() < age)
        });
        before - tasks.len()
    }

    /// Move a live task to another non-terminal status.
    pub fn set_status(&self, id: &Uuid, status: TaskStatus) {
        debug_assert!(!status.is_terminal());
        self.update(id, |task| task.status = status);
    }

    /// Raise progress; lower values are ignored.
    pub fn set_progress(&self, id: &Uuid, progress: f64) {
        self.update(id, |task| {
            let progress = progress.clamp(0.0, 100.0);
            if progress > task.progress {
                task.progress = progress;
            }
        });
    }

    pub fn complete(&self, id: &Uuid, stream_url: String) {
        self.update(id, |task| {
            *task = TaskSnapshot {
                status: TaskStatus::Completed,
                progress: 100.0,
                stream_url: Some(stream_url),
                message: None,
            }
        });
    }

    pub fn fail(&self, id: &Uuid, message: String) {
        self.update(id, |task| {
            *task = TaskSnapshot {
                status: TaskStatus::Error,
                progress: task.progress,
                stream_url: None,
                message: Some(message),
            }
        });
    }

    /// Apply `f` to a live task; terminal tasks are frozen.
    fn update(&self, id: &Uuid, f: impl FnOnce(&mut TaskSnapshot)) {
        let mut tasks = self.inner.write().expect("TaskRegistry poisoned");
        if let Some(entry) = tasks.get_mut(id) {
            if !entry.snapshot.status.is_terminal() {
                f(&mut entry.snapshot);
                if entry.snapshot.status.is_terminal() {
                    entry.finished_at = Some(Instant::now());
                }
            }
        }
    }

    /// Progress sink bound to one task.
    pub fn progress_sink(&self, id: Uuid) -> impl FnMut(f64) + Send + 'static {
        let registry = self.clone();
        move |progress| registry.set_progress(&id, progress)
    }
}
