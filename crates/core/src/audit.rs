use std::path::{Path, PathBuf};

use tokio::{fs::OpenOptions, io::AsyncWriteExt, sync::Mutex};
use tracing::info;

use crate::error::Result;

const HEADER: [&str; 3] = ["Video URL", "Prompt", "Stream Link"];

/// Append-only CSV record of successful jobs.
pub struct AuditLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, video_url: &str, prompt: &str, stream_url: &str) -> Result<()> {
        let _guard = self.lock.lock().await;

        let mut out = String::new();
        if !tokio::fs::try_exists(&self.path).await? {
            out.push_str(&csv_row(&HEADER));
        }
        out.push_str(&csv_row(&[video_url, prompt, stream_url]));

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(out.as_bytes()).await?;
        file.flush().await?;

        info!("Results saved to {}", self.path.display());
        Ok(())
    }
}

fn csv_row(fields: &[&str]) -> String {
    let mut row = fields
        .iter()
        .map(|f| csv_field(f))
        .collect::<Vec<_>>()
        .join(",");
    row.push_str("\r\n");
    row
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
