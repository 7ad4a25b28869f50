//! Append-only JSON-lines trial sink.
//!
//! One object per line: every trial record as it completes, then a final
//! line holding the session summary under a `"summary"` key.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::domain::models::{SessionSummary, TrialRecord};
use crate::domain::ports::TrialSink;

pub struct JsonlTrialSink {
    path: PathBuf,
    file: Mutex<fs::File>,
}

#[derive(Serialize)]
struct SummaryLine<'a> {
    summary: &'a SessionSummary,
}

impl JsonlTrialSink {
    /// Open `path` for appending, creating it and its parent directory
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("Failed to open trial log {}", path.display()))?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_line<T: Serialize + Sync>(&self, value: &T) -> Result<()> {
        let mut line = serde_json::to_vec(value).context("Failed to serialize trial log line")?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line)
            .await
            .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl TrialSink for JsonlTrialSink {
    async fn record(&self, record: &TrialRecord) -> Result<()> {
        self.write_line(record).await
    }

    async fn finish(&self, summary: &SessionSummary) -> Result<()> {
        self.write_line(&SummaryLine { summary }).await
    }
}
