//! In-memory trial sink for testing and for callers that post-process the log.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::models::{SessionSummary, TrialRecord};
use crate::domain::ports::TrialSink;

#[derive(Debug, Clone, Default)]
pub struct MemoryTrialSink {
    records: Arc<RwLock<Vec<TrialRecord>>>,
    summary: Arc<RwLock<Option<SessionSummary>>>,
}

impl MemoryTrialSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records received so far
    pub async fn records(&self) -> Vec<TrialRecord> {
        self.records.read().await.clone()
    }

    /// Summary, once the session has finished
    pub async fn summary(&self) -> Option<SessionSummary> {
        self.summary.read().await.clone()
    }
}

#[async_trait]
impl TrialSink for MemoryTrialSink {
    async fn record(&self, record: &TrialRecord) -> Result<()> {
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn finish(&self, summary: &SessionSummary) -> Result<()> {
        *self.summary.write().await = Some(summary.clone());
        Ok(())
    }
}
