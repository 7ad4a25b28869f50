use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::{SessionSummary, TrialRecord};

/// Port for the storage/reporting collaborator that receives trial records
///
/// Records arrive in the order trials complete and are never revised.
#[async_trait]
pub trait TrialSink: Send + Sync {
    /// Persist one completed trial
    async fn record(&self, record: &TrialRecord) -> Result<()>;

    /// Persist the end-of-session summary
    async fn finish(&self, _summary: &SessionSummary) -> Result<()> {
        Ok(())
    }
}
