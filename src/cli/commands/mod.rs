//! CLI command implementations.

pub mod config;
pub mod run;
pub mod simulate;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use crate::adapters::sinks::{JsonlTrialSink, MemoryTrialSink};
use crate::domain::ports::TrialSink;

/// JSON-lines sink when a path is given, otherwise an in-memory one
pub(crate) async fn open_sink(trial_log: Option<&Path>) -> Result<Arc<dyn TrialSink>> {
    Ok(match trial_log {
        Some(path) => Arc::new(JsonlTrialSink::open(path).await?),
        None => Arc::new(MemoryTrialSink::new()),
    })
}
