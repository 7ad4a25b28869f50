//! Implementation of the `titrate run` command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use crate::adapters::runners::ConsoleTrialRunner;
use crate::cli::output::{output, render_summary, CommandOutput};
use crate::domain::models::{Config, SessionConfig, SessionSummary};
use crate::infrastructure::config::ConfigLoader;
use crate::services::SessionOrchestrator;

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Seed the session RNG for a reproducible schedule
    #[arg(long)]
    pub seed: Option<u64>,

    /// Append trial records to this JSON-lines file
    #[arg(long, value_name = "PATH")]
    pub trial_log: Option<PathBuf>,

    /// Override repeats per condition
    #[arg(long)]
    pub repeats: Option<u32>,

    /// Stop after this many titration trials
    #[arg(long)]
    pub budget: Option<u32>,

    /// Keep previous trials on screen
    #[arg(long)]
    pub no_clear: bool,
}

impl RunArgs {
    /// Apply command-line overrides on top of loaded configuration
    pub fn apply(&self, session: &mut SessionConfig) {
        if let Some(seed) = self.seed {
            session.seed = Some(seed);
        }
        if let Some(repeats) = self.repeats {
            session.repeats_per_condition = repeats;
        }
        if let Some(budget) = self.budget {
            session.trial_budget = Some(budget);
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionOutput {
    pub success: bool,
    pub trial_log: Option<PathBuf>,
    pub summary: SessionSummary,
}

impl CommandOutput for SessionOutput {
    fn to_human(&self) -> String {
        let mut text = render_summary(&self.summary);
        if let Some(path) = &self.trial_log {
            text.push_str(&format!("\n\nTrial log written to {}", path.display()));
        }
        text
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: RunArgs, mut config: Config, json_mode: bool) -> Result<()> {
    args.apply(&mut config.session);
    ConfigLoader::validate(&config)?;

    let sink = super::open_sink(args.trial_log.as_deref()).await?;
    let runner = ConsoleTrialRunner::new().with_clear_between_trials(!args.no_clear);
    let mut orchestrator = SessionOrchestrator::new(config.session, runner, sink);

    let summary = orchestrator.run().await?;

    output(
        &SessionOutput {
            success: true,
            trial_log: args.trial_log,
            summary,
        },
        json_mode,
    );
    Ok(())
}
