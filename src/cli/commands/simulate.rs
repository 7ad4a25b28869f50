//! Implementation of the `titrate simulate` command.
//!
//! Runs a full session against [`SimulatedSubject`] and compares the
//! titrated estimates with the subject's true indifference points.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use crate::adapters::runners::SimulatedSubject;
use crate::cli::output::{list_table, output, render_summary, CommandOutput};
use crate::domain::models::{Config, SessionSummary};
use crate::infrastructure::config::ConfigLoader;
use crate::services::SessionOrchestrator;
use comfy_table::{Cell, CellAlignment};

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Delay discount rate k (per day)
    #[arg(long, default_value_t = 0.01)]
    pub k: f64,

    /// Probability discount rate h
    #[arg(long, default_value_t = 1.0)]
    pub h: f64,

    /// Probability of a random answer on each trial
    #[arg(long, default_value_t = 0.0)]
    pub lapse_rate: f64,

    /// Seed the session RNG
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override repeats per condition
    #[arg(long)]
    pub repeats: Option<u32>,

    /// Append trial records to this JSON-lines file
    #[arg(long, value_name = "PATH")]
    pub trial_log: Option<PathBuf>,
}

/// True versus titrated indifference point for one condition
#[derive(Debug, Clone, Serialize)]
pub struct RecoveredPoint {
    pub condition_id: String,
    pub true_value: f64,
    pub estimate: f64,
    pub error: f64,
}

#[derive(Debug, Serialize)]
pub struct SimulationOutput {
    pub success: bool,
    pub k: f64,
    pub h: f64,
    pub lapse_rate: f64,
    pub recovered: Vec<RecoveredPoint>,
    pub summary: SessionSummary,
}

impl CommandOutput for SimulationOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["condition", "true", "estimate", "error"]);
        for point in &self.recovered {
            table.add_row(vec![
                Cell::new(&point.condition_id),
                Cell::new(format!("{:.1}", point.true_value)).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.1}", point.estimate)).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:+.1}", point.error)).set_alignment(CellAlignment::Right),
            ]);
        }
        format!(
            "{}\n\nSimulated subject k={} h={} lapse={}\n{table}",
            render_summary(&self.summary),
            self.k,
            self.h,
            self.lapse_rate
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Pair each condition estimate with the subject's true indifference point
pub fn recovered_points(
    subject: &SimulatedSubject,
    summary: &SessionSummary,
    standard_amount: u32,
) -> Vec<RecoveredPoint> {
    summary
        .conditions
        .iter()
        .map(|c| {
            let true_value = subject.subjective_value(c.kind, standard_amount);
            RecoveredPoint {
                condition_id: c.id.clone(),
                true_value,
                estimate: c.estimate,
                error: c.estimate - true_value,
            }
        })
        .collect()
}

pub async fn execute(args: SimulateArgs, mut config: Config, json_mode: bool) -> Result<()> {
    if let Some(seed) = args.seed {
        config.session.seed = Some(seed);
    }
    if let Some(repeats) = args.repeats {
        config.session.repeats_per_condition = repeats;
    }
    // Nobody is watching
    config.session.post_trial_delay_ms = 0;
    ConfigLoader::validate(&config)?;

    let subject = SimulatedSubject::new(args.k, args.h)
        .with_lapses(args.lapse_rate, config.session.seed.unwrap_or_default());
    let sink = super::open_sink(args.trial_log.as_deref()).await?;
    let standard_amount = config.session.standard_amount;

    let mut orchestrator = SessionOrchestrator::new(config.session, subject, sink);
    let summary = orchestrator.run().await?;
    let recovered = recovered_points(orchestrator.runner(), &summary, standard_amount);

    output(
        &SimulationOutput {
            success: true,
            k: args.k,
            h: args.h,
            lapse_rate: args.lapse_rate,
            recovered,
            summary,
        },
        json_mode,
    );
    Ok(())
}
