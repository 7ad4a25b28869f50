//! Output formatting utilities for the CLI.

use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};
use console::style;
use serde::Serialize;

use crate::domain::models::{ConditionSummary, SessionSummary};

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;
    fn to_json(&self) -> serde_json::Value;
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Create a standard list table with the given headers.
pub fn list_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.to_uppercase()).set_alignment(CellAlignment::Left)),
        );
    table
}

/// Per-condition results table
pub fn conditions_table(conditions: &[ConditionSummary]) -> Table {
    let mut table = list_table(&["condition", "kind", "trials", "bracket", "estimate", "status"]);
    for c in conditions {
        let s = &c.snapshot;
        table.add_row(vec![
            Cell::new(&c.id),
            Cell::new(c.kind),
            Cell::new(c.trials_completed).set_alignment(CellAlignment::Right),
            Cell::new(format!("{}-{} / {}-{}", s.bmax, s.bmin, s.tmin, s.tmax)),
            Cell::new(format!("{:.0}", c.estimate)).set_alignment(CellAlignment::Right),
            Cell::new(if c.resolved { "resolved" } else { "open" }),
        ]);
    }
    table
}

/// Human-readable session report
pub fn render_summary(summary: &SessionSummary) -> String {
    let mut lines = vec![
        format!("{} {}", style("Session").bold(), summary.session_id),
        format!(
            "{} titration trials, {} filler trials, {}/{} conditions resolved",
            summary.total_trials_run,
            summary.filler_trials_run,
            summary.resolved_count,
            summary.condition_count
        ),
        String::new(),
        conditions_table(&summary.conditions).to_string(),
    ];

    match &summary.payoff {
        Some(payoff) => {
            lines.push(String::new());
            lines.push(format!(
                "{} trial #{} ({}): chose {} -> {}",
                style("Payoff").bold(),
                payoff.source_trial_index,
                payoff.condition_id,
                payoff.chosen_label,
                payoff.payout
            ));
        }
        None => {
            lines.push(String::new());
            lines.push(format!("{} none (no titration trials completed)", style("Payoff").bold()));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ConditionStore, SessionState};

    #[test]
    fn test_conditions_table_lists_every_condition() {
        let store = ConditionStore::initialize(1000, &[7, 30], &[50]);
        let summary = SessionState::new(store).summary(None);
        let rendered = conditions_table(&summary.conditions).to_string();

        assert!(rendered.contains("CONDITION"));
        assert!(rendered.contains("t1"));
        assert!(rendered.contains("t2"));
        assert!(rendered.contains("p1"));
        assert!(!rendered.contains("filler"));
        assert!(rendered.contains("0-0 / 1000-1000"));
    }

    #[test]
    fn test_summary_without_payoff() {
        let store = ConditionStore::initialize(1000, &[7], &[]);
        let summary = SessionState::new(store).summary(None);
        let rendered = render_summary(&summary);
        assert!(rendered.contains("0/1 conditions resolved"));
        assert!(rendered.contains("no titration trials completed"));
    }
}
