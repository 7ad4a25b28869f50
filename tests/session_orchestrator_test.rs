//! End-to-end session tests driving the orchestrator through real adapters.

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use titrate::adapters::runners::{ScriptedTrialRunner, SimulatedSubject};
use titrate::adapters::sinks::JsonlTrialSink;
use titrate::domain::models::{ChoiceOption, SessionPhase, TrialKind, TrialRecord};
use titrate::{SessionConfig, SessionOrchestrator};

fn titration(records: &[TrialRecord]) -> impl Iterator<Item = &TrialRecord> {
    records.iter().filter(|r| r.trial_kind == TrialKind::Titration)
}

#[tokio::test]
async fn test_simulated_session_recovers_indifference_points() {
    common::setup_test_logging();
    let config = SessionConfig {
        repeats_per_condition: 30,
        ..common::small_config(11)
    };
    let sink = common::memory_sink();
    let subject = SimulatedSubject::new(0.01, 1.0);

    let mut orchestrator = SessionOrchestrator::new(config, subject, sink.clone());
    let summary = orchestrator.run().await.unwrap();

    assert_eq!(summary.condition_count, 3);
    assert!(summary.resolved_count >= 1);
    assert_eq!(orchestrator.state().phase, SessionPhase::Complete);

    let subject = orchestrator.runner();
    for condition in summary.conditions.iter().filter(|c| c.resolved) {
        let truth = subject.subjective_value(condition.kind, 1000);
        assert!(
            (condition.estimate - truth).abs() <= 50.0,
            "{}: estimate {} vs true {truth}",
            condition.id,
            condition.estimate
        );
    }

    let records = sink.records().await;
    assert_eq!(records.len(), orchestrator.state().records.len());
    assert_eq!(sink.summary().await, Some(summary));
}

#[tokio::test]
async fn test_same_seed_replays_the_same_session() {
    async fn trace(seed: u64) -> Vec<(TrialKind, String, u32, ChoiceOption)> {
        let sink = common::memory_sink();
        let mut orchestrator =
            SessionOrchestrator::new(common::small_config(seed), SimulatedSubject::new(0.02, 2.0), sink.clone());
        orchestrator.run().await.unwrap();
        sink.records()
            .await
            .into_iter()
            .map(|r| (r.trial_kind, r.condition_id, r.offered_reward, r.chosen_option))
            .collect()
    }

    assert_eq!(trace(5).await, trace(5).await);
}

#[tokio::test]
async fn test_always_standard_pushes_lower_bracket_to_the_top() {
    let config = SessionConfig {
        repeats_per_condition: 40,
        ..common::small_config(3)
    };
    let sink = common::memory_sink();
    let mut orchestrator = SessionOrchestrator::new(config, ScriptedTrialRunner::cycling(&["B"]), sink.clone());
    let summary = orchestrator.run().await.unwrap();

    assert!(summary.resolved_count >= 1);
    for condition in summary.conditions.iter().filter(|c| c.resolved) {
        assert!(condition.snapshot.bmax >= 950, "{condition:?}");
        assert_eq!(condition.snapshot.tmax, 1000);
        assert!(condition.estimate >= 950.0);
    }

    // Upper bracket never moves when the standard is always preferred
    for record in titration(&sink.records().await) {
        assert_eq!(record.condition_snapshot.tmin, 1000);
        assert_eq!(record.condition_snapshot.tmax, 1000);
    }

    let payoff = summary.payoff.unwrap();
    assert_eq!(payoff.chosen_option, ChoiceOption::Standard);
    assert_eq!(payoff.payout.amount, 1000);
}

#[tokio::test]
async fn test_budget_stops_titration() {
    let config = SessionConfig {
        trial_budget: Some(5),
        ..common::small_config(21)
    };
    let sink = common::memory_sink();
    let mut orchestrator = SessionOrchestrator::new(config, ScriptedTrialRunner::cycling(&["A", "B"]), sink.clone());
    let summary = orchestrator.run().await.unwrap();

    assert_eq!(summary.total_trials_run, 5);
    assert_eq!(titration(&sink.records().await).count(), 5);
}

#[tokio::test]
async fn test_resolved_conditions_are_not_presented_again() {
    let config = SessionConfig {
        repeats_per_condition: 30,
        ..common::small_config(8)
    };
    let sink = common::memory_sink();
    let mut orchestrator = SessionOrchestrator::new(config, SimulatedSubject::new(0.01, 1.0), sink.clone());
    orchestrator.run().await.unwrap();

    let records = sink.records().await;
    let mut resolved_at: HashMap<&str, u32> = HashMap::new();
    for record in titration(&records) {
        assert!(
            !resolved_at.contains_key(record.condition_id.as_str()),
            "{} presented after resolving",
            record.condition_id
        );
        if record.condition_snapshot.indifference_point.is_some() {
            resolved_at.insert(&record.condition_id, record.trial_index);
        }
    }
}

#[tokio::test]
async fn test_fillers_follow_even_counts_from_threshold() {
    let config = common::small_config(4);
    let sink = common::memory_sink();
    let mut orchestrator = SessionOrchestrator::new(config, ScriptedTrialRunner::cycling(&["A", "B", "B"]), sink.clone());
    let summary = orchestrator.run().await.unwrap();
    let records = sink.records().await;

    let mut titration_count = 0;
    let mut expected_fillers = 0;
    for (i, record) in records.iter().enumerate() {
        if record.trial_kind != TrialKind::Titration {
            continue;
        }
        titration_count += 1;
        let next = records.get(i + 1);
        if titration_count >= 4 && titration_count % 2 == 0 {
            expected_fillers += 1;
            let filler = next.unwrap();
            assert_eq!(filler.trial_kind, TrialKind::Filler);
            assert_eq!(filler.condition_id, "filler");

            // Borrowed wording comes from the other kind
            let source = filler.stimulus_condition_id.as_deref().unwrap();
            assert_ne!(source.chars().next(), record.condition_id.chars().next());
            assert!(filler.offered_reward <= 1000);
            assert_eq!(filler.offered_reward % 50, 0);
        } else if let Some(next) = next {
            assert_ne!(next.trial_kind, TrialKind::Filler);
        }
    }

    assert_eq!(summary.filler_trials_run, expected_fillers);
    assert_eq!(summary.total_trials_run, titration_count);
}

#[tokio::test]
async fn test_payoff_replays_a_logged_titration_trial() {
    let sink = common::memory_sink();
    let mut orchestrator =
        SessionOrchestrator::new(common::small_config(17), ScriptedTrialRunner::cycling(&["A", "B"]), sink.clone());
    let summary = orchestrator.run().await.unwrap();
    let records = sink.records().await;

    let payoff_record = records.last().unwrap();
    assert_eq!(payoff_record.trial_kind, TrialKind::Payoff);
    assert_eq!(records.iter().filter(|r| r.trial_kind == TrialKind::Payoff).count(), 1);

    let outcome = summary.payoff.unwrap();
    let source = records
        .iter()
        .find(|r| r.trial_index == outcome.source_trial_index)
        .unwrap();
    assert_eq!(source.trial_kind, TrialKind::Titration);
    assert_eq!(source.offered_reward, payoff_record.offered_reward);
    assert_eq!(source.stimulus_text, payoff_record.stimulus_text);
    assert_eq!(source.condition_id, payoff_record.condition_id);
    assert_eq!(outcome.chosen_label, payoff_record.chosen_label);

    // The payoff is not a titration trial
    assert_eq!(summary.total_trials_run as usize, titration(&records).count());
}

#[tokio::test]
async fn test_no_titration_trials_means_no_payoff() {
    let config = SessionConfig {
        trial_budget: Some(0),
        ..common::small_config(2)
    };
    let sink = common::memory_sink();
    let mut orchestrator = SessionOrchestrator::new(config, ScriptedTrialRunner::cycling(&["A"]), sink.clone());
    let summary = orchestrator.run().await.unwrap();

    assert!(summary.payoff.is_none());
    assert_eq!(summary.total_trials_run, 0);
    assert!(sink.records().await.is_empty());
}

#[tokio::test]
async fn test_instructions_precede_trials() {
    let sink = common::memory_sink();
    let config = SessionConfig {
        trial_budget: Some(2),
        ..common::small_config(1)
    };
    let mut orchestrator = SessionOrchestrator::new(config, ScriptedTrialRunner::cycling(&["A"]), sink);
    orchestrator.run().await.unwrap();

    let runner = orchestrator.into_runner();
    // Three instruction pages, payoff intro, payout message, closing
    assert_eq!(runner.messages().len(), 6);
    assert!(runner.messages()[4].starts_with("You chose A."));
    assert!(runner.messages()[5].contains("complete"));
    // Two titration prompts and the payoff prompt
    assert_eq!(runner.prompts().len(), 3);
    assert_eq!(runner.prompts()[2].trial_kind, TrialKind::Payoff);
}

#[tokio::test]
async fn test_jsonl_sink_receives_every_trial() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("trials.jsonl");
    let sink = Arc::new(JsonlTrialSink::open(&path).await.unwrap());

    let mut orchestrator =
        SessionOrchestrator::new(common::small_config(9), SimulatedSubject::new(0.01, 1.0), sink);
    orchestrator.run().await.unwrap();

    let contents = tokio::fs::read_to_string(&path).await.unwrap();
    assert_eq!(contents.lines().count(), orchestrator.state().records.len() + 1);
    let last: serde_json::Value = serde_json::from_str(contents.lines().last().unwrap()).unwrap();
    assert!(last.get("summary").is_some());
}
