//! Trial-level domain types: choices, prompts, responses, and records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::condition::{ConditionKind, ConditionSnapshot};
use crate::domain::errors::{DomainResult, TitrationError};

/// Labels offered to the subject, in presentation order.
pub const OPTION_LABELS: [&str; 2] = ["A", "B"];

/// Which side of the choice the subject took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChoiceOption {
    /// The immediate / certain variable amount (label `A`).
    Variable,
    /// The delayed / probabilistic standard amount (label `B`).
    Standard,
}

impl ChoiceOption {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Variable => OPTION_LABELS[0],
            Self::Standard => OPTION_LABELS[1],
        }
    }

    /// Map a runner label back to an option. Case and surrounding whitespace
    /// are ignored; anything else is an [`TitrationError::InvalidResponse`].
    pub fn from_label(label: &str) -> DomainResult<Self> {
        let normalized = label.trim();
        if normalized.eq_ignore_ascii_case(OPTION_LABELS[0]) {
            Ok(Self::Variable)
        } else if normalized.eq_ignore_ascii_case(OPTION_LABELS[1]) {
            Ok(Self::Standard)
        } else {
            Err(TitrationError::InvalidResponse {
                label: label.to_string(),
                expected: option_labels(),
            })
        }
    }
}

impl fmt::Display for ChoiceOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable => write!(f, "variable"),
            Self::Standard => write!(f, "standard"),
        }
    }
}

pub fn option_labels() -> Vec<String> {
    OPTION_LABELS.iter().map(ToString::to_string).collect()
}

/// Role of a trial within the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialKind {
    Titration,
    Filler,
    Payoff,
}

impl fmt::Display for TrialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Titration => write!(f, "titration"),
            Self::Filler => write!(f, "filler"),
            Self::Payoff => write!(f, "payoff"),
        }
    }
}

/// One scheduled entry of the titration sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialSpec {
    pub position: usize,
    pub condition_id: String,
}

/// Outcome of the sequence-step hook for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepDecision {
    Proceed,
    /// The entry's condition is already resolved.
    Skip,
    /// The trial budget is exhausted or every condition is resolved.
    Stop,
}

/// Structured description of an offer, for responders that decide
/// programmatically rather than by reading the stimulus text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceContext {
    pub kind: ConditionKind,
    pub offered_reward: u32,
    pub standard_amount: u32,
}

/// What the trial runner is asked to present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoicePrompt {
    pub trial_kind: TrialKind,
    pub stimulus_text: String,
    pub option_labels: Vec<String>,
    pub context: Option<ChoiceContext>,
}

impl ChoicePrompt {
    pub fn new(trial_kind: TrialKind, stimulus_text: impl Into<String>) -> Self {
        Self {
            trial_kind,
            stimulus_text: stimulus_text.into(),
            option_labels: option_labels(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: ChoiceContext) -> Self {
        self.context = Some(context);
        self
    }
}

/// The subject's answer as delivered by the trial runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceResponse {
    pub chosen_label: String,
    pub response_time_ms: u64,
}

impl ChoiceResponse {
    pub fn new(chosen_label: impl Into<String>, response_time_ms: u64) -> Self {
        Self {
            chosen_label: chosen_label.into(),
            response_time_ms,
        }
    }
}

/// Append-only log entry, one per completed trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub session_id: Uuid,
    /// Zero-based index across every record of the session.
    pub trial_index: u32,
    /// Position of the originating sequence entry, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_position: Option<usize>,
    pub trial_kind: TrialKind,
    pub condition_id: String,
    /// Condition whose wording a filler trial borrowed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stimulus_condition_id: Option<String>,
    pub offered_reward: u32,
    pub stimulus_text: String,
    pub chosen_label: String,
    pub chosen_option: ChoiceOption,
    pub response_time_ms: u64,
    pub condition_snapshot: ConditionSnapshot,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label_accepts_both_options() {
        assert_eq!(ChoiceOption::from_label("A").unwrap(), ChoiceOption::Variable);
        assert_eq!(ChoiceOption::from_label("B").unwrap(), ChoiceOption::Standard);
    }

    #[test]
    fn test_from_label_normalizes_case_and_whitespace() {
        assert_eq!(ChoiceOption::from_label(" a\n").unwrap(), ChoiceOption::Variable);
        assert_eq!(ChoiceOption::from_label("b").unwrap(), ChoiceOption::Standard);
    }

    #[test]
    fn test_from_label_rejects_other_values() {
        for label in ["", "C", "AB", "standard"] {
            match ChoiceOption::from_label(label) {
                Err(TitrationError::InvalidResponse { label: got, expected }) => {
                    assert_eq!(got, label);
                    assert_eq!(expected, vec!["A".to_string(), "B".to_string()]);
                }
                other => panic!("Expected InvalidResponse for {label:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_label_round_trip() {
        for option in [ChoiceOption::Variable, ChoiceOption::Standard] {
            assert_eq!(ChoiceOption::from_label(option.label()).unwrap(), option);
        }
    }

    #[test]
    fn test_prompt_defaults_to_two_labels() {
        let prompt = ChoicePrompt::new(TrialKind::Titration, "text");
        assert_eq!(prompt.option_labels, vec!["A", "B"]);
        assert!(prompt.context.is_none());
    }
}
