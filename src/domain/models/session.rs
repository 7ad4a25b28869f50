//! Domain models for a titration session.
//!
//! A session owns its condition store and the append-only trial log. It is
//! created at session start and discarded once the summary has been emitted.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::condition::{Condition, ConditionKind, ConditionSnapshot, ConditionStore};
use super::trial::{ChoiceOption, TrialKind, TrialRecord};

/// Session lifecycle phase, advanced strictly in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// Session created, nothing presented yet
    Created,
    /// Instruction pages are being shown
    Instructions,
    /// Titration loop with interleaved filler trials
    Titration,
    /// Real-stakes payoff trial
    Payoff,
    /// Summary assembled; no further trials accepted
    Complete,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Instructions => "instructions",
            Self::Titration => "titration",
            Self::Payoff => "payoff",
            Self::Complete => "complete",
        };
        write!(f, "{name}")
    }
}

/// Mutable state of one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    /// Unique session identifier
    pub id: Uuid,

    /// Current lifecycle phase
    pub phase: SessionPhase,

    /// Titration trials administered so far
    pub total_trials_run: u32,

    /// Filler trials administered so far
    pub filler_trials_run: u32,

    /// Offer of the most recently presented trial
    pub last_offered_reward: Option<u32>,

    /// Stimulus text of the most recently presented trial
    pub last_stimulus_text: Option<String>,

    /// Every condition of the session, filler included
    pub conditions: ConditionStore,

    /// Conditions that have transitioned to resolved
    pub resolved_count: u32,

    /// Append-only trial log
    pub records: Vec<TrialRecord>,

    /// Session creation timestamp
    pub started_at: DateTime<Utc>,

    /// Set when the session reaches [`SessionPhase::Complete`]
    pub finished_at: Option<DateTime<Utc>>,
}

impl SessionState {
    /// Creates a session around a freshly initialised condition store
    pub fn new(conditions: ConditionStore) -> Self {
        Self {
            id: Uuid::new_v4(),
            phase: SessionPhase::Created,
            total_trials_run: 0,
            filler_trials_run: 0,
            last_offered_reward: None,
            last_stimulus_text: None,
            conditions,
            resolved_count: 0,
            records: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Moves to `phase`; phases never move backwards
    pub fn advance(&mut self, phase: SessionPhase) {
        if phase > self.phase {
            self.phase = phase;
            if phase == SessionPhase::Complete {
                self.finished_at = Some(Utc::now());
            }
        }
    }

    /// Index the next appended record will receive
    pub fn next_trial_index(&self) -> u32 {
        u32::try_from(self.records.len()).unwrap_or(u32::MAX)
    }

    /// Remembers what was just put in front of the subject
    pub fn note_presented(&mut self, offered_reward: u32, stimulus_text: &str) {
        self.last_offered_reward = Some(offered_reward);
        self.last_stimulus_text = Some(stimulus_text.to_string());
    }

    /// Appends a completed trial to the log
    pub fn append_record(&mut self, record: TrialRecord) {
        self.records.push(record);
    }

    /// Completed titration trials, in order
    pub fn titration_records(&self) -> Vec<&TrialRecord> {
        self.records
            .iter()
            .filter(|r| r.trial_kind == TrialKind::Titration)
            .collect()
    }

    /// Builds the end-of-session summary
    pub fn summary(&self, payoff: Option<PayoffOutcome>) -> SessionSummary {
        SessionSummary {
            session_id: self.id,
            total_trials_run: self.total_trials_run,
            filler_trials_run: self.filler_trials_run,
            resolved_count: self.resolved_count,
            condition_count: self.conditions.titration_conditions().count(),
            conditions: self
                .conditions
                .titration_conditions()
                .map(ConditionSummary::from)
                .collect(),
            payoff,
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

/// What the subject is owed after the payoff trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub amount: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability_percent: Option<u32>,
}

impl Payout {
    /// Payout implied by choosing `option` on a trial of `kind`
    pub const fn for_choice(
        option: ChoiceOption,
        kind: ConditionKind,
        offered_reward: u32,
        standard_amount: u32,
    ) -> Self {
        match option {
            ChoiceOption::Variable => Self {
                amount: offered_reward,
                delay_days: None,
                probability_percent: None,
            },
            ChoiceOption::Standard => match kind {
                ConditionKind::TemporalDelay { delay_days } => Self {
                    amount: standard_amount,
                    delay_days: Some(delay_days),
                    probability_percent: None,
                },
                ConditionKind::ProbabilityDelay {
                    probability_percent,
                } => Self {
                    amount: standard_amount,
                    delay_days: None,
                    probability_percent: Some(probability_percent),
                },
                ConditionKind::Filler => Self {
                    amount: standard_amount,
                    delay_days: None,
                    probability_percent: None,
                },
            },
        }
    }
}

impl fmt::Display for Payout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.amount)?;
        match (self.delay_days, self.probability_percent) {
            (Some(days), _) => write!(f, " in {days} day(s)"),
            (_, Some(p)) => write!(f, " with {p}% chance"),
            _ => write!(f, " now, for sure"),
        }
    }
}

/// Result of the real-stakes payoff trial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoffOutcome {
    /// `trial_index` of the titration record that was re-presented
    pub source_trial_index: u32,
    pub condition_id: String,
    pub kind: ConditionKind,
    pub offered_reward: u32,
    pub stimulus_text: String,
    pub chosen_label: String,
    pub chosen_option: ChoiceOption,
    pub response_time_ms: u64,
    pub payout: Payout,
}

/// Final state of one condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSummary {
    pub id: String,
    pub kind: ConditionKind,
    pub trials_completed: u32,
    pub resolved: bool,
    /// Indifference point, or bracket midpoint when unresolved
    pub estimate: f64,
    pub snapshot: ConditionSnapshot,
}

impl From<&Condition> for ConditionSummary {
    fn from(condition: &Condition) -> Self {
        Self {
            id: condition.id.clone(),
            kind: condition.kind,
            trials_completed: condition.trials_completed,
            resolved: condition.is_resolved(),
            estimate: condition.estimate(),
            snapshot: condition.snapshot(),
        }
    }
}

/// Emitted once per session after the payoff trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub total_trials_run: u32,
    pub filler_trials_run: u32,
    pub resolved_count: u32,
    pub condition_count: usize,
    pub conditions: Vec<ConditionSummary>,
    pub payoff: Option<PayoffOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ConditionStore {
        ConditionStore::initialize(1000, &[7, 30], &[50])
    }

    #[test]
    fn test_new_session() {
        let session = SessionState::new(store());
        assert_eq!(session.phase, SessionPhase::Created);
        assert_eq!(session.total_trials_run, 0);
        assert_eq!(session.resolved_count, 0);
        assert!(session.records.is_empty());
        assert!(session.finished_at.is_none());
    }

    #[test]
    fn test_phase_never_moves_backwards() {
        let mut session = SessionState::new(store());
        session.advance(SessionPhase::Titration);
        session.advance(SessionPhase::Instructions);
        assert_eq!(session.phase, SessionPhase::Titration);

        session.advance(SessionPhase::Complete);
        assert_eq!(session.phase, SessionPhase::Complete);
        assert!(session.finished_at.is_some());
    }

    #[test]
    fn test_summary_excludes_filler() {
        let session = SessionState::new(store());
        let summary = session.summary(None);
        assert_eq!(summary.condition_count, 3);
        assert_eq!(summary.conditions.len(), 3);
        assert!(summary.conditions.iter().all(|c| !c.kind.is_filler()));
    }

    #[test]
    fn test_payout_for_variable_choice_is_immediate() {
        let payout = Payout::for_choice(
            ChoiceOption::Variable,
            ConditionKind::TemporalDelay { delay_days: 30 },
            450,
            1000,
        );
        assert_eq!(payout.amount, 450);
        assert_eq!(payout.delay_days, None);
        assert_eq!(payout.to_string(), "450 now, for sure");
    }

    #[test]
    fn test_payout_for_standard_choice_carries_condition() {
        let delayed = Payout::for_choice(
            ChoiceOption::Standard,
            ConditionKind::TemporalDelay { delay_days: 30 },
            450,
            1000,
        );
        assert_eq!(delayed.amount, 1000);
        assert_eq!(delayed.delay_days, Some(30));

        let risky = Payout::for_choice(
            ChoiceOption::Standard,
            ConditionKind::ProbabilityDelay {
                probability_percent: 25,
            },
            450,
            1000,
        );
        assert_eq!(risky.probability_percent, Some(25));
        assert_eq!(risky.to_string(), "1000 with 25% chance");
    }
}
