pub mod condition;
pub mod config;
pub mod session;
pub mod trial;

pub use condition::{
    Condition, ConditionKind, ConditionSnapshot, ConditionStore, KindCategory, FILLER_ID,
};
pub use config::{Config, LogFormat, LoggingConfig, RotationPolicy, SessionConfig};
pub use session::{
    ConditionSummary, PayoffOutcome, Payout, SessionPhase, SessionState, SessionSummary,
};
pub use trial::{
    option_labels, ChoiceContext, ChoiceOption, ChoicePrompt, ChoiceResponse, StepDecision,
    TrialKind, TrialRecord, TrialSpec, OPTION_LABELS,
};
