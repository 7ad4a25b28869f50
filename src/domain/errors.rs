//! Domain errors for the titration core.

use thiserror::Error;

/// Errors raised by the titration core.
///
/// Collaborator failures (trial runner, trial sink) are not represented here;
/// they travel as `anyhow::Error` and reach the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TitrationError {
    #[error("Invalid response label {label:?}: expected one of {expected:?}")]
    InvalidResponse { label: String, expected: Vec<String> },

    #[error("Degenerate reward range for condition {condition_id}: tmax {tmax} < bmax {bmax}")]
    DegenerateRange {
        condition_id: String,
        bmax: u32,
        tmax: u32,
    },

    #[error("Offer {offered} for condition {condition_id} lies outside bracket [{bmax}, {tmax}]")]
    OfferOutsideBracket {
        condition_id: String,
        offered: u32,
        bmax: u32,
        tmax: u32,
    },

    #[error("Filler condition {0} has no bracket to update")]
    FillerNotScorable(String),

    #[error("Filler condition {0} has no stimulus of its own")]
    FillerNotRenderable(String),

    #[error("Condition not found: {0}")]
    UnknownCondition(String),

    #[error("No completed titration trials to draw a payoff from")]
    NoCompletedTrials,
}

pub type DomainResult<T> = Result<T, TitrationError>;
