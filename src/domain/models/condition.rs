//! Titration conditions and the condition parameter store.
//!
//! A condition is one delay or probability level. Each carries two nested
//! brackets around its indifference point: the upper pair `tmin`/`tmax` and
//! the lower pair `bmin`/`bmax`, ordered `bmax <= bmin <= tmin <= tmax` for as
//! long as the condition is unresolved.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::errors::{DomainResult, TitrationError};

/// Identifier of the single filler condition.
pub const FILLER_ID: &str = "filler";

/// What a condition varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionKind {
    /// The standard reward is paid after `delay_days`.
    TemporalDelay { delay_days: u32 },
    /// The standard reward is paid with `probability_percent` chance.
    ProbabilityDelay { probability_percent: u32 },
    /// Non-scored distractor trials.
    Filler,
}

/// Coarse grouping of [`ConditionKind`] used for filler stimulus selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindCategory {
    Temporal,
    Probability,
    Filler,
}

impl ConditionKind {
    pub const fn category(&self) -> KindCategory {
        match self {
            Self::TemporalDelay { .. } => KindCategory::Temporal,
            Self::ProbabilityDelay { .. } => KindCategory::Probability,
            Self::Filler => KindCategory::Filler,
        }
    }

    pub const fn is_filler(&self) -> bool {
        matches!(self, Self::Filler)
    }
}

impl KindCategory {
    /// The category a filler trial borrows its stimulus from after a trial of
    /// this category. Filler has no opposite.
    pub const fn opposite(self) -> Option<Self> {
        match self {
            Self::Temporal => Some(Self::Probability),
            Self::Probability => Some(Self::Temporal),
            Self::Filler => None,
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TemporalDelay { delay_days } => write!(f, "delay {delay_days}d"),
            Self::ProbabilityDelay { probability_percent } => {
                write!(f, "probability {probability_percent}%")
            }
            Self::Filler => write!(f, "filler"),
        }
    }
}

impl fmt::Display for KindCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temporal => write!(f, "temporal"),
            Self::Probability => write!(f, "probability"),
            Self::Filler => write!(f, "filler"),
        }
    }
}

/// Per-condition bracket state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub id: String,
    pub kind: ConditionKind,
    pub tmin: u32,
    pub tmax: u32,
    pub bmin: u32,
    pub bmax: u32,
    pub trials_completed: u32,
    pub indifference_point: Option<u32>,
}

impl Condition {
    /// Fresh condition with the upper bracket at `standard_amount` and the
    /// lower bracket at zero.
    pub fn new(id: impl Into<String>, kind: ConditionKind, standard_amount: u32) -> Self {
        Self {
            id: id.into(),
            kind,
            tmin: standard_amount,
            tmax: standard_amount,
            bmin: 0,
            bmax: 0,
            trials_completed: 0,
            indifference_point: None,
        }
    }

    pub const fn is_resolved(&self) -> bool {
        self.indifference_point.is_some()
    }

    /// Width of the outer bracket, `tmax - bmax`.
    pub const fn bracket_width(&self) -> u32 {
        self.tmax.saturating_sub(self.bmax)
    }

    /// Whether `bmax <= bmin <= tmin <= tmax` holds.
    pub const fn is_ordered(&self) -> bool {
        self.bmax <= self.bmin && self.bmin <= self.tmin && self.tmin <= self.tmax
    }

    /// Resolved indifference point, or the midpoint of the outer bracket
    /// while the condition is still open.
    pub fn estimate(&self) -> f64 {
        self.indifference_point.map_or_else(
            || (f64::from(self.bmax) + f64::from(self.tmax)) / 2.0,
            f64::from,
        )
    }

    pub fn snapshot(&self) -> ConditionSnapshot {
        ConditionSnapshot {
            tmin: self.tmin,
            tmax: self.tmax,
            bmin: self.bmin,
            bmax: self.bmax,
            indifference_point: self.indifference_point,
        }
    }
}

/// Bracket state copied into every trial record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionSnapshot {
    pub tmin: u32,
    pub tmax: u32,
    pub bmin: u32,
    pub bmax: u32,
    pub indifference_point: Option<u32>,
}

/// All conditions of a session, keyed by id.
///
/// Backed by an ordered map so that iteration, and therefore every seeded
/// draw that depends on it, is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionStore {
    conditions: BTreeMap<String, Condition>,
}

impl ConditionStore {
    /// Build one condition per delay (`t1..`) and per probability (`p1..`),
    /// numbered in configured order, plus the filler condition.
    pub fn initialize(standard_amount: u32, delays: &[u32], probabilities: &[u32]) -> Self {
        let mut conditions = BTreeMap::new();

        for (i, &delay_days) in delays.iter().enumerate() {
            let id = format!("t{}", i + 1);
            let kind = ConditionKind::TemporalDelay { delay_days };
            conditions.insert(id.clone(), Condition::new(id, kind, standard_amount));
        }

        for (i, &probability_percent) in probabilities.iter().enumerate() {
            let id = format!("p{}", i + 1);
            let kind = ConditionKind::ProbabilityDelay {
                probability_percent,
            };
            conditions.insert(id.clone(), Condition::new(id, kind, standard_amount));
        }

        conditions.insert(
            FILLER_ID.to_string(),
            Condition::new(FILLER_ID, ConditionKind::Filler, standard_amount),
        );

        Self { conditions }
    }

    pub fn get(&self, id: &str) -> DomainResult<&Condition> {
        self.conditions
            .get(id)
            .ok_or_else(|| TitrationError::UnknownCondition(id.to_string()))
    }

    pub fn get_mut(&mut self, id: &str) -> DomainResult<&mut Condition> {
        self.conditions
            .get_mut(id)
            .ok_or_else(|| TitrationError::UnknownCondition(id.to_string()))
    }

    pub fn is_resolved(&self, id: &str) -> DomainResult<bool> {
        self.get(id).map(Condition::is_resolved)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.values()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Every non-filler condition.
    pub fn titration_conditions(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.values().filter(|c| !c.kind.is_filler())
    }

    /// Non-filler conditions still without an indifference point.
    pub fn unresolved(&self) -> impl Iterator<Item = &Condition> {
        self.titration_conditions().filter(|c| !c.is_resolved())
    }

    pub fn of_category(&self, category: KindCategory) -> Vec<&Condition> {
        self.conditions
            .values()
            .filter(|c| c.kind.category() == category)
            .collect()
    }

    pub fn filler(&self) -> DomainResult<&Condition> {
        self.get(FILLER_ID)
    }

    pub fn resolved_count(&self) -> usize {
        self.titration_conditions().filter(|c| c.is_resolved()).count()
    }

    pub fn all_resolved(&self) -> bool {
        self.unresolved().next().is_none()
    }
}
