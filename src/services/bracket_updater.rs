//! Bracket narrowing for the double staircase.
//!
//! A condition keeps two nested brackets around its indifference point. The
//! upper pair (`tmin`, `tmax`) tracks offers the subject took instead of the
//! standard; the lower pair (`bmin`, `bmax`) tracks offers the subject passed
//! over. Each choice moves exactly one of the six boundaries described on
//! [`BracketBranch`], and the condition resolves once `tmax - bmax` falls to
//! the convergence threshold.
//!
//! Boundary comparisons are deliberately asymmetric (`<` against `bmin`,
//! `<=` against `tmin` for variable choices; `<` against both for standard
//! choices). Changing any of them changes which branch fires on exact
//! boundary offers.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::domain::errors::{DomainResult, TitrationError};
use crate::domain::models::{ChoiceOption, Condition};

/// Which boundary a choice moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketBranch {
    /// Variable chosen below `bmin`: `bmax = 0`, `bmin = offer`
    LowerFloorReset,
    /// Variable chosen in `[bmin, tmin]`: `tmax = tmin`, `tmin = offer`
    UpperTightened,
    /// Variable chosen above `tmin`: `tmax = offer`
    UpperLoosened,
    /// Standard chosen above `tmin`: `tmax = standard`, `tmin = offer`
    UpperReset,
    /// Standard chosen in `(bmin, tmin]`: `bmax = bmin`, `bmin = offer`
    LowerTightened,
    /// Standard chosen at or below `bmin`: `bmax = offer`
    LowerLoosened,
}

impl fmt::Display for BracketBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LowerFloorReset => "lower_floor_reset",
            Self::UpperTightened => "upper_tightened",
            Self::UpperLoosened => "upper_loosened",
            Self::UpperReset => "upper_reset",
            Self::LowerTightened => "lower_tightened",
            Self::LowerLoosened => "lower_loosened",
        };
        write!(f, "{name}")
    }
}

/// Effect of one [`BracketUpdater::apply_choice`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BracketUpdate {
    Applied {
        branch: BracketBranch,
        converged: bool,
    },
    /// The condition already had an indifference point; nothing changed
    AlreadyResolved,
}

impl BracketUpdate {
    pub const fn converged(&self) -> bool {
        matches!(self, Self::Applied { converged: true, .. })
    }
}

/// Applies subject choices to condition brackets
#[derive(Debug, Clone, Copy)]
pub struct BracketUpdater {
    standard_amount: u32,
    convergence_threshold: u32,
}

impl BracketUpdater {
    pub const fn new(standard_amount: u32, convergence_threshold: u32) -> Self {
        Self {
            standard_amount,
            convergence_threshold,
        }
    }

    pub const fn convergence_threshold(&self) -> u32 {
        self.convergence_threshold
    }

    /// Narrow `condition`'s bracket after the subject chose `chosen` over an
    /// offer of `offered`
    ///
    /// Resolved conditions are left untouched and reported as
    /// [`BracketUpdate::AlreadyResolved`].
    ///
    /// # Errors
    ///
    /// * [`TitrationError::FillerNotScorable`] for the filler condition
    /// * [`TitrationError::OfferOutsideBracket`] if `offered` is not in
    ///   `[bmax, tmax]`
    ///
    /// Neither error mutates the condition.
    pub fn apply_choice(
        &self,
        condition: &mut Condition,
        chosen: ChoiceOption,
        offered: u32,
    ) -> DomainResult<BracketUpdate> {
        if condition.kind.is_filler() {
            return Err(TitrationError::FillerNotScorable(condition.id.clone()));
        }

        if let Some(ip) = condition.indifference_point {
            warn!(
                condition_id = %condition.id,
                indifference_point = ip,
                offered,
                "choice applied to resolved condition; ignoring"
            );
            return Ok(BracketUpdate::AlreadyResolved);
        }

        if offered < condition.bmax || offered > condition.tmax {
            return Err(TitrationError::OfferOutsideBracket {
                condition_id: condition.id.clone(),
                offered,
                bmax: condition.bmax,
                tmax: condition.tmax,
            });
        }

        let branch = match chosen {
            ChoiceOption::Variable => {
                if offered < condition.bmin {
                    condition.bmax = 0;
                    condition.bmin = offered;
                    BracketBranch::LowerFloorReset
                } else if offered <= condition.tmin {
                    condition.tmax = condition.tmin;
                    condition.tmin = offered;
                    BracketBranch::UpperTightened
                } else {
                    condition.tmax = offered;
                    BracketBranch::UpperLoosened
                }
            }
            ChoiceOption::Standard => {
                if condition.tmin < offered {
                    condition.tmax = self.standard_amount;
                    condition.tmin = offered;
                    BracketBranch::UpperReset
                } else if condition.bmin < offered {
                    condition.bmax = condition.bmin;
                    condition.bmin = offered;
                    BracketBranch::LowerTightened
                } else {
                    condition.bmax = offered;
                    BracketBranch::LowerLoosened
                }
            }
        };

        condition.trials_completed += 1;

        let converged = condition.bracket_width() <= self.convergence_threshold;
        if converged {
            condition.indifference_point = Some(offered);
            info!(
                condition_id = %condition.id,
                indifference_point = offered,
                trials = condition.trials_completed,
                "condition resolved"
            );
        }

        debug!(
            condition_id = %condition.id,
            %chosen,
            offered,
            %branch,
            tmin = condition.tmin,
            tmax = condition.tmax,
            bmin = condition.bmin,
            bmax = condition.bmax,
            "bracket updated"
        );

        Ok(BracketUpdate::Applied { branch, converged })
    }

    /// Parse a runner label and apply it
    ///
    /// An unrecognised label is logged and returned as
    /// [`TitrationError::InvalidResponse`] before the condition is touched.
    pub fn apply_label(
        &self,
        condition: &mut Condition,
        label: &str,
        offered: u32,
    ) -> DomainResult<BracketUpdate> {
        let chosen = ChoiceOption::from_label(label).inspect_err(|err| {
            warn!(condition_id = %condition.id, label, error = %err, "rejected response");
        })?;
        self.apply_choice(condition, chosen, offered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ConditionKind;

    const STANDARD: u32 = 1000;
    const STEP: u32 = 50;

    fn updater() -> BracketUpdater {
        BracketUpdater::new(STANDARD, STEP)
    }

    fn fresh() -> Condition {
        Condition::new("t1", ConditionKind::TemporalDelay { delay_days: 30 }, STANDARD)
    }

    fn with_bracket(bmax: u32, bmin: u32, tmin: u32, tmax: u32) -> Condition {
        let mut c = fresh();
        c.bmax = bmax;
        c.bmin = bmin;
        c.tmin = tmin;
        c.tmax = tmax;
        c
    }

    fn bracket(c: &Condition) -> (u32, u32, u32, u32) {
        (c.bmax, c.bmin, c.tmin, c.tmax)
    }

    #[test]
    fn test_variable_below_bmin_resets_floor() {
        let mut c = with_bracket(300, 400, 800, 900);
        let update = updater().apply_choice(&mut c, ChoiceOption::Variable, 350).unwrap();

        assert_eq!(
            update,
            BracketUpdate::Applied {
                branch: BracketBranch::LowerFloorReset,
                converged: false
            }
        );
        assert_eq!(bracket(&c), (0, 350, 800, 900));
    }

    #[test]
    fn test_variable_at_bmin_tightens_upper() {
        let mut c = with_bracket(300, 400, 800, 900);
        let update = updater().apply_choice(&mut c, ChoiceOption::Variable, 400).unwrap();

        assert!(matches!(
            update,
            BracketUpdate::Applied {
                branch: BracketBranch::UpperTightened,
                ..
            }
        ));
        assert_eq!(bracket(&c), (300, 400, 400, 800));
    }

    #[test]
    fn test_variable_at_tmin_tightens_upper() {
        let mut c = with_bracket(300, 400, 800, 900);
        updater().apply_choice(&mut c, ChoiceOption::Variable, 800).unwrap();
        assert_eq!(bracket(&c), (300, 400, 800, 800));
    }

    #[test]
    fn test_variable_above_tmin_loosens_upper() {
        let mut c = with_bracket(300, 400, 800, 900);
        let update = updater().apply_choice(&mut c, ChoiceOption::Variable, 850).unwrap();

        assert!(matches!(
            update,
            BracketUpdate::Applied {
                branch: BracketBranch::UpperLoosened,
                ..
            }
        ));
        assert_eq!(bracket(&c), (300, 400, 800, 850));
    }

    #[test]
    fn test_standard_above_tmin_resets_upper() {
        let mut c = with_bracket(300, 400, 800, 900);
        let update = updater().apply_choice(&mut c, ChoiceOption::Standard, 850).unwrap();

        assert!(matches!(
            update,
            BracketUpdate::Applied {
                branch: BracketBranch::UpperReset,
                ..
            }
        ));
        assert_eq!(bracket(&c), (300, 400, 850, STANDARD));
    }

    #[test]
    fn test_standard_at_tmin_tightens_lower() {
        let mut c = with_bracket(300, 400, 800, 900);
        let update = updater().apply_choice(&mut c, ChoiceOption::Standard, 800).unwrap();

        assert!(matches!(
            update,
            BracketUpdate::Applied {
                branch: BracketBranch::LowerTightened,
                ..
            }
        ));
        assert_eq!(bracket(&c), (400, 800, 800, 900));
    }

    #[test]
    fn test_standard_at_bmin_loosens_lower() {
        let mut c = with_bracket(300, 400, 800, 900);
        let update = updater().apply_choice(&mut c, ChoiceOption::Standard, 400).unwrap();

        assert!(matches!(
            update,
            BracketUpdate::Applied {
                branch: BracketBranch::LowerLoosened,
                ..
            }
        ));
        assert_eq!(bracket(&c), (400, 400, 800, 900));
    }

    #[test]
    fn test_always_standard_walkthrough() {
        // standard 1000, step 50, subject always takes the standard
        let updater = updater();
        let mut c = fresh();

        updater.apply_choice(&mut c, ChoiceOption::Standard, 550).unwrap();
        assert_eq!(bracket(&c), (0, 550, 1000, 1000));

        updater.apply_choice(&mut c, ChoiceOption::Standard, 800).unwrap();
        assert_eq!(bracket(&c), (550, 800, 1000, 1000));
        assert!(!c.is_resolved());

        updater.apply_choice(&mut c, ChoiceOption::Standard, 950).unwrap();
        assert_eq!(bracket(&c), (800, 950, 1000, 1000));
        assert!(!c.is_resolved());

        let update = updater.apply_choice(&mut c, ChoiceOption::Standard, 1000).unwrap();
        assert!(update.converged());
        assert_eq!(bracket(&c), (950, 1000, 1000, 1000));
        assert_eq!(c.indifference_point, Some(1000));
        assert_eq!(c.trials_completed, 4);
    }

    #[test]
    fn test_convergence_sets_ip_to_last_offer() {
        let mut c = with_bracket(400, 450, 500, 550);
        let update = updater().apply_choice(&mut c, ChoiceOption::Standard, 500).unwrap();
        // bmax = 450, tmax = 550: still 100 wide
        assert!(!update.converged());
        assert_eq!(c.indifference_point, None);

        let mut c = with_bracket(400, 450, 500, 500);
        let update = updater().apply_choice(&mut c, ChoiceOption::Standard, 480).unwrap();
        assert!(update.converged());
        assert_eq!(bracket(&c), (450, 480, 500, 500));
        assert_eq!(c.indifference_point, Some(480));
    }

    #[test]
    fn test_convergence_boundary_is_inclusive() {
        let mut c = with_bracket(450, 450, 500, 550);
        let update = updater().apply_choice(&mut c, ChoiceOption::Variable, 500).unwrap();
        // tmax = 500, bmax = 450: width exactly the threshold
        assert!(update.converged());
        assert_eq!(c.indifference_point, Some(500));
    }

    #[test]
    fn test_resolved_condition_is_left_alone() {
        let mut c = with_bracket(450, 450, 500, 500);
        c.indifference_point = Some(480);
        let before = c.clone();

        let update = updater().apply_choice(&mut c, ChoiceOption::Variable, 450).unwrap();
        assert_eq!(update, BracketUpdate::AlreadyResolved);
        assert_eq!(c, before);
    }

    #[test]
    fn test_offer_outside_bracket_rejected() {
        let mut c = with_bracket(300, 400, 800, 900);
        let before = c.clone();

        let err = updater().apply_choice(&mut c, ChoiceOption::Variable, 950).unwrap_err();
        assert!(matches!(err, TitrationError::OfferOutsideBracket { offered: 950, .. }));
        let err = updater().apply_choice(&mut c, ChoiceOption::Standard, 250).unwrap_err();
        assert!(matches!(err, TitrationError::OfferOutsideBracket { offered: 250, .. }));
        assert_eq!(c, before);
    }

    #[test]
    fn test_filler_rejected() {
        let mut filler = Condition::new("filler", ConditionKind::Filler, STANDARD);
        let err = updater().apply_choice(&mut filler, ChoiceOption::Variable, 500).unwrap_err();
        assert_eq!(err, TitrationError::FillerNotScorable("filler".to_string()));
        assert_eq!(filler.trials_completed, 0);
    }

    #[test]
    fn test_invalid_label_does_not_mutate() {
        let mut c = with_bracket(300, 400, 800, 900);
        let before = c.clone();

        let err = updater().apply_label(&mut c, "maybe", 500).unwrap_err();
        assert!(matches!(err, TitrationError::InvalidResponse { .. }));
        assert_eq!(c, before);
    }

    #[test]
    fn test_apply_label_maps_a_and_b() {
        let mut c = fresh();
        updater().apply_label(&mut c, "B", 500).unwrap();
        assert_eq!(bracket(&c), (0, 500, 1000, 1000));

        updater().apply_label(&mut c, "a", 700).unwrap();
        assert_eq!(bracket(&c), (0, 500, 700, 1000));
    }
}
