use rand::Rng;
use tracing::{error, trace};

use crate::domain::errors::{DomainResult, TitrationError};
use crate::domain::models::Condition;

/// Draws the reward amount to offer on the next trial of a condition
///
/// Amounts are uniform over the outer bracket `[bmax, tmax]`, quantized to
/// multiples of the step size. Filler conditions draw from the full
/// `[0, standard_amount]` range instead.
#[derive(Debug, Clone, Copy)]
pub struct RewardSampler {
    step_size: u32,
    standard_amount: u32,
}

impl RewardSampler {
    /// Create a sampler; `step_size` must be non-zero
    pub const fn new(step_size: u32, standard_amount: u32) -> Self {
        Self {
            step_size,
            standard_amount,
        }
    }

    pub const fn step_size(&self) -> u32 {
        self.step_size
    }

    /// The inclusive range a condition's offer is drawn from
    pub const fn range_for(&self, condition: &Condition) -> (u32, u32) {
        if condition.kind.is_filler() {
            (0, self.standard_amount)
        } else {
            (condition.bmax, condition.tmax)
        }
    }

    /// Draw an offer for `condition`
    ///
    /// # Errors
    ///
    /// [`TitrationError::DegenerateRange`] when `tmax < bmax`. That can only
    /// happen if the bracket ordering was broken upstream, and the session
    /// must not continue on corrupted state.
    pub fn sample<R: Rng + ?Sized>(&self, condition: &Condition, rng: &mut R) -> DomainResult<u32> {
        let (lo, hi) = self.range_for(condition);
        if hi < lo {
            error!(
                condition_id = %condition.id,
                bmax = lo,
                tmax = hi,
                "bracket ordering violated; refusing to sample"
            );
            return Err(TitrationError::DegenerateRange {
                condition_id: condition.id.clone(),
                bmax: lo,
                tmax: hi,
            });
        }

        let offered = sample_quantized(lo, hi, self.step_size, rng);
        trace!(condition_id = %condition.id, lo, hi, offered, "sampled reward");
        Ok(offered)
    }
}

/// `round(u * (hi/step - lo/step) + lo/step) * step` with `u ~ U[0, 1)`.
///
/// A zero-width range returns `lo` without consuming randomness.
pub fn sample_quantized<R: Rng + ?Sized>(lo: u32, hi: u32, step_size: u32, rng: &mut R) -> u32 {
    if lo >= hi {
        return lo;
    }

    let step = f64::from(step_size.max(1));
    let lo_steps = f64::from(lo) / step;
    let hi_steps = f64::from(hi) / step;
    let u: f64 = rng.gen();
    let steps = u.mul_add(hi_steps - lo_steps, lo_steps).round();

    (steps * step) as u32
}
