//! Simulated subject with hyperbolic discounting.
//!
//! Delayed rewards are valued at `S / (1 + k·D)` (D in days) and risky
//! rewards at `S / (1 + h·θ)` with odds against `θ = (100 - p) / p`. The
//! subject takes the variable amount whenever it is worth at least as much
//! as the discounted standard, optionally lapsing to a random answer.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::models::{ChoiceContext, ChoiceOption, ChoicePrompt, ChoiceResponse, ConditionKind};
use crate::domain::ports::TrialRunner;

const DEFAULT_RESPONSE_TIME_MS: u64 = 900;

#[derive(Debug, Clone)]
pub struct SimulatedSubject {
    delay_discount_k: f64,
    probability_discount_h: f64,
    lapse_rate: f64,
    response_time_ms: u64,
    rng: StdRng,
    choices_made: u32,
}

impl SimulatedSubject {
    /// Subject with delay discount rate `k` (per day) and probability
    /// discount rate `h`
    pub fn new(delay_discount_k: f64, probability_discount_h: f64) -> Self {
        Self {
            delay_discount_k: delay_discount_k.max(0.0),
            probability_discount_h: probability_discount_h.max(0.0),
            lapse_rate: 0.0,
            response_time_ms: DEFAULT_RESPONSE_TIME_MS,
            rng: StdRng::seed_from_u64(0),
            choices_made: 0,
        }
    }

    /// Answer at random with probability `lapse_rate`
    #[must_use]
    pub fn with_lapses(mut self, lapse_rate: f64, seed: u64) -> Self {
        self.lapse_rate = lapse_rate.clamp(0.0, 1.0);
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub const fn choices_made(&self) -> u32 {
        self.choices_made
    }

    /// Subjective value of the standard under `kind`, i.e. the true
    /// indifference point
    pub fn subjective_value(&self, kind: ConditionKind, standard_amount: u32) -> f64 {
        let standard = f64::from(standard_amount);
        match kind {
            ConditionKind::TemporalDelay { delay_days } => {
                standard / self.delay_discount_k.mul_add(f64::from(delay_days), 1.0)
            }
            ConditionKind::ProbabilityDelay {
                probability_percent,
            } => {
                let p = f64::from(probability_percent.clamp(1, 100)) / 100.0;
                let odds_against = (1.0 - p) / p;
                standard / self.probability_discount_h.mul_add(odds_against, 1.0)
            }
            ConditionKind::Filler => standard,
        }
    }

    /// Deterministic preference, ignoring lapses
    pub fn prefers(&self, context: &ChoiceContext) -> ChoiceOption {
        let value = self.subjective_value(context.kind, context.standard_amount);
        if f64::from(context.offered_reward) >= value {
            ChoiceOption::Variable
        } else {
            ChoiceOption::Standard
        }
    }
}

#[async_trait]
impl TrialRunner for SimulatedSubject {
    async fn present_choice(&mut self, prompt: &ChoicePrompt) -> Result<ChoiceResponse> {
        let context = prompt
            .context
            .ok_or_else(|| anyhow!("Simulated subject needs a structured choice context"))?;

        let choice = if self.lapse_rate > 0.0 && self.rng.gen_bool(self.lapse_rate) {
            if self.rng.gen_bool(0.5) {
                ChoiceOption::Variable
            } else {
                ChoiceOption::Standard
            }
        } else {
            self.prefers(&context)
        };

        self.choices_made += 1;
        Ok(ChoiceResponse::new(choice.label(), self.response_time_ms))
    }
}
