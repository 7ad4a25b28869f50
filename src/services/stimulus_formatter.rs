use crate::domain::errors::{DomainResult, TitrationError};
use crate::domain::models::{ChoiceOption, ConditionKind, Payout};

const INSTRUCTION_PAGES: [&str; 3] = [
    "In this task you will choose between two amounts of money. Option A is paid \
     right away and for certain. Option B is a larger amount that is either paid \
     later or paid only with some chance.",
    "There are no right or wrong answers. Pick the option you would actually \
     prefer. Type A or B and press Enter.",
    "At the end, one of your choices will be drawn at random and shown to you \
     again. That choice is for real: you will receive what you pick.",
];

const CLOSING: &str = "The session is complete. Thank you for taking part.";

const PAYOFF_INTRO: &str = "One of your earlier choices has been drawn at random. \
     Choose again: this time the outcome is real.";

/// Renders offers as the text shown to the subject
#[derive(Debug, Clone)]
pub struct StimulusFormatter {
    standard_amount: u32,
    currency_symbol: String,
}

impl StimulusFormatter {
    pub fn new(standard_amount: u32, currency_symbol: impl Into<String>) -> Self {
        Self {
            standard_amount,
            currency_symbol: currency_symbol.into(),
        }
    }

    /// Choice text for an offer of `reward` against the standard under `kind`
    ///
    /// # Errors
    ///
    /// [`TitrationError::FillerNotRenderable`]: filler trials borrow the
    /// wording of a real condition instead.
    pub fn format(&self, condition_id: &str, kind: ConditionKind, reward: u32) -> DomainResult<String> {
        let variable = self.amount(reward);
        let standard = self.amount(self.standard_amount);

        match kind {
            ConditionKind::TemporalDelay { delay_days } => Ok(format!(
                "A: {variable} today\nB: {standard} in {}",
                days(delay_days)
            )),
            ConditionKind::ProbabilityDelay {
                probability_percent,
            } => Ok(format!(
                "A: {variable} for sure\nB: {standard} with a {probability_percent}% chance"
            )),
            ConditionKind::Filler => Err(TitrationError::FillerNotRenderable(condition_id.to_string())),
        }
    }

    pub fn instruction_pages(&self) -> Vec<String> {
        INSTRUCTION_PAGES.iter().map(ToString::to_string).collect()
    }

    pub fn payoff_intro(&self) -> String {
        PAYOFF_INTRO.to_string()
    }

    pub fn closing_message(&self) -> String {
        CLOSING.to_string()
    }

    /// Closing message telling the subject what they will receive
    pub fn payout_message(&self, option: ChoiceOption, payout: &Payout) -> String {
        let amount = self.amount(payout.amount);
        match (option, payout.delay_days, payout.probability_percent) {
            (ChoiceOption::Standard, Some(delay), _) => {
                format!("You chose B. You will receive {amount} in {}.", days(delay))
            }
            (ChoiceOption::Standard, _, Some(p)) => {
                format!("You chose B. You will receive {amount} with a {p}% chance.")
            }
            (option, _, _) => format!("You chose {}. You will receive {amount} today.", option.label()),
        }
    }

    fn amount(&self, value: u32) -> String {
        format!("{}{value}", self.currency_symbol)
    }
}

fn days(n: u32) -> String {
    if n == 1 {
        "1 day".to_string()
    } else {
        format!("{n} days")
    }
}
