use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for Titrate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Titration session parameters
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Titration session parameters, fixed for the lifetime of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SessionConfig {
    /// Amount of the delayed / probabilistic standard reward (currency units)
    #[serde(default = "default_standard_amount")]
    pub standard_amount: u32,

    /// Reward quantum; also the convergence threshold on `tmax - bmax`
    #[serde(default = "default_step_size")]
    pub step_size: u32,

    /// Delays in days, one temporal condition each (`t1`, `t2`, ...)
    #[serde(default = "default_temporal_delay_levels")]
    pub temporal_delay_levels: Vec<u32>,

    /// Payout probabilities in percent, one probability condition each (`p1`, `p2`, ...)
    #[serde(default = "default_probability_levels")]
    pub probability_levels: Vec<u32>,

    /// Sequence entries generated per condition
    #[serde(default = "default_repeats_per_condition")]
    pub repeats_per_condition: u32,

    /// Titration trial count from which filler trials are interleaved
    #[serde(default = "default_distractor_start_threshold")]
    pub distractor_start_threshold: u32,

    /// Pause after each trial in milliseconds
    #[serde(default = "default_post_trial_delay_ms")]
    pub post_trial_delay_ms: u64,

    /// Cap on titration trials; defaults to the full sequence length
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trial_budget: Option<u32>,

    /// RNG seed for reproducible sessions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Symbol prefixed to amounts in stimulus text
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// Consecutive unrecognised responses tolerated before the session fails
    #[serde(default = "default_max_invalid_responses")]
    pub max_invalid_responses: u32,
}

const fn default_standard_amount() -> u32 {
    1000
}

const fn default_step_size() -> u32 {
    50
}

fn default_temporal_delay_levels() -> Vec<u32> {
    vec![1, 7, 30, 180, 365]
}

fn default_probability_levels() -> Vec<u32> {
    vec![90, 75, 50, 25, 10]
}

const fn default_repeats_per_condition() -> u32 {
    10
}

const fn default_distractor_start_threshold() -> u32 {
    4
}

const fn default_post_trial_delay_ms() -> u64 {
    500
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

const fn default_max_invalid_responses() -> u32 {
    3
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            standard_amount: default_standard_amount(),
            step_size: default_step_size(),
            temporal_delay_levels: default_temporal_delay_levels(),
            probability_levels: default_probability_levels(),
            repeats_per_condition: default_repeats_per_condition(),
            distractor_start_threshold: default_distractor_start_threshold(),
            post_trial_delay_ms: default_post_trial_delay_ms(),
            trial_budget: None,
            seed: None,
            currency_symbol: default_currency_symbol(),
            max_invalid_responses: default_max_invalid_responses(),
        }
    }
}

impl SessionConfig {
    /// Number of scored (non-filler) conditions
    pub fn condition_count(&self) -> usize {
        self.temporal_delay_levels.len() + self.probability_levels.len()
    }

    /// Titration trials the session may run at most
    pub fn effective_trial_budget(&self) -> u32 {
        let sequence_len = self.repeats_per_condition as usize * self.condition_count();
        let sequence_len = u32::try_from(sequence_len).unwrap_or(u32::MAX);
        self.trial_budget
            .map_or(sequence_len, |budget| budget.min(sequence_len))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Console log format
    #[serde(default)]
    pub format: LogFormat,

    /// Directory for rolling JSON log files (console only when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// Log file rotation policy
    #[serde(default)]
    pub rotation: RotationPolicy,

    /// Emit logs on stderr
    #[serde(default = "default_true")]
    pub enable_console: bool,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            log_dir: None,
            rotation: RotationPolicy::default(),
            enable_console: true,
        }
    }
}
