use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Directory holding project-local configuration
pub const CONFIG_DIR: &str = ".titrate";

/// Prefix for environment overrides; `__` separates nested keys
pub const ENV_PREFIX: &str = "TITRATE_";

/// Configuration error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid step_size: {0}. Must be positive")]
    InvalidStepSize(u32),

    #[error("Invalid standard_amount: {0}. Must be positive")]
    InvalidStandardAmount(u32),

    #[error("standard_amount ({standard_amount}) must be a multiple of step_size ({step_size})")]
    StandardNotOnStepGrid { standard_amount: u32, step_size: u32 },

    #[error("At least one temporal delay or probability level is required")]
    NoConditions,

    #[error("Invalid probability level: {0}. Must be between 1 and 100")]
    InvalidProbability(u32),

    #[error("Duplicate {kind} level: {value}")]
    DuplicateLevel { kind: &'static str, value: u32 },

    #[error("Invalid repeats_per_condition: {0}. Must be at least 1")]
    InvalidRepeats(u32),

    #[error("Invalid trial_budget: {0}. Must be at least 1")]
    InvalidTrialBudget(u32),

    #[error("Invalid max_invalid_responses: {0}. Must be at least 1")]
    InvalidMaxInvalidResponses(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration relative to the working directory
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .titrate/config.yaml (project config)
    /// 3. .titrate/local.yaml (local overrides, optional)
    /// 4. Environment variables (TITRATE_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(".")
    }

    /// Same as [`ConfigLoader::load`] with `root` in place of the working directory
    pub fn load_from_dir(root: impl AsRef<Path>) -> Result<Config> {
        let dir = root.as_ref().join(CONFIG_DIR);
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let session = &config.session;

        if session.step_size == 0 {
            return Err(ConfigError::InvalidStepSize(session.step_size));
        }

        if session.standard_amount == 0 {
            return Err(ConfigError::InvalidStandardAmount(session.standard_amount));
        }

        // Offers are multiples of the step, so the standard must be one too
        if session.standard_amount % session.step_size != 0 {
            return Err(ConfigError::StandardNotOnStepGrid {
                standard_amount: session.standard_amount,
                step_size: session.step_size,
            });
        }

        if session.condition_count() == 0 {
            return Err(ConfigError::NoConditions);
        }

        if let Some(&p) = session
            .probability_levels
            .iter()
            .find(|&&p| p == 0 || p > 100)
        {
            return Err(ConfigError::InvalidProbability(p));
        }

        check_unique("temporal delay", &session.temporal_delay_levels)?;
        check_unique("probability", &session.probability_levels)?;

        if session.repeats_per_condition == 0 {
            return Err(ConfigError::InvalidRepeats(session.repeats_per_condition));
        }

        if let Some(budget) = session.trial_budget.filter(|&b| b == 0) {
            return Err(ConfigError::InvalidTrialBudget(budget));
        }

        if session.max_invalid_responses == 0 {
            return Err(ConfigError::InvalidMaxInvalidResponses(
                session.max_invalid_responses,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        Ok(())
    }
}

fn check_unique(kind: &'static str, levels: &[u32]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    match levels.iter().find(|&&level| !seen.insert(level)) {
        Some(&value) => Err(ConfigError::DuplicateLevel { kind, value }),
        None => Ok(()),
    }
}
