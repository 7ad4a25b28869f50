//! Titrate - adaptive titration of delay and probability discounting
//!
//! Titrate estimates, for a set of delay and probability levels, the
//! immediate certain amount a subject values as much as a fixed standard
//! reward. Each level is one condition with a double-staircase bracket that
//! narrows trial by trial until its width reaches the step size.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Conditions, trials, session state and the ports
//! - **Service Layer** (`services`): Sampling, bracket updates, sequencing and the session loop
//! - **Adapters** (`adapters`): Trial runners (console, scripted, simulated) and trial sinks
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use titrate::adapters::runners::SimulatedSubject;
//! use titrate::adapters::sinks::MemoryTrialSink;
//! use titrate::{SessionConfig, SessionOrchestrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SessionConfig {
//!         seed: Some(1),
//!         post_trial_delay_ms: 0,
//!         ..Default::default()
//!     };
//!     let subject = SimulatedSubject::new(0.01, 1.0);
//!     let mut session = SessionOrchestrator::new(config, subject, Arc::new(MemoryTrialSink::new()));
//!     let summary = session.run().await?;
//!     println!("{} conditions resolved", summary.resolved_count);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    ChoiceOption, Condition, ConditionKind, ConditionStore, Config, LoggingConfig, SessionConfig,
    SessionSummary, TrialKind, TrialRecord,
};
pub use domain::ports::{TrialRunner, TrialSink};
pub use domain::{DomainResult, TitrationError};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::logging::LoggerImpl;
pub use services::{
    BracketUpdater, RewardSampler, SessionOrchestrator, StimulusFormatter, TrialSequencer,
};
