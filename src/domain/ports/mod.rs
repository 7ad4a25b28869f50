//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the interfaces the titration core uses to reach its
//! collaborators:
//! - TrialRunner: presents choices and instruction screens to the subject
//! - TrialSink: persists completed trial records
//!
//! Adapters implementing these live in `crate::adapters`.

pub mod trial_runner;
pub mod trial_sink;

pub use trial_runner::TrialRunner;
pub use trial_sink::TrialSink;
