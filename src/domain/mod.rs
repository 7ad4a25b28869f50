//! Domain layer for the titration core
//!
//! This module contains the condition, trial and session models, the domain
//! error taxonomy, and the ports the core uses to reach its collaborators.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{DomainResult, TitrationError};
