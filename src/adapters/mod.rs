//! Adapters implementing the domain ports.

pub mod runners;
pub mod sinks;
