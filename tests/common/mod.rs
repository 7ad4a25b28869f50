//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers used across multiple integration
//! test files.

use std::sync::Arc;
use titrate::adapters::sinks::MemoryTrialSink;
use titrate::SessionConfig;

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Small seeded session without pauses: two delays, one probability
#[allow(dead_code)]
pub fn small_config(seed: u64) -> SessionConfig {
    SessionConfig {
        standard_amount: 1000,
        step_size: 50,
        temporal_delay_levels: vec![7, 30],
        probability_levels: vec![50],
        repeats_per_condition: 6,
        distractor_start_threshold: 4,
        post_trial_delay_ms: 0,
        seed: Some(seed),
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn memory_sink() -> Arc<MemoryTrialSink> {
    Arc::new(MemoryTrialSink::new())
}
