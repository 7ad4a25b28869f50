pub mod bracket_updater;
pub mod reward_sampler;
pub mod session_orchestrator;
pub mod stimulus_formatter;
pub mod trial_sequencer;

pub use bracket_updater::{BracketBranch, BracketUpdate, BracketUpdater};
pub use reward_sampler::RewardSampler;
pub use session_orchestrator::SessionOrchestrator;
pub use stimulus_formatter::StimulusFormatter;
pub use trial_sequencer::{TrialSequence, TrialSequencer};
