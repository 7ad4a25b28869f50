//! Trial sink adapters.

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonlTrialSink;
pub use memory::MemoryTrialSink;
