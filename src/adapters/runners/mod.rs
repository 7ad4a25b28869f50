//! Trial runner adapters.
//!
//! - `console`: interactive stdin/stdout runner
//! - `scripted`: replays a fixed list of labels
//! - `simulated`: a discounting agent that answers from the prompt context

pub mod console;
pub mod scripted;
pub mod simulated;

pub use console::ConsoleTrialRunner;
pub use scripted::ScriptedTrialRunner;
pub use simulated::SimulatedSubject;
