//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::commands::config::ConfigArgs;
use crate::cli::commands::run::RunArgs;
use crate::cli::commands::simulate::SimulateArgs;

#[derive(Parser, Debug)]
#[command(name = "titrate")]
#[command(about = "Titrate - adaptive delay and probability discounting sessions", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Load configuration from this file instead of .titrate/
    #[arg(short, long, global = true, env = "TITRATE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run an interactive session on this terminal
    Run(RunArgs),

    /// Run a session against a simulated discounting subject
    Simulate(SimulateArgs),

    /// Inspect or create configuration
    Config(ConfigArgs),
}
