//! Implementation of the `titrate config` command.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tokio::fs;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::config::loader::CONFIG_DIR;
use crate::infrastructure::config::ConfigLoader;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Check the effective configuration and report the session it defines
    Validate,
    /// Write a default .titrate/config.yaml
    Init {
        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,

        /// Target directory (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

#[derive(Debug, Serialize)]
pub struct ShowOutput {
    pub config: Config,
}

impl CommandOutput for ShowOutput {
    fn to_human(&self) -> String {
        serde_yaml::to_string(&self.config).unwrap_or_default()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct ValidateOutput {
    pub valid: bool,
    pub conditions: usize,
    pub sequence_length: u32,
    pub trial_budget: u32,
}

impl ValidateOutput {
    pub fn for_config(config: &Config) -> Self {
        let session = &config.session;
        let conditions = session.condition_count();
        Self {
            valid: true,
            conditions,
            sequence_length: session
                .repeats_per_condition
                .saturating_mul(u32::try_from(conditions).unwrap_or(u32::MAX)),
            trial_budget: session.effective_trial_budget(),
        }
    }
}

impl CommandOutput for ValidateOutput {
    fn to_human(&self) -> String {
        format!(
            "Configuration is valid: {} conditions, {} sequence entries, at most {} titration trials",
            self.conditions, self.sequence_length, self.trial_budget
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub path: PathBuf,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        self.message.clone()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: ConfigArgs, config: Config, json_mode: bool) -> Result<()> {
    match args.command {
        ConfigCommand::Show => {
            output(&ShowOutput { config }, json_mode);
            Ok(())
        }
        ConfigCommand::Validate => {
            ConfigLoader::validate(&config)?;
            output(&ValidateOutput::for_config(&config), json_mode);
            Ok(())
        }
        ConfigCommand::Init { force, path } => {
            let result = write_default_config(&path, force).await?;
            output(&result, json_mode);
            Ok(())
        }
    }
}

/// Write the built-in defaults to `<root>/.titrate/config.yaml`
pub async fn write_default_config(root: &std::path::Path, force: bool) -> Result<InitOutput> {
    let dir = root.join(CONFIG_DIR);
    let path = dir.join("config.yaml");

    if path.exists() && !force {
        return Ok(InitOutput {
            success: false,
            message: format!("{} already exists. Use --force to overwrite.", path.display()),
            path,
        });
    }

    fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let yaml = serde_yaml::to_string(&Config::default()).context("Failed to serialize defaults")?;
    fs::write(&path, yaml)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(InitOutput {
        success: true,
        message: format!("Wrote default configuration to {}", path.display()),
        path,
    })
}
