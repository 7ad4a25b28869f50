//! Titrate CLI entry point.

use clap::Parser;

use titrate::cli::{Cli, Commands};
use titrate::{ConfigLoader, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => titrate::cli::handle_error(err, cli.json),
    };

    let _logger = match LoggerImpl::init(&config.logging) {
        Ok(logger) => logger,
        Err(err) => titrate::cli::handle_error(err, cli.json),
    };

    let result = match cli.command {
        Commands::Run(args) => titrate::cli::commands::run::execute(args, config, cli.json).await,
        Commands::Simulate(args) => {
            titrate::cli::commands::simulate::execute(args, config, cli.json).await
        }
        Commands::Config(args) => titrate::cli::commands::config::execute(args, config, cli.json).await,
    };

    if let Err(err) = result {
        titrate::cli::handle_error(err, cli.json);
    }
}
