use clap::Parser;
use std::path::PathBuf;
use titrate::cli::commands::config::ConfigCommand;
use titrate::cli::{Cli, Commands};

#[test]
fn test_parse_run_defaults() {
    let cli = Cli::try_parse_from(["titrate", "run"]).unwrap();

    assert!(!cli.json);
    match cli.command {
        Commands::Run(args) => {
            assert!(args.seed.is_none());
            assert!(args.trial_log.is_none());
            assert!(!args.no_clear);
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_run_with_overrides() {
    let cli = Cli::try_parse_from([
        "titrate",
        "run",
        "--seed",
        "42",
        "--trial-log",
        "out/session.jsonl",
        "--repeats",
        "6",
        "--budget",
        "30",
        "--no-clear",
    ])
    .unwrap();

    match cli.command {
        Commands::Run(args) => {
            assert_eq!(args.seed, Some(42));
            assert_eq!(args.trial_log, Some(PathBuf::from("out/session.jsonl")));
            assert_eq!(args.repeats, Some(6));
            assert_eq!(args.budget, Some(30));
            assert!(args.no_clear);
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_simulate() {
    let cli = Cli::try_parse_from([
        "titrate", "simulate", "--k", "0.05", "--h", "2.5", "--lapse-rate", "0.1", "--json",
    ])
    .unwrap();

    assert!(cli.json, "--json is global");
    match cli.command {
        Commands::Simulate(args) => {
            assert!((args.k - 0.05).abs() < f64::EPSILON);
            assert!((args.h - 2.5).abs() < f64::EPSILON);
            assert!((args.lapse_rate - 0.1).abs() < f64::EPSILON);
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_simulate_defaults() {
    let cli = Cli::try_parse_from(["titrate", "simulate"]).unwrap();
    match cli.command {
        Commands::Simulate(args) => {
            assert!((args.k - 0.01).abs() < f64::EPSILON);
            assert!((args.h - 1.0).abs() < f64::EPSILON);
            assert!(args.lapse_rate.abs() < f64::EPSILON);
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_config_subcommands() {
    let cli = Cli::try_parse_from(["titrate", "--config", "custom.yaml", "config", "show"]).unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
    assert!(matches!(
        cli.command,
        Commands::Config(ref args) if matches!(args.command, ConfigCommand::Show)
    ));

    let cli = Cli::try_parse_from(["titrate", "config", "validate"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Config(ref args) if matches!(args.command, ConfigCommand::Validate)
    ));

    let cli = Cli::try_parse_from(["titrate", "config", "init", "--force", "/tmp/project"]).unwrap();
    match cli.command {
        Commands::Config(args) => match args.command {
            ConfigCommand::Init { force, path } => {
                assert!(force);
                assert_eq!(path, PathBuf::from("/tmp/project"));
            }
            _ => panic!("Wrong config command"),
        },
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_unknown_command_is_rejected() {
    assert!(Cli::try_parse_from(["titrate", "calibrate"]).is_err());
}

#[test]
fn test_cli_definition_is_consistent() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}
