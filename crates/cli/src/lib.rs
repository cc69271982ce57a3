pub mod commands;
pub mod display;
pub mod ingest;
pub mod logging;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use affinity_core::config::{AppConfig, LoadOptions};
use commands::graph::GraphArgs;
use commands::recommend::RecommendArgs;

#[derive(Debug, Parser)]
#[command(
    name = "affinity",
    about = "Affinity recommendation CLI",
    long_about = "Build a user/product affinity graph from an interaction history and rank products.",
    after_help = "Examples:\n  affinity recommend --input history.json --user u001\n  affinity recommend --input history.json --user u001 --strategy weighted_bfs --adjacency shared_product\n  affinity graph --input history.json --transpose\n  affinity config"
)]
pub struct Cli {
    #[arg(long = "config-file", global = true, help = "Path to an affinity.toml config file")]
    config_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Rank products for one user from a JSON interaction history")]
    Recommend(RecommendArgs),
    #[command(about = "Print the aggregated interaction graph as JSON")]
    Graph(GraphArgs),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Invalid config still reaches the command, which reports it with exit code 2.
    let options = LoadOptions { config_path: cli.config_file.clone(), ..LoadOptions::default() };
    let logging = AppConfig::load(options)
        .map(|config| config.logging)
        .unwrap_or_else(|_| AppConfig::default().logging);
    logging::init(&logging);

    let result = match &cli.command {
        Command::Recommend(args) => commands::recommend::run(cli.config_file.clone(), args),
        Command::Graph(args) => commands::graph::run(cli.config_file.clone(), args),
        Command::Config => commands::config::run(cli.config_file.clone()),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
