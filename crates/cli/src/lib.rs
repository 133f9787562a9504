pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "tablescout",
    about = "Tablescout operator CLI",
    long_about = "Inspect configuration, check provider readiness, and run one-shot venue searches.",
    after_help = "Examples:\n  tablescout doctor --json\n  tablescout config\n  tablescout search --query 火锅 --city 北京\n  tablescout recommend --taste 辣 --budget-max 80"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, provider key readiness, and provider connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Run a one-shot keyword search and print the rendered result")]
    Search(commands::search::SearchArgs),
    #[command(about = "Run a one-shot recommendation and print the rendered result")]
    Recommend(commands::recommend::RecommendArgs),
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Search(args) => commands::search::run(args),
        Command::Recommend(args) => commands::recommend::run(args),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
