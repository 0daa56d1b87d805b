//! Slipway CLI - GNU make build scripts from a project description

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("slipway=debug")
    } else {
        EnvFilter::new("slipway=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let global = cli.global();
    match cli.command {
        Commands::Generate(args) => commands::generate::execute(&global, args),
        Commands::Linkplan(args) => commands::linkplan::execute(&global, args),
        Commands::Clean(args) => commands::clean::execute(&global, args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
