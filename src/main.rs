//! setup-texlive CLI entry point

use clap::Parser;
use console::style;
use setup_texlive::cli::{Cli, Commands};
use setup_texlive::config::ConfigManager;
use setup_texlive::error::{collect_notes, SetupResult};
use setup_texlive::runner::Runner;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("{:?}", e);
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            } else if e.is_retryable() {
                eprintln!("{} re-running the job later may succeed", style("Hint:").yellow());
            }
            let runner = Runner::detect();
            for note in collect_notes(&e) {
                runner.notice(&note);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> SetupResult<()> {
    let cli = Cli::parse();

    // 0 = warn, 1 = info, 2+ = debug; RUNNER_DEBUG turns on debug in CI
    let runner_debug = Runner::detect().is_debug();
    let filter = match cli.verbose {
        _ if runner_debug => EnvFilter::new("setup_texlive=debug"),
        0 => EnvFilter::new("setup_texlive=warn"),
        1 => EnvFilter::new("setup_texlive=info"),
        _ => EnvFilter::new("setup_texlive=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;
    debug!("Loaded configuration from {}", config_manager.path().display());

    match cli.command {
        Commands::Run(args) => setup_texlive::cli::commands::run(args, &config).await,
        Commands::Post(args) => setup_texlive::cli::commands::post(args, &config).await,
    }
}
