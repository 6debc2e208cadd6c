//! CLI argument definitions using clap derive
//!
//! Every `run` argument can also be supplied through the environment variable
//! the GitHub Actions runner sets for the matching action input.

use clap::builder::BoolishValueParser;
use crate::config::CONFIG_ENV;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// setup-texlive - TeX Live installer and cache manager for CI
///
/// Installs a TeX Live release, restoring it from a cache when possible,
/// and saves the installation again once the job has succeeded.
#[derive(Parser, Debug)]
#[command(name = "setup-texlive")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = CONFIG_ENV)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Restore or install TeX Live (main phase)
    Run(RunArgs),

    /// Save the installation to the cache (post phase)
    Post(PostArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// TeX Live version to install (`latest` or a year)
    #[arg(long, env = "INPUT_VERSION", default_value = "latest")]
    pub texlive_version: String,

    /// Enable the installation cache
    #[arg(
        long,
        env = "INPUT_CACHE",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub cache: bool,

    /// Packages to install (whitespace separated, `#` comments)
    #[arg(long, env = "INPUT_PACKAGES")]
    pub packages: Option<String>,

    /// File listing packages to install
    #[arg(long, env = "INPUT_PACKAGE-FILE")]
    pub package_file: Option<PathBuf>,

    /// Installation prefix
    #[arg(long, env = "INPUT_PREFIX")]
    pub prefix: Option<PathBuf>,

    /// Installation directory (defaults to `<prefix>/<version>`)
    #[arg(long, env = "INPUT_TEXDIR")]
    pub texdir: Option<PathBuf>,

    /// Register and pin the TLContrib repository
    #[arg(
        long,
        env = "INPUT_TLCONTRIB",
        default_value_t = false,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub tlcontrib: bool,

    /// Update all packages when restoring from cache
    #[arg(
        long,
        env = "INPUT_UPDATE-ALL-PACKAGES",
        default_value_t = false,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub update_all_packages: bool,

    /// Package repository to install from, overriding mirror selection
    #[arg(long, env = "INPUT_REPOSITORY")]
    pub repository: Option<String>,

    /// Identifier shared by the run and post commands of one job
    #[arg(long, env = "SETUP_TEXLIVE_RUN_ID")]
    pub run_id: Option<String>,
}

/// Arguments for the post command
#[derive(Parser, Debug)]
pub struct PostArgs {
    /// Identifier shared by the run and post commands of one job
    #[arg(long, env = "SETUP_TEXLIVE_RUN_ID")]
    pub run_id: Option<String>,
}
