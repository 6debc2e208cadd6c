//! setup-texlive - TeX Live for CI jobs
//!
//! Installs TeX Live on a CI runner, caching the installation between runs.
//! The `run` phase restores or installs; the `post` phase saves the
//! installation once the job has succeeded.

pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod orchestration;
pub mod process;
pub mod runner;
pub mod state;
pub mod texlive;

pub use error::{SetupError, SetupResult};
