//! CI runner integration
//!
//! Speaks the GitHub Actions file-command protocol (`GITHUB_OUTPUT`,
//! `GITHUB_PATH`, `GITHUB_STATE`) and log grouping. Outside of Actions the
//! same calls degrade to plain console output.

use crate::error::{SetupError, SetupResult};
use console::style;
use std::fs::OpenOptions;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Handle to the runner's side channels
#[derive(Debug, Clone, Default)]
pub struct Runner {
    github_actions: bool,
    debug: bool,
    output_file: Option<PathBuf>,
    path_file: Option<PathBuf>,
}

impl Runner {
    /// Detect the runner from the process environment
    pub fn detect() -> Self {
        Self {
            github_actions: std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true"),
            debug: std::env::var("RUNNER_DEBUG").is_ok_and(|v| v == "1"),
            output_file: env_path("GITHUB_OUTPUT"),
            path_file: env_path("GITHUB_PATH"),
        }
    }

    /// A runner with no side channels (local use, tests)
    pub fn local() -> Self {
        Self::default()
    }

    pub fn is_github_actions(&self) -> bool {
        self.github_actions
    }

    /// Whether step debug logging was requested
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Run a future inside a collapsible log group
    pub async fn group<F, T>(&self, title: &str, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        if self.github_actions {
            println!("::group::{}", title);
        } else {
            println!("{}", style(title).cyan().bold());
        }
        let result = fut.await;
        if self.github_actions {
            println!("::endgroup::");
        }
        result
    }

    /// Surface a notice annotation
    pub fn notice(&self, message: &str) {
        if self.github_actions {
            println!("::notice::{}", escape_data(message));
        } else {
            println!("{} {}", style("Note:").yellow(), message);
        }
    }

    /// Set a step output
    pub fn set_output(&self, name: &str, value: &str) -> SetupResult<()> {
        debug!("Output {}={}", name, value);
        match &self.output_file {
            Some(path) => append_key_value(path, name, value),
            None => Ok(()),
        }
    }

    /// Prepend a directory to `PATH` for later steps
    pub fn add_path(&self, dir: &Path) -> SetupResult<()> {
        match &self.path_file {
            Some(path_file) => {
                append_line(path_file, &dir.to_string_lossy())?;
                info!("Added {} to PATH", dir.display());
            }
            None => info!("Add {} to PATH to use TeX Live", dir.display()),
        }
        Ok(())
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Escape a message for a workflow command
fn escape_data(s: &str) -> String {
    s.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

/// Append a `name<<delimiter` block to a file command
pub(crate) fn append_key_value(path: &Path, name: &str, value: &str) -> SetupResult<()> {
    let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
    if name.contains(&delimiter) || value.contains(&delimiter) {
        return Err(SetupError::Internal(format!(
            "value for {} contains the file command delimiter",
            name
        )));
    }
    append_line(path, &format!("{}<<{}\n{}\n{}", name, delimiter, value, delimiter))
}

fn append_line(path: &Path, line: &str) -> SetupResult<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| SetupError::io(format!("opening {}", path.display()), e))?;
    writeln!(file, "{}", line)
        .map_err(|e| SetupError::io(format!("writing {}", path.display()), e))
}
