//! Subprocess execution
//!
//! Every external tool (install-tl, tlmgr, tar) goes through `exec`, which
//! captures both streams so callers can inspect them for known failures.

use crate::error::{SetupError, SetupResult};
use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Max number of output lines kept in error messages.
const ERROR_TAIL_LINES: usize = 50;

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Convert a non-zero exit into `CommandExecution`
    pub fn check(self, command: &str) -> SetupResult<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(SetupError::command_exec(
                command,
                self.exit_code,
                tail(&self.stdout, &self.stderr),
            ))
        }
    }
}

/// Last `ERROR_TAIL_LINES` lines of combined output
pub(crate) fn tail(stdout: &str, stderr: &str) -> String {
    let lines: Vec<&str> = stdout.lines().chain(stderr.lines()).collect();
    let start = lines.len().saturating_sub(ERROR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Run a program to completion and capture its output
pub async fn exec<I, S>(program: &str, args: I) -> SetupResult<ExecOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    exec_with_path(program, args, None).await
}

/// Like `exec`, with `bin_dir` prepended to the child's `PATH`
pub async fn exec_with_path<I, S>(
    program: &str,
    args: I,
    bin_dir: Option<&Path>,
) -> SetupResult<ExecOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<_> = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();
    let shown = format!(
        "{} {}",
        program,
        args.iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );
    debug!("Executing: {}", shown);

    let mut command = Command::new(program);
    command
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = bin_dir {
        command.env("PATH", prepend_path(dir, std::env::var_os("PATH"))?);
    }

    let output = command
        .output()
        .await
        .map_err(|e| SetupError::command_failed(shown.clone(), e))?;

    Ok(ExecOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// `dir` followed by the entries of `current`
fn prepend_path(dir: &Path, current: Option<OsString>) -> SetupResult<OsString> {
    let mut paths = vec![dir.to_path_buf()];
    if let Some(current) = current {
        paths.extend(std::env::split_paths(&current));
    }
    std::env::join_paths(paths).map_err(|e| SetupError::Internal(format!("joining PATH: {}", e)))
}
