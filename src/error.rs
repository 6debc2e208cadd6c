//! Error types for setup-texlive
//!
//! All modules use `SetupResult<T>` as their return type.

use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for setup-texlive operations
pub type SetupResult<T> = Result<T, SetupError>;

/// Maximum depth followed when collecting notes from a cause chain.
const NOTE_DEPTH: usize = 10;

/// All errors that can occur while setting up TeX Live
#[derive(Error, Debug)]
pub enum SetupError {
    // Version errors
    #[error("Invalid TeX Live version: {0}")]
    InvalidVersion(String),

    #[error("TeX Live {requested} has not been released yet (latest: {latest})")]
    VersionNotReleased { requested: String, latest: String },

    // Installer errors
    #[error("The repository is not compatible with this version of install-tl")]
    RepositoryVersionIncompatible { remote_version: Option<String> },

    #[error(
        "Unexpected install-tl version: {} (expected {expected})",
        .found.as_deref().unwrap_or("unknown")
    )]
    UnexpectedVersion {
        expected: String,
        found: Option<String>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Unable to locate TeX Live's binary directory in {}", .texdir.display())]
    BinDirNotFound {
        texdir: PathBuf,
        #[source]
        source: Box<SetupError>,
    },

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    // Release data errors
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid bundled release data: {0}")]
    ReleaseData(String),

    // Network errors
    #[error("HTTP request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // State errors
    #[error("Failed to persist installation state: {0}")]
    StatePersist(String),

    // Cache errors
    #[error("Cache entry {key} could not be transferred: {reason}")]
    CacheTransfer { key: String, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command `{command}` exited with code {code}: {stderr}")]
    CommandExecution {
        command: String,
        code: i32,
        stderr: String,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SetupError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, code: i32, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            code,
            stderr: stderr.into(),
        }
    }

    /// Create an HTTP error for a URL
    pub fn http(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Http {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if re-running the job later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RepositoryVersionIncompatible { .. } | Self::Http { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::VersionNotReleased { .. } => Some("Use `latest` or an already released year"),
            Self::UnsupportedPlatform(_) => Some("Only Linux and macOS runners are supported"),
            Self::BinDirNotFound { .. } => Some("Remove the cached installation and run again"),
            _ => None,
        }
    }

    /// Remediation note attached to this error itself (not its causes)
    pub fn note(&self) -> Option<String> {
        match self {
            Self::RepositoryVersionIncompatible { remote_version } => {
                let mut note = String::from(
                    "The CTAN mirrors may not have completed synchronisation \
                     against a release of new version of TeX Live.",
                );
                if let Some(remote) = remote_version {
                    note.push_str(&format!(" The repository still serves TeX Live {}.", remote));
                }
                note.push_str(" Please try re-running the workflow after a while.");
                Some(note)
            }
            _ => None,
        }
    }
}

/// Collect the unique remediation notes of an error and its causes.
///
/// Causes are visited before the errors that wrap them. Each note appears once.
pub fn collect_notes(error: &(dyn std::error::Error + 'static)) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut notes = Vec::new();
    let mut chain = Vec::new();

    let mut current = Some(error);
    while let Some(err) = current {
        if chain.len() >= NOTE_DEPTH {
            break;
        }
        chain.push(err);
        current = err.source();
    }

    for err in chain.into_iter().rev() {
        let setup_error = err
            .downcast_ref::<SetupError>()
            .or_else(|| err.downcast_ref::<Box<SetupError>>().map(|b| b.as_ref()));
        let note = setup_error.and_then(SetupError::note);
        if let Some(note) = note {
            if seen.insert(note.clone()) {
                notes.push(note);
            }
        }
    }
    notes
}
