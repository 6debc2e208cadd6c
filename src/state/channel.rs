//! Cross-phase key/value channels
//!
//! Values written in the main phase must be readable in the post phase of the
//! same job run and nowhere else.

use crate::error::{SetupError, SetupResult};
use crate::runner::append_key_value;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Storage that survives from the main phase to the post phase
#[async_trait]
pub trait StateChannel: Send + Sync {
    async fn put(&self, name: &str, value: &str) -> SetupResult<()>;

    /// Value recorded by the main phase, `None` if nothing was recorded
    async fn get(&self, name: &str) -> SetupResult<Option<String>>;

    /// Forget a value once it has been consumed
    async fn clear(&self, name: &str) -> SetupResult<()>;
}

/// GitHub Actions step state: written to `GITHUB_STATE`, exposed to the
/// post step as `STATE_<name>`
#[derive(Debug, Clone)]
pub struct GithubActionsState {
    state_file: PathBuf,
}

impl GithubActionsState {
    pub fn new(state_file: impl Into<PathBuf>) -> Self {
        Self {
            state_file: state_file.into(),
        }
    }

    /// Channel for the current step, if the runner provides one
    pub fn from_env() -> Option<Self> {
        std::env::var_os("GITHUB_STATE")
            .filter(|v| !v.is_empty())
            .map(Self::new)
    }
}

#[async_trait]
impl StateChannel for GithubActionsState {
    async fn put(&self, name: &str, value: &str) -> SetupResult<()> {
        debug!("Saving state {} to {}", name, self.state_file.display());
        append_key_value(&self.state_file, name, value)
    }

    async fn get(&self, name: &str) -> SetupResult<Option<String>> {
        Ok(std::env::var(format!("STATE_{}", name))
            .ok()
            .filter(|v| !v.is_empty()))
    }

    async fn clear(&self, _name: &str) -> SetupResult<()> {
        // The runner drops step state when the job ends.
        Ok(())
    }
}

/// One file per value under `<dir>/<run-id>/`
#[derive(Debug, Clone)]
pub struct FileState {
    dir: PathBuf,
}

impl FileState {
    pub fn new(root: &Path, run_id: &str) -> Self {
        Self {
            dir: root.join(sanitize(run_id)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(sanitize(name))
    }
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Run identifier from the CI environment, `<run id>-<attempt>`
pub fn run_id_from_env() -> Option<String> {
    let id = std::env::var("GITHUB_RUN_ID").ok().filter(|v| !v.is_empty())?;
    let attempt = std::env::var("GITHUB_RUN_ATTEMPT")
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "1".to_string());
    Some(format!("{}-{}", id, attempt))
}

#[async_trait]
impl StateChannel for FileState {
    async fn put(&self, name: &str, value: &str) -> SetupResult<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| SetupError::io(format!("creating {}", self.dir.display()), e))?;

        let path = self.path(name);
        fs::write(&path, value)
            .await
            .map_err(|e| SetupError::io(format!("writing state file {}", path.display()), e))?;
        debug!("Saved state {} to {}", name, path.display());
        Ok(())
    }

    async fn get(&self, name: &str) -> SetupResult<Option<String>> {
        let path = self.path(name);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| SetupError::io(format!("reading state file {}", path.display()), e))?;
        Ok(Some(content))
    }

    async fn clear(&self, name: &str) -> SetupResult<()> {
        let path = self.path(name);
        if path.exists() {
            fs::remove_file(&path)
                .await
                .map_err(|e| SetupError::io(format!("deleting state file {}", path.display()), e))?;
        }
        // Only succeeds once the run directory is empty.
        let _ = fs::remove_dir(&self.dir).await;
        Ok(())
    }
}
