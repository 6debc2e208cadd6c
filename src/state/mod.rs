//! Installation state carried from the main phase to the post phase
//!
//! The main phase records which key to save under and which directory to
//! save. The post phase saves only when both are present; a primary cache hit
//! records the key alone because nothing changed.

pub mod channel;

pub use channel::{run_id_from_env, FileState, GithubActionsState, StateChannel};

use crate::error::{SetupError, SetupResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Name under which the state is stored in a channel
pub const STATE_NAME: &str = "SETUP_TEXLIVE";

/// What the post phase owes the cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationState {
    /// Primary cache key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Installation directory to save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texdir: Option<PathBuf>,
}

impl InstallationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a cache save is owed
    pub fn filled(&self) -> bool {
        self.key.is_some() && self.texdir.is_some()
    }

    /// Record the state for the post phase
    pub async fn save(&self, channel: &dyn StateChannel) -> SetupResult<()> {
        let json = serde_json::to_string(self)?;
        debug!("Saving state {}", json);
        channel
            .put(STATE_NAME, &json)
            .await
            .map_err(|e| SetupError::StatePersist(e.to_string()))
    }

    /// State recorded by the main phase, `None` if it never got that far
    pub async fn load(channel: &dyn StateChannel) -> SetupResult<Option<Self>> {
        let Some(json) = channel.get(STATE_NAME).await? else {
            return Ok(None);
        };
        debug!("Loaded state {}", json);
        let state: Self = serde_json::from_str(&json)?;
        Ok(Some(state))
    }
}
