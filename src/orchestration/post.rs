//! Post phase: save the installation if the main phase left a save owed

use crate::cache::CacheService;
use crate::error::SetupResult;
use crate::state::{InstallationState, StateChannel, STATE_NAME};
use tracing::{info, warn};

/// What the post phase did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    /// The main phase recorded no state
    NoState,
    /// Nothing changed since the last save
    NothingToSave,
    Saved,
    /// The save was attempted and failed; the job is not failed for it
    SaveFailed,
}

/// Run the post phase
pub async fn run_post(
    cache: Option<&dyn CacheService>,
    channel: &dyn StateChannel,
) -> SetupResult<PostOutcome> {
    let Some(state) = InstallationState::load(channel).await? else {
        info!("No installation state recorded, nothing to do");
        return Ok(PostOutcome::NoState);
    };

    let outcome = match (&state.key, &state.texdir, cache) {
        (Some(key), Some(texdir), Some(cache)) => match cache.save(texdir, key).await {
            Ok(()) => PostOutcome::Saved,
            Err(e) => {
                warn!("Failed to save cache: {}", e);
                PostOutcome::SaveFailed
            }
        },
        (Some(_), Some(_), None) => {
            warn!("Cache is disabled, skipping save");
            PostOutcome::NothingToSave
        }
        _ => {
            info!("Cache is up to date, nothing to save");
            PostOutcome::NothingToSave
        }
    };

    channel.clear(STATE_NAME).await?;
    Ok(outcome)
}
