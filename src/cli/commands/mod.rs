//! CLI command implementations

pub mod post;
pub mod run;

pub use post::execute as post;
pub use run::execute as run;

use crate::config::Config;
use crate::runner::Runner;
use crate::state::{run_id_from_env, FileState, GithubActionsState, StateChannel};
use tracing::debug;

/// Run id used when neither the CI environment nor the user provides one
const LOCAL_RUN_ID: &str = "local";

/// Channel carrying state from `run` to `post` of the same job
pub(crate) fn state_channel(
    runner: &Runner,
    config: &Config,
    run_id: Option<String>,
) -> Box<dyn StateChannel> {
    if runner.is_github_actions() {
        if let Some(channel) = GithubActionsState::from_env() {
            debug!("Using GitHub Actions step state");
            return Box::new(channel);
        }
    }

    let run_id = run_id
        .filter(|id| !id.is_empty())
        .or_else(run_id_from_env)
        .unwrap_or_else(|| LOCAL_RUN_ID.to_string());
    let channel = FileState::new(&config.state.dir(), &run_id);
    debug!("Using state directory {}", channel.dir().display());
    Box::new(channel)
}
