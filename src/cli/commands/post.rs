//! Post command - save the installation once the job has succeeded

use crate::cache::{CacheService, DirectoryCache};
use crate::cli::args::PostArgs;
use crate::cli::commands::state_channel;
use crate::config::Config;
use crate::error::SetupResult;
use crate::orchestration::{run_post, PostOutcome};
use crate::runner::Runner;
use tracing::debug;

/// Execute the post command
pub async fn execute(args: PostArgs, config: &Config) -> SetupResult<()> {
    let runner = Runner::detect();
    let channel = state_channel(&runner, config, args.run_id);

    let cache = DirectoryCache::new(config.cache.dir()).with_keep(config.cache.keep);
    let cache: Option<&dyn CacheService> = config.cache.enabled.then_some(&cache as &dyn CacheService);

    let outcome = runner
        .group("Saving cache", run_post(cache, channel.as_ref()))
        .await?;
    debug!("Post phase finished: {:?}", outcome);

    if outcome == PostOutcome::SaveFailed {
        runner.notice("The TeX Live installation could not be cached; the next run will install it again");
    }
    Ok(())
}
