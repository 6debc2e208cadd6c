//! Run command - restore or install TeX Live

use crate::cache::{current_platform, CacheService, DirectoryCache, PackageSet};
use crate::cli::args::RunArgs;
use crate::cli::commands::state_channel;
use crate::clock::SystemClock;
use crate::config::Config;
use crate::error::{SetupError, SetupResult};
use crate::http::UreqClient;
use crate::orchestration::{run_main, Collaborators, SetupOptions};
use crate::runner::Runner;
use crate::texlive::ctan::CtanApi;
use crate::texlive::install_tl::InstallTlSource;
use crate::texlive::tlnet::with_trailing_slash;
use crate::texlive::{tlnet, ReleaseData, RequestedVersion, TexmfSettings, Tlmgr};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

/// Execute the run command
pub async fn execute(args: RunArgs, config: &Config) -> SetupResult<()> {
    let runner = Runner::detect();
    let requested: RequestedVersion = args.texlive_version.parse()?;
    let packages = collect_packages(args.packages.as_deref(), args.package_file.as_deref()).await?;

    let clock = SystemClock;
    let http = UreqClient::new(config.http.timeout());
    let ctan = CtanApi::new(&http, config.http.ctan_api.clone());
    let mut releases = ReleaseData::setup(&ctan, &clock).await?;
    let version = requested.resolve(&releases)?;
    info!("TeX Live version: {}", version);

    let prefix = non_empty(args.prefix).unwrap_or_else(|| {
        default_prefix(
            std::env::var_os("TEXLIVE_INSTALL_PREFIX"),
            std::env::var_os("RUNNER_TEMP"),
        )
    });
    let texdir = non_empty(args.texdir).unwrap_or_else(|| prefix.join(version.to_string()));
    let texmf = TexmfSettings::from_env(version);

    let repository = match args.repository.filter(|r| !r.trim().is_empty()) {
        Some(url) => with_trailing_slash(url.trim()),
        None => tlnet::resolve(version, &mut releases, &config.mirrors, &http, &clock).await?,
    };
    info!("Repository: {}", repository);

    let tlcontrib = if !args.tlcontrib {
        None
    } else if releases.is_latest(version) {
        Some(tlnet::contrib(&config.mirrors))
    } else {
        warn!("TLContrib is only available for the latest version; ignoring");
        None
    };

    let workdir = std::env::temp_dir().join(format!("setup-texlive-{}", Uuid::new_v4()));
    let installer = InstallTlSource::new(&http, repository, workdir.clone());
    let tlmgr = Tlmgr::new(&texdir, runner.clone());
    let channel = state_channel(&runner, config, args.run_id);

    let cache = DirectoryCache::new(config.cache.dir()).with_keep(config.cache.keep);
    let cache_enabled = args.cache && config.cache.enabled;
    let cache: Option<&dyn CacheService> = cache_enabled.then_some(&cache as &dyn CacheService);

    let (platform, arch) = current_platform();
    let options = SetupOptions {
        version,
        prefix,
        texdir,
        texmf,
        packages,
        tlcontrib,
        update_all_packages: args.update_all_packages,
        platform: platform.to_string(),
        arch: arch.to_string(),
    };
    let ctx = Collaborators {
        releases: &releases,
        cache,
        installer: &installer,
        tlmgr: &tlmgr,
        state: channel.as_ref(),
        runner: &runner,
    };

    let result = run_main(&options, &ctx).await;
    if workdir.exists() {
        let _ = fs::remove_dir_all(&workdir).await;
    }
    let outcome = result?;

    for (name, value) in outcome.outputs() {
        runner.set_output(name, &value)?;
    }
    info!(
        "TeX Live {} ready in {} (cache: {})",
        outcome.version,
        options.texdir.display(),
        outcome.cache
    );
    Ok(())
}

fn non_empty(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty())
}

/// `TEXLIVE_INSTALL_PREFIX`, else `$RUNNER_TEMP/setup-texlive`, else the temp dir
fn default_prefix(
    install_prefix: Option<std::ffi::OsString>,
    runner_temp: Option<std::ffi::OsString>,
) -> PathBuf {
    if let Some(prefix) = install_prefix.filter(|v| !v.is_empty()) {
        return PathBuf::from(prefix);
    }
    runner_temp
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
        .join("setup-texlive")
}

/// Merge the `packages` input with the contents of `package-file`
async fn collect_packages(packages: Option<&str>, file: Option<&Path>) -> SetupResult<PackageSet> {
    let mut set = PackageSet::parse(packages.unwrap_or_default());
    if let Some(path) = file.filter(|p| !p.as_os_str().is_empty()) {
        let text = fs::read_to_string(path)
            .await
            .map_err(|e| SetupError::io(format!("reading package file {}", path.display()), e))?;
        set.extend(PackageSet::parse(&text).to_vec());
    }
    Ok(set)
}
