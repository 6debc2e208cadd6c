//! Main phase: restore or install, reconcile, record state
//!
//! ```text
//! cache disabled ──────────────────────────► install ─┐
//! cache enabled ─► restore ─┬─ primary ──────────────┤
//!                           ├─ secondary ────────────┤
//!                           └─ none ──────► install ─┤
//!                                                    ▼
//!   path ─► self-update* ─► TEXMF* ─► tlcontrib? ─► packages? ─► save state
//! ```
//!
//! `*` only when something was restored. Every step finishes before the next
//! one starts.

use crate::cache::{derive_keys, CacheResult, CacheService, PackageSet};
use crate::error::SetupResult;
use crate::orchestration::reconcile::reconcile_texmf;
use crate::runner::Runner;
use crate::state::{InstallationState, StateChannel};
use crate::texlive::install_tl::{InstallerSource, Profile};
use crate::texlive::{PackageManager, ReleaseData, TexmfSettings, UpdateOptions, Version};
use std::path::PathBuf;
use tracing::{info, warn};

/// Tag under which TLContrib is registered with tlmgr
pub const TLCONTRIB_TAG: &str = "tlcontrib";

/// Everything the main phase needs to know about the requested installation
#[derive(Debug, Clone)]
pub struct SetupOptions {
    pub version: Version,
    pub prefix: PathBuf,
    pub texdir: PathBuf,
    pub texmf: TexmfSettings,
    pub packages: PackageSet,
    /// TLContrib repository URL, when enabled
    pub tlcontrib: Option<String>,
    pub update_all_packages: bool,
    pub platform: String,
    pub arch: String,
}

/// The collaborators the main phase drives
pub struct Collaborators<'a> {
    pub releases: &'a ReleaseData,
    /// `None` when caching is disabled
    pub cache: Option<&'a dyn CacheService>,
    pub installer: &'a dyn InstallerSource,
    pub tlmgr: &'a dyn PackageManager,
    pub state: &'a dyn StateChannel,
    pub runner: &'a Runner,
}

/// Result of a completed main phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainOutcome {
    pub version: Version,
    pub cache: CacheResult,
    pub state: InstallationState,
}

impl MainOutcome {
    /// Step outputs: `cache-hit`, `cache-restored`, `version`
    pub fn outputs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("cache-hit", self.cache.is_hit().to_string()),
            ("cache-restored", self.cache.to_string()),
            ("version", self.version.to_string()),
        ]
    }
}

/// Run the main phase to completion
pub async fn run_main(options: &SetupOptions, ctx: &Collaborators<'_>) -> SetupResult<MainOutcome> {
    let mut state = InstallationState::new();
    let version = options.version;

    let result = match ctx.cache {
        Some(cache) => {
            let keys = derive_keys(&options.platform, &options.arch, version, &options.packages);
            let restored = ctx
                .runner
                .group("Restoring cache", async {
                    cache
                        .restore(&options.texdir, &keys.primary, &keys.fallbacks)
                        .await
                })
                .await;
            let result = restored.unwrap_or_else(|e| {
                warn!("Failed to restore cache: {}", e);
                CacheResult::None
            });
            info!("Cache restored: {}", result);

            state.key = Some(keys.primary);
            if result != CacheResult::Primary {
                state.texdir = Some(options.texdir.clone());
            }
            result
        }
        None => {
            info!("Cache is disabled");
            CacheResult::None
        }
    };

    if !result.is_hit() {
        ctx.runner
            .group("Installing TeX Live", async {
                let installer = ctx.installer.acquire(version).await?;
                let profile = Profile::new(
                    version,
                    &options.prefix,
                    &options.texdir,
                    options.texmf.clone(),
                );
                installer.run(&profile).await
            })
            .await?;
    }

    ctx.tlmgr.path_add().await?;

    if result.is_hit() {
        if ctx.releases.is_latest(version) {
            ctx.runner
                .group("Updating tlmgr", ctx.tlmgr.update(&[], UpdateOptions::self_only()))
                .await?;
            if options.update_all_packages {
                ctx.runner
                    .group(
                        "Updating packages",
                        ctx.tlmgr.update(&[], UpdateOptions::all_packages()),
                    )
                    .await?;
            }
        }

        ctx.runner
            .group("Adjusting TEXMF", reconcile_texmf(ctx.tlmgr, &options.texmf))
            .await?;
    }

    if let Some(url) = &options.tlcontrib {
        ctx.runner
            .group("Setting up TLContrib", async {
                ctx.tlmgr.repository_add(url, TLCONTRIB_TAG).await?;
                ctx.tlmgr.pinning_add(TLCONTRIB_TAG, "*").await
            })
            .await?;
    }

    if result != CacheResult::Primary && !options.packages.is_empty() {
        ctx.runner
            .group(
                "Installing packages",
                ctx.tlmgr.install(&options.packages.to_vec()),
            )
            .await?;
    }

    state.save(ctx.state).await?;

    Ok(MainOutcome {
        version,
        cache: result,
        state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheKeys;
    use crate::orchestration::testing::{calls, new_log, Call, FakeCache, FakeInstallerSource, FakeTlmgr, Log};
    use crate::state::fake::MemoryState;
    use crate::texlive::releases::BundledReleases;
    use crate::texlive::{Latest, TexmfKey};

    fn releases() -> ReleaseData {
        ReleaseData::from_latest(Latest::new(BundledReleases::load().unwrap()))
    }

    fn options(version: Version, packages: &[&str]) -> SetupOptions {
        SetupOptions {
            version,
            prefix: PathBuf::from("/tmp/setup-texlive"),
            texdir: PathBuf::from(format!("/tmp/setup-texlive/{}", version)),
            texmf: TexmfSettings::defaults(version),
            packages: packages.iter().map(|s| s.to_string()).collect(),
            tlcontrib: None,
            update_all_packages: false,
            platform: "linux".to_string(),
            arch: "x86_64".to_string(),
        }
    }

    fn keys(options: &SetupOptions) -> CacheKeys {
        derive_keys(&options.platform, &options.arch, options.version, &options.packages)
    }

    struct Harness {
        log: Log,
        releases: ReleaseData,
        installer: FakeInstallerSource,
        tlmgr: FakeTlmgr,
        state: MemoryState,
        runner: Runner,
    }

    impl Harness {
        fn new() -> Self {
            let log = new_log();
            Self {
                installer: FakeInstallerSource { log: log.clone() },
                tlmgr: FakeTlmgr::new(&log),
                log,
                releases: releases(),
                state: MemoryState::new(),
                runner: Runner::local(),
            }
        }

        async fn run(&self, options: &SetupOptions, cache: Option<&dyn CacheService>) -> MainOutcome {
            let ctx = Collaborators {
                releases: &self.releases,
                cache,
                installer: &self.installer,
                tlmgr: &self.tlmgr,
                state: &self.state,
                runner: &self.runner,
            };
            run_main(options, &ctx).await.unwrap()
        }

        fn latest(&self) -> Version {
            self.releases.latest().version()
        }

        fn calls(&self) -> Vec<Call> {
            calls(&self.log)
        }

        fn updates(&self) -> Vec<UpdateOptions> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Update(_, options) => Some(options),
                    _ => None,
                })
                .collect()
        }

        fn installs(&self) -> Vec<Vec<String>> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Install(packages) => Some(packages),
                    _ => None,
                })
                .collect()
        }

        fn installed_texlive(&self) -> bool {
            self.calls().iter().any(|c| matches!(c, Call::RunInstaller(_)))
        }

        fn touched_texmf(&self) -> bool {
            self.calls()
                .iter()
                .any(|c| matches!(c, Call::TexmfGet(_) | Call::TexmfSet(..)))
        }
    }

    #[tokio::test]
    async fn cache_disabled_always_installs() {
        let h = Harness::new();
        let opts = options(h.latest(), &[]);

        let outcome = h.run(&opts, None).await;

        assert_eq!(
            h.calls(),
            vec![
                Call::Acquire(opts.version),
                Call::RunInstaller(opts.texdir.clone()),
                Call::PathAdd,
            ]
        );
        assert_eq!(outcome.cache, CacheResult::None);
        assert_eq!(outcome.state, InstallationState::new());
        assert!(!outcome.state.filled());
    }

    #[tokio::test]
    async fn primary_hit_skips_install_and_packages() {
        let h = Harness::new();
        let cache = FakeCache::new(&h.log, CacheResult::Primary);
        let opts = options(h.latest(), &["foo"]);

        let outcome = h.run(&opts, Some(&cache)).await;

        assert!(!h.installed_texlive());
        assert!(h.installs().is_empty());
        assert_eq!(h.updates(), vec![UpdateOptions::self_only()]);
        assert!(h.touched_texmf());
        assert_eq!(outcome.state.key.as_deref(), Some(keys(&opts).primary.as_str()));
        assert!(outcome.state.texdir.is_none());
        assert!(!outcome.state.filled());
    }

    #[tokio::test]
    async fn secondary_hit_installs_requested_packages() {
        let h = Harness::new();
        let cache = FakeCache::new(&h.log, CacheResult::Secondary);
        let opts = options(h.latest(), &["foo", "bar", "baz"]);

        let outcome = h.run(&opts, Some(&cache)).await;

        assert!(!h.installed_texlive());
        assert_eq!(
            h.installs(),
            vec![vec!["bar".to_string(), "baz".to_string(), "foo".to_string()]]
        );
        assert_eq!(h.updates(), vec![UpdateOptions::self_only()]);
        assert!(h.touched_texmf());
        assert!(outcome.state.filled());
        assert_eq!(outcome.state.texdir.as_ref(), Some(&opts.texdir));
    }

    #[tokio::test]
    async fn miss_installs_without_update_or_reconcile() {
        let h = Harness::new();
        let cache = FakeCache::new(&h.log, CacheResult::None);
        let opts = options(h.latest(), &["foo"]);

        let outcome = h.run(&opts, Some(&cache)).await;

        let expected = keys(&opts);
        assert_eq!(
            h.calls(),
            vec![
                Call::Restore {
                    target: opts.texdir.clone(),
                    primary: expected.primary.clone(),
                    fallbacks: expected.fallbacks.clone(),
                },
                Call::Acquire(opts.version),
                Call::RunInstaller(opts.texdir.clone()),
                Call::PathAdd,
                Call::Install(vec!["foo".to_string()]),
            ]
        );
        assert!(outcome.state.filled());
        assert_eq!(outcome.state.key, Some(expected.primary));
    }

    #[tokio::test]
    async fn restore_failure_is_treated_as_miss() {
        let h = Harness::new();
        let cache = FakeCache::failing(&h.log);
        let opts = options(h.latest(), &[]);

        let outcome = h.run(&opts, Some(&cache)).await;

        assert!(h.installed_texlive());
        assert_eq!(outcome.cache, CacheResult::None);
        assert!(outcome.state.filled());
    }

    #[tokio::test]
    async fn older_versions_are_not_updated() {
        let h = Harness::new();
        let cache = FakeCache::new(&h.log, CacheResult::Secondary);
        let mut opts = options(Version::new(2020).unwrap(), &[]);
        opts.update_all_packages = true;

        h.run(&opts, Some(&cache)).await;

        assert!(h.updates().is_empty());
        assert!(h.touched_texmf());
    }

    #[tokio::test]
    async fn historic_restores_and_fresh_installs_never_update() {
        let years = [2008, 2011, 2014, 2017, 2020];
        for restored in [CacheResult::Primary, CacheResult::Secondary] {
            for year in years {
                let h = Harness::new();
                let cache = FakeCache::new(&h.log, restored);
                let mut opts = options(Version::new(year).unwrap(), &["foo"]);
                opts.update_all_packages = true;

                h.run(&opts, Some(&cache)).await;

                assert!(h.updates().is_empty(), "{} restore of {}", restored, year);
            }
        }

        for cache_enabled in [true, false] {
            let h = Harness::new();
            let miss = FakeCache::new(&h.log, CacheResult::None);
            let mut opts = options(h.latest(), &["foo"]);
            opts.update_all_packages = true;

            let cache = cache_enabled.then_some(&miss as &dyn CacheService);
            h.run(&opts, cache).await;

            assert!(h.installed_texlive());
            assert!(h.updates().is_empty(), "fresh install, cache {}", cache_enabled);
        }
    }

    #[tokio::test]
    async fn update_all_packages_follows_self_update() {
        let h = Harness::new();
        let cache = FakeCache::new(&h.log, CacheResult::Primary);
        let mut opts = options(h.latest(), &[]);
        opts.update_all_packages = true;

        h.run(&opts, Some(&cache)).await;

        assert_eq!(
            h.updates(),
            vec![UpdateOptions::self_only(), UpdateOptions::all_packages()]
        );
    }

    #[tokio::test]
    async fn tlcontrib_is_registered_and_pinned_before_packages() {
        let h = Harness::new();
        let opts = SetupOptions {
            tlcontrib: Some("https://mirror.example/systems/texlive/tlcontrib/".to_string()),
            ..options(h.latest(), &["foo"])
        };

        h.run(&opts, None).await;

        let tail: Vec<Call> = h.calls().into_iter().skip(3).collect();
        assert_eq!(
            tail,
            vec![
                Call::RepositoryAdd(
                    "https://mirror.example/systems/texlive/tlcontrib/".to_string(),
                    TLCONTRIB_TAG.to_string()
                ),
                Call::PinningAdd(TLCONTRIB_TAG.to_string(), "*".to_string()),
                Call::Install(vec!["foo".to_string()]),
            ]
        );
    }

    #[tokio::test]
    async fn reconcile_happens_after_path_and_update() {
        let h = Harness::new();
        let cache = FakeCache::new(&h.log, CacheResult::Secondary);
        let opts = options(h.latest(), &[]);

        h.run(&opts, Some(&cache)).await;

        let calls = h.calls();
        let position = |pred: &dyn Fn(&Call) -> bool| calls.iter().position(|c| pred(c)).unwrap();
        let path = position(&|c| matches!(c, Call::PathAdd));
        let update = position(&|c| matches!(c, Call::Update(..)));
        let texmf = position(&|c| matches!(c, Call::TexmfGet(TexmfKey::Home)));
        assert!(path < update && update < texmf);
    }

    #[tokio::test]
    async fn state_is_saved_to_channel() {
        let h = Harness::new();
        let cache = FakeCache::new(&h.log, CacheResult::None);
        let opts = options(h.latest(), &[]);

        let outcome = h.run(&opts, Some(&cache)).await;

        let loaded = InstallationState::load(&h.state).await.unwrap();
        assert_eq!(loaded, Some(outcome.state));
    }

    #[test]
    fn outputs_report_cache_result() {
        let outcome = MainOutcome {
            version: Version::new(2024).unwrap(),
            cache: CacheResult::Secondary,
            state: InstallationState::new(),
        };
        assert_eq!(
            outcome.outputs(),
            vec![
                ("cache-hit", "true".to_string()),
                ("cache-restored", "secondary".to_string()),
                ("version", "2024".to_string()),
            ]
        );
    }
}
