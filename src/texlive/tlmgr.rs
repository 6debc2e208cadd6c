//! tlmgr, the TeX Live package manager
//!
//! `PackageManager` is the seam the orchestrator talks to; `Tlmgr` drives the
//! real binary inside an installation.

use crate::error::{SetupError, SetupResult};
use crate::process::{exec_with_path, ExecOutput};
use crate::runner::Runner;
use crate::texlive::texmf::TexmfKey;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::fs;
use tracing::{debug, info};

/// Flags for `tlmgr update`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// `--self`: update tlmgr itself
    pub self_update: bool,
    /// `--all`: update every installed package
    pub all: bool,
    /// `--reinstall-forcibly-removed`
    pub reinstall_forcibly_removed: bool,
}

impl UpdateOptions {
    pub fn self_only() -> Self {
        Self {
            self_update: true,
            ..Self::default()
        }
    }

    pub fn all_packages() -> Self {
        Self {
            all: true,
            reinstall_forcibly_removed: true,
            ..Self::default()
        }
    }

    fn flags(&self) -> Vec<&'static str> {
        let mut flags = Vec::new();
        if self.self_update {
            flags.push("--self");
        }
        if self.all {
            flags.push("--all");
        }
        if self.reinstall_forcibly_removed {
            flags.push("--reinstall-forcibly-removed");
        }
        flags
    }
}

/// Operations on an installed TeX Live
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Make the installation's binaries resolvable
    async fn path_add(&self) -> SetupResult<()>;

    /// Current value of a TEXMF root, `None` if unset
    async fn texmf_get(&self, key: TexmfKey) -> SetupResult<Option<String>>;

    async fn texmf_set(&self, key: TexmfKey, value: &str) -> SetupResult<()>;

    async fn repository_add(&self, url: &str, tag: &str) -> SetupResult<()>;

    async fn pinning_add(&self, repository: &str, pattern: &str) -> SetupResult<()>;

    async fn install(&self, packages: &[String]) -> SetupResult<()>;

    async fn update(&self, packages: &[String], options: UpdateOptions) -> SetupResult<()>;
}

/// `PackageManager` that shells out to `tlmgr`
pub struct Tlmgr {
    texdir: PathBuf,
    runner: Runner,
    bin_dir: OnceLock<PathBuf>,
}

impl Tlmgr {
    pub fn new(texdir: impl Into<PathBuf>, runner: Runner) -> Self {
        Self {
            texdir: texdir.into(),
            runner,
            bin_dir: OnceLock::new(),
        }
    }

    fn program(&self) -> String {
        match self.bin_dir.get() {
            Some(dir) => dir.join("tlmgr").to_string_lossy().into_owned(),
            None => "tlmgr".to_string(),
        }
    }

    async fn tlmgr(&self, args: &[&str]) -> SetupResult<ExecOutput> {
        exec_with_path(&self.program(), args, self.bin_dir.get().map(PathBuf::as_path)).await
    }

    async fn tlmgr_checked(&self, args: &[&str]) -> SetupResult<ExecOutput> {
        let command = format!("tlmgr {}", args.join(" "));
        self.tlmgr(args).await?.check(&command)
    }
}

/// Locate the single platform directory under `<texdir>/bin`
pub async fn find_bin_dir(texdir: &Path) -> SetupResult<PathBuf> {
    let bin = texdir.join("bin");
    let mut entries = fs::read_dir(&bin)
        .await
        .map_err(|e| SetupError::io(format!("reading {}", bin.display()), e))?;

    let mut dirs = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| SetupError::io(format!("reading {}", bin.display()), e))?
    {
        if entry.path().is_dir() {
            dirs.push(entry.path());
        }
    }

    match dirs.len() {
        1 => Ok(dirs.remove(0)),
        0 => Err(SetupError::PathNotFound(bin.join("*"))),
        n => Err(SetupError::Internal(format!(
            "{} platform directories found in {}",
            n,
            bin.display()
        ))),
    }
}

/// Parse `tlmgr conf texmf KEY` output (`KEY=value`)
fn parse_texmf_value(key: TexmfKey, stdout: &str) -> Option<String> {
    let prefix = format!("{}=", key.as_str());
    stdout
        .lines()
        .find_map(|line| line.trim().strip_prefix(&prefix).map(str::to_string))
}

#[async_trait]
impl PackageManager for Tlmgr {
    async fn path_add(&self) -> SetupResult<()> {
        let dir = find_bin_dir(&self.texdir)
            .await
            .map_err(|e| SetupError::BinDirNotFound {
                texdir: self.texdir.clone(),
                source: Box::new(e),
            })?;
        self.runner.add_path(&dir)?;
        let _ = self.bin_dir.set(dir);
        Ok(())
    }

    async fn texmf_get(&self, key: TexmfKey) -> SetupResult<Option<String>> {
        let output = self
            .tlmgr_checked(&["conf", "texmf", key.as_str()])
            .await?;
        let value = parse_texmf_value(key, &output.stdout);
        debug!("{} is {:?}", key, value);
        Ok(value)
    }

    async fn texmf_set(&self, key: TexmfKey, value: &str) -> SetupResult<()> {
        info!("Setting {} to {}", key, value);
        self.tlmgr_checked(&["conf", "texmf", key.as_str(), value])
            .await?;
        Ok(())
    }

    async fn repository_add(&self, url: &str, tag: &str) -> SetupResult<()> {
        let output = self.tlmgr(&["repository", "add", url, tag]).await?;
        if !output.success() && output.stderr.contains("repository or its tag already defined") {
            info!("Repository {} is already registered", tag);
            return Ok(());
        }
        output.check(&format!("tlmgr repository add {} {}", url, tag))?;
        Ok(())
    }

    async fn pinning_add(&self, repository: &str, pattern: &str) -> SetupResult<()> {
        self.tlmgr_checked(&["pinning", "add", repository, pattern])
            .await?;
        Ok(())
    }

    async fn install(&self, packages: &[String]) -> SetupResult<()> {
        if packages.is_empty() {
            return Ok(());
        }
        let mut args = vec!["install"];
        args.extend(packages.iter().map(String::as_str));
        self.tlmgr_checked(&args).await?;
        Ok(())
    }

    async fn update(&self, packages: &[String], options: UpdateOptions) -> SetupResult<()> {
        let mut args = vec!["update"];
        args.extend(options.flags());
        args.extend(packages.iter().map(String::as_str));
        self.tlmgr_checked(&args).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn update_flags() {
        assert_eq!(UpdateOptions::self_only().flags(), vec!["--self"]);
        assert_eq!(
            UpdateOptions::all_packages().flags(),
            vec!["--all", "--reinstall-forcibly-removed"]
        );
        assert!(UpdateOptions::default().flags().is_empty());
    }

    #[test]
    fn parse_texmf_output() {
        assert_eq!(
            parse_texmf_value(TexmfKey::Home, "TEXMFHOME=~/texmf\n"),
            Some("~/texmf".to_string())
        );
        assert_eq!(parse_texmf_value(TexmfKey::Var, "TEXMFHOME=~/texmf\n"), None);
        assert_eq!(parse_texmf_value(TexmfKey::Config, ""), None);
    }

    #[tokio::test]
    async fn bin_dir_single_platform() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("bin/x86_64-linux")).unwrap();

        let found = find_bin_dir(dir.path()).await.unwrap();
        assert!(found.ends_with("bin/x86_64-linux"));
    }

    #[tokio::test]
    async fn bin_dir_missing() {
        let dir = TempDir::new().unwrap();
        assert!(find_bin_dir(dir.path()).await.is_err());

        std::fs::create_dir_all(dir.path().join("bin")).unwrap();
        let err = find_bin_dir(dir.path()).await.unwrap_err();
        assert!(matches!(err, SetupError::PathNotFound(_)));
    }

    #[tokio::test]
    async fn path_add_wraps_lookup_failure() {
        let dir = TempDir::new().unwrap();
        let tlmgr = Tlmgr::new(dir.path(), Runner::local());

        let err = tlmgr.path_add().await.unwrap_err();
        assert!(matches!(err, SetupError::BinDirNotFound { .. }));
        assert!(std::error::Error::source(&err).is_some());
    }
}
