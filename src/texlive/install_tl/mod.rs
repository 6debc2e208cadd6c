//! install-tl acquisition and execution
//!
//! The installer is fetched from the repository it will install from, so the
//! two always belong to the same release.

mod checks;
mod profile;

pub use checks::{check_release_text, check_repository_compat};
pub use profile::Profile;

use crate::error::{SetupError, SetupResult};
use crate::http::HttpClient;
use crate::process::exec;
use crate::texlive::version::Version;
use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

const ARCHIVE_NAME: &str = "install-tl-unx.tar.gz";

/// Obtains an installer for a release
#[async_trait]
pub trait InstallerSource: Send + Sync {
    async fn acquire(&self, version: Version) -> SetupResult<Box<dyn Installer>>;
}

/// A ready-to-run installer
#[async_trait]
pub trait Installer: Send + Sync {
    async fn run(&self, profile: &Profile) -> SetupResult<()>;
}

/// Downloads `install-tl` from a tlnet repository
pub struct InstallTlSource<'a> {
    http: &'a dyn HttpClient,
    repository: String,
    workdir: PathBuf,
}

impl<'a> InstallTlSource<'a> {
    pub fn new(http: &'a dyn HttpClient, repository: impl Into<String>, workdir: PathBuf) -> Self {
        Self {
            http,
            repository: repository.into(),
            workdir,
        }
    }
}

#[async_trait]
impl InstallerSource for InstallTlSource<'_> {
    async fn acquire(&self, version: Version) -> SetupResult<Box<dyn Installer>> {
        if cfg!(windows) {
            return Err(SetupError::UnsupportedPlatform(std::env::consts::OS.to_string()));
        }

        fs::create_dir_all(&self.workdir)
            .await
            .map_err(|e| SetupError::io(format!("creating {}", self.workdir.display()), e))?;

        let archive = self.workdir.join(ARCHIVE_NAME);
        let url = format!("{}{}", self.repository, ARCHIVE_NAME);
        info!("Downloading {}", url);
        self.http.download(&url, &archive).await?;

        exec(
            "tar",
            [
                OsStr::new("-xzf"),
                archive.as_os_str(),
                OsStr::new("-C"),
                self.workdir.as_os_str(),
            ],
        )
        .await?
        .check("tar -xzf install-tl-unx.tar.gz")?;

        let dir = find_extracted_dir(&self.workdir).await?;
        debug!("install-tl extracted to {}", dir.display());

        Ok(Box::new(InstallTl {
            version,
            executable: dir.join("install-tl"),
            repository: self.repository.clone(),
            profile_path: self.workdir.join("texlive.profile"),
        }))
    }
}

/// The archive unpacks into `install-tl-<date>/`
async fn find_extracted_dir(workdir: &Path) -> SetupResult<PathBuf> {
    let mut entries = fs::read_dir(workdir)
        .await
        .map_err(|e| SetupError::io(format!("reading {}", workdir.display()), e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| SetupError::io("reading install-tl entry", e))?
    {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with("install-tl-") && entry.path().is_dir() {
            return Ok(entry.path());
        }
    }
    Err(SetupError::PathNotFound(workdir.join("install-tl-*")))
}

/// A downloaded `install-tl` script
pub struct InstallTl {
    version: Version,
    executable: PathBuf,
    repository: String,
    profile_path: PathBuf,
}

#[async_trait]
impl Installer for InstallTl {
    async fn run(&self, profile: &Profile) -> SetupResult<()> {
        fs::write(&self.profile_path, profile.to_string())
            .await
            .map_err(|e| SetupError::io(format!("writing {}", self.profile_path.display()), e))?;

        let program = self.executable.to_string_lossy().into_owned();
        let output = exec(
            &program,
            [
                OsStr::new("-no-gui"),
                OsStr::new("-profile"),
                self.profile_path.as_os_str(),
                OsStr::new("-repository"),
                OsStr::new(&self.repository),
            ],
        )
        .await?;

        check_repository_compat(&output)?;
        output.check("install-tl")?;
        check_release_text(&profile.texdir, self.version).await
    }
}
