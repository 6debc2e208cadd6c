//! Recording fakes for the orchestration collaborators

use crate::cache::{CacheResult, CacheService};
use crate::error::{SetupError, SetupResult};
use crate::texlive::install_tl::{Installer, InstallerSource, Profile};
use crate::texlive::{PackageManager, TexmfKey, UpdateOptions, Version};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Every collaborator call, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Restore {
        target: PathBuf,
        primary: String,
        fallbacks: Vec<String>,
    },
    Save {
        target: PathBuf,
        key: String,
    },
    Acquire(Version),
    RunInstaller(PathBuf),
    PathAdd,
    TexmfGet(TexmfKey),
    TexmfSet(TexmfKey, String),
    RepositoryAdd(String, String),
    PinningAdd(String, String),
    Install(Vec<String>),
    Update(Vec<String>, UpdateOptions),
}

pub type Log = Arc<Mutex<Vec<Call>>>;

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &Log) -> Vec<Call> {
    log.lock().unwrap().clone()
}

fn record(log: &Log, call: Call) {
    log.lock().unwrap().push(call);
}

pub struct FakeCache {
    pub log: Log,
    pub result: SetupResult<CacheResult>,
    pub fail_save: bool,
}

impl FakeCache {
    pub fn new(log: &Log, result: CacheResult) -> Self {
        Self {
            log: log.clone(),
            result: Ok(result),
            fail_save: false,
        }
    }

    pub fn failing(log: &Log) -> Self {
        Self {
            log: log.clone(),
            result: Err(SetupError::CacheTransfer {
                key: "k".to_string(),
                reason: "service unavailable".to_string(),
            }),
            fail_save: true,
        }
    }
}

#[async_trait]
impl CacheService for FakeCache {
    async fn restore(
        &self,
        target: &Path,
        primary: &str,
        fallbacks: &[String],
    ) -> SetupResult<CacheResult> {
        record(
            &self.log,
            Call::Restore {
                target: target.to_path_buf(),
                primary: primary.to_string(),
                fallbacks: fallbacks.to_vec(),
            },
        );
        match &self.result {
            Ok(result) => Ok(*result),
            Err(e) => Err(SetupError::Internal(e.to_string())),
        }
    }

    async fn save(&self, target: &Path, key: &str) -> SetupResult<()> {
        record(
            &self.log,
            Call::Save {
                target: target.to_path_buf(),
                key: key.to_string(),
            },
        );
        if self.fail_save {
            return Err(SetupError::CacheTransfer {
                key: key.to_string(),
                reason: "upload rejected".to_string(),
            });
        }
        Ok(())
    }
}

pub struct FakeInstallerSource {
    pub log: Log,
}

struct FakeInstaller {
    log: Log,
}

#[async_trait]
impl InstallerSource for FakeInstallerSource {
    async fn acquire(&self, version: Version) -> SetupResult<Box<dyn Installer>> {
        record(&self.log, Call::Acquire(version));
        Ok(Box::new(FakeInstaller {
            log: self.log.clone(),
        }))
    }
}

#[async_trait]
impl Installer for FakeInstaller {
    async fn run(&self, profile: &Profile) -> SetupResult<()> {
        record(&self.log, Call::RunInstaller(profile.texdir.clone()));
        Ok(())
    }
}

pub struct FakeTlmgr {
    pub log: Log,
    pub texmf: Mutex<HashMap<TexmfKey, String>>,
}

impl FakeTlmgr {
    pub fn new(log: &Log) -> Self {
        Self {
            log: log.clone(),
            texmf: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_texmf(self, key: TexmfKey, value: &str) -> Self {
        self.texmf.lock().unwrap().insert(key, value.to_string());
        self
    }
}

#[async_trait]
impl PackageManager for FakeTlmgr {
    async fn path_add(&self) -> SetupResult<()> {
        record(&self.log, Call::PathAdd);
        Ok(())
    }

    async fn texmf_get(&self, key: TexmfKey) -> SetupResult<Option<String>> {
        record(&self.log, Call::TexmfGet(key));
        Ok(self.texmf.lock().unwrap().get(&key).cloned())
    }

    async fn texmf_set(&self, key: TexmfKey, value: &str) -> SetupResult<()> {
        record(&self.log, Call::TexmfSet(key, value.to_string()));
        self.texmf.lock().unwrap().insert(key, value.to_string());
        Ok(())
    }

    async fn repository_add(&self, url: &str, tag: &str) -> SetupResult<()> {
        record(&self.log, Call::RepositoryAdd(url.to_string(), tag.to_string()));
        Ok(())
    }

    async fn pinning_add(&self, repository: &str, pattern: &str) -> SetupResult<()> {
        record(
            &self.log,
            Call::PinningAdd(repository.to_string(), pattern.to_string()),
        );
        Ok(())
    }

    async fn install(&self, packages: &[String]) -> SetupResult<()> {
        record(&self.log, Call::Install(packages.to_vec()));
        Ok(())
    }

    async fn update(&self, packages: &[String], options: UpdateOptions) -> SetupResult<()> {
        record(&self.log, Call::Update(packages.to_vec(), options));
        Ok(())
    }
}
