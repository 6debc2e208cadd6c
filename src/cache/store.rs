//! Cache transfer
//!
//! `CacheService` is the seam between the orchestrator and whatever stores
//! installations between runs. `DirectoryCache` keeps them on a local or
//! mounted filesystem, one directory per key.

use crate::error::{SetupError, SetupResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const TMP_PREFIX: &str = ".tmp-";

/// Which key a restore matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheResult {
    /// Nothing matched, a full install is needed
    None,
    /// Fallback prefix matched, packages may differ
    Secondary,
    /// Exact key matched
    Primary,
}

impl CacheResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Secondary => "secondary",
            Self::Primary => "primary",
        }
    }

    /// Whether anything was restored
    pub fn is_hit(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for CacheResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stores and restores installation directories by key
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Restore into `target`, trying `primary` then each fallback prefix
    async fn restore(&self, target: &Path, primary: &str, fallbacks: &[String])
        -> SetupResult<CacheResult>;

    /// Save `target` under `key`
    async fn save(&self, target: &Path, key: &str) -> SetupResult<()>;
}

/// Filesystem-backed cache: `<root>/<key>/` holds a copy of the installation
pub struct DirectoryCache {
    root: PathBuf,
    keep: usize,
}

impl DirectoryCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            keep: 0,
        }
    }

    /// After each save, keep only the `keep` newest entries sharing the saved
    /// key's release prefix. 0 keeps everything.
    pub fn with_keep(mut self, keep: usize) -> Self {
        self.keep = keep;
        self
    }
}

#[async_trait]
impl CacheService for DirectoryCache {
    async fn restore(
        &self,
        target: &Path,
        primary: &str,
        fallbacks: &[String],
    ) -> SetupResult<CacheResult> {
        let root = self.root.clone();
        let target = target.to_path_buf();
        let primary = primary.to_string();
        let fallbacks = fallbacks.to_vec();

        tokio::task::spawn_blocking(move || restore_blocking(&root, &target, &primary, &fallbacks))
            .await
            .map_err(|e| SetupError::Internal(format!("cache restore task failed: {}", e)))?
    }

    async fn save(&self, target: &Path, key: &str) -> SetupResult<()> {
        let root = self.root.clone();
        let target = target.to_path_buf();
        let key = key.to_string();
        let keep = self.keep;

        tokio::task::spawn_blocking(move || {
            save_blocking(&root, &target, &key)?;
            if keep > 0 {
                match prune_blocking(&root, &key, keep) {
                    Ok(0) => {}
                    Ok(n) => info!("Removed {} older cache entries", n),
                    Err(e) => warn!("Failed to prune cache entries: {}", e),
                }
            }
            Ok(())
        })
        .await
        .map_err(|e| SetupError::Internal(format!("cache save task failed: {}", e)))?
    }
}

fn transfer_error(key: &str, e: impl fmt::Display) -> SetupError {
    SetupError::CacheTransfer {
        key: key.to_string(),
        reason: e.to_string(),
    }
}

fn restore_blocking(
    root: &Path,
    target: &Path,
    primary: &str,
    fallbacks: &[String],
) -> SetupResult<CacheResult> {
    let exact = root.join(primary);
    if exact.is_dir() {
        info!("Restoring cache entry {}", primary);
        copy_tree(&exact, target).map_err(|e| transfer_error(primary, e))?;
        return Ok(CacheResult::Primary);
    }

    for prefix in fallbacks {
        let found = newest_with_prefix(root, prefix).map_err(|e| transfer_error(prefix, e))?;
        let Some((key, path)) = found else {
            continue;
        };
        info!("Restoring cache entry {} (matched {})", key, prefix);
        copy_tree(&path, target).map_err(|e| transfer_error(&key, e))?;
        return Ok(CacheResult::Secondary);
    }

    debug!("No cache entry for {}", primary);
    Ok(CacheResult::None)
}

fn save_blocking(root: &Path, target: &Path, key: &str) -> SetupResult<()> {
    let dest = root.join(key);
    if dest.exists() {
        info!("Cache entry {} already exists, not saving", key);
        return Ok(());
    }

    fs::create_dir_all(root)
        .map_err(|e| SetupError::io(format!("creating {}", root.display()), e))?;

    let staging = root.join(format!("{}{}", TMP_PREFIX, uuid::Uuid::new_v4()));
    let result = copy_tree(target, &staging).and_then(|_| fs::rename(&staging, &dest));
    if let Err(e) = result {
        let _ = fs::remove_dir_all(&staging);
        // Another job saved the same key first.
        if dest.is_dir() {
            info!("Cache entry {} was saved concurrently", key);
            return Ok(());
        }
        return Err(transfer_error(key, e));
    }

    info!("Saved cache entry {}", key);
    Ok(())
}

/// Completed entries of `root` whose name starts with `prefix`, newest first
fn entries_with_prefix(root: &Path, prefix: &str) -> io::Result<Vec<(SystemTime, String, PathBuf)>> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(TMP_PREFIX) || !name.starts_with(prefix) || !entry.path().is_dir() {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        found.push((modified, name, entry.path()));
    }
    found.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(found)
}

/// Most recently modified entry of `root` whose name starts with `prefix`
fn newest_with_prefix(root: &Path, prefix: &str) -> io::Result<Option<(String, PathBuf)>> {
    Ok(entries_with_prefix(root, prefix)?
        .into_iter()
        .next()
        .map(|(_, name, path)| (name, path)))
}

/// Remove all but the `keep` newest entries sharing `key`'s release prefix.
/// `key` itself always survives.
fn prune_blocking(root: &Path, key: &str, keep: usize) -> io::Result<usize> {
    let Some((release, _)) = key.rsplit_once('-') else {
        return Ok(0);
    };
    let mut entries = entries_with_prefix(root, &format!("{}-", release))?;
    // Stable sort: the saved key first, then newest first.
    entries.sort_by_key(|(_, name, _)| name != key);

    let mut removed = 0;
    for (_, name, path) in entries.into_iter().skip(keep) {
        debug!("Pruning cache entry {}", name);
        fs::remove_dir_all(&path)?;
        removed += 1;
    }
    Ok(removed)
}

/// Recursively copy `src` into `dst`, keeping symlinks as links
fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in WalkDir::new(src).min_depth(1).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let out = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&out)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &out)?;
        } else {
            fs::copy(entry.path(), &out)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    let link = fs::read_link(src)?;
    if fs::symlink_metadata(dst).is_ok() {
        fs::remove_file(dst)?;
    }
    std::os::unix::fs::symlink(link, dst)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    fs::copy(src, dst).map(|_| ())
}
