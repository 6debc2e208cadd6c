//! Configuration schema
//!
//! Configuration is stored at `~/.config/setup-texlive/config.toml`. Every
//! section is optional; a missing file yields the defaults below.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Installation cache
    pub cache: CacheConfig,

    /// Package repository locations
    pub mirrors: MirrorsConfig,

    /// Remote lookups
    pub http: HttpConfig,

    /// Cross-phase state
    pub state: StateConfig,
}

/// Installation cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Set to false to disable caching regardless of the `cache` input
    pub enabled: bool,

    /// Directory holding cache entries
    pub dir: Option<PathBuf>,

    /// Entries kept per platform and release after a save (0 = keep all)
    pub keep: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            keep: 3,
        }
    }
}

impl CacheConfig {
    /// Cache directory, falling back to the user cache dir
    pub fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("setup-texlive")
        })
    }
}

/// CTAN mirror settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorsConfig {
    /// Mirror redirector serving the current release
    pub ctan: String,

    /// Primary CTAN site, updated before the mirrors
    pub master: String,

    /// Archive of past releases
    pub historic: String,
}

impl Default for MirrorsConfig {
    fn default() -> Self {
        Self {
            ctan: "https://mirror.ctan.org/".to_string(),
            master: "https://ftp.dante.de/tex-archive/".to_string(),
            historic: "https://ftp.math.utah.edu/pub/tex/historic/".to_string(),
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Base URL of the CTAN JSON API
    pub ctan_api: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            ctan_api: crate::texlive::ctan::DEFAULT_API_URL.to_string(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// State persistence settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Directory for the file state channel
    pub dir: Option<PathBuf>,
}

impl StateConfig {
    /// State directory, falling back to the user state dir
    pub fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| {
            dirs::state_dir()
                .or_else(dirs::data_local_dir)
                .unwrap_or_else(std::env::temp_dir)
                .join("setup-texlive")
                .join("state")
        })
    }
}
