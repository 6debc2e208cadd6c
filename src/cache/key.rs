//! Cache key derivation
//!
//! Keys are hierarchical: the fallback key names a platform, architecture and
//! release; the primary key appends a digest of the exact package set. Same
//! inputs = same key, regardless of the order packages were requested in.

use crate::texlive::version::Version;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Leading component of every key
pub const KEY_PREFIX: &str = "setup-texlive";

/// Requested package names, deduplicated and kept sorted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSet(BTreeSet<String>);

impl PackageSet {
    /// Parse a package list: whitespace separated, `#` starts a comment
    pub fn parse(text: &str) -> Self {
        text.lines()
            .map(|line| line.split('#').next().unwrap_or_default())
            .flat_map(str::split_whitespace)
            .map(str::to_string)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    /// Sorted JSON array of the names
    pub fn canonical_json(&self) -> String {
        serde_json::Value::from(self.to_vec()).to_string()
    }
}

impl FromIterator<String> for PackageSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<String> for PackageSet {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

/// Keys used to look up and store an installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    /// Exact match: release + package set
    pub primary: String,
    /// Prefix matches tried when the primary key misses
    pub fallbacks: Vec<String>,
}

/// Platform and architecture of the running binary
pub fn current_platform() -> (&'static str, &'static str) {
    (std::env::consts::OS, std::env::consts::ARCH)
}

/// Derive the primary and fallback keys for an installation
pub fn derive_keys(platform: &str, arch: &str, version: Version, packages: &PackageSet) -> CacheKeys {
    let base = format!("{}-{}-{}-{}-", KEY_PREFIX, platform, arch, version);
    let digest = hex::encode(Sha256::digest(packages.canonical_json().as_bytes()));
    CacheKeys {
        primary: format!("{}{}", base, digest),
        fallbacks: vec![base],
    }
}
