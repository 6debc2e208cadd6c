//! TeX Live release identifiers
//!
//! Releases are tagged by year. A request may also say `latest`, which is only
//! turned into a concrete year once release data has been set up.

use crate::error::{SetupError, SetupResult};
use crate::texlive::releases::ReleaseData;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A concrete TeX Live release year
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version(u16);

impl Version {
    /// Oldest release that can be installed
    pub const OLDEST: Version = Version(2008);

    /// Releases older than this use the `option_*` profile spelling
    pub const INSTOPT_RENAME: Version = Version(2017);

    /// Build a version from a year, rejecting years before `OLDEST`
    pub fn new(year: u16) -> SetupResult<Self> {
        if year < Self::OLDEST.0 || year > 2099 {
            return Err(SetupError::InvalidVersion(year.to_string()));
        }
        Ok(Self(year))
    }

    pub fn year(&self) -> u16 {
        self.0
    }
}

impl FromStr for Version {
    type Err = SetupError;

    fn from_str(s: &str) -> SetupResult<Self> {
        let trimmed = s.trim();
        if trimmed.len() != 4 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SetupError::InvalidVersion(s.to_string()));
        }
        let year: u16 = trimmed
            .parse()
            .map_err(|_| SetupError::InvalidVersion(s.to_string()))?;
        Self::new(year)
    }
}

impl TryFrom<String> for Version {
    type Error = SetupError;

    fn try_from(s: String) -> SetupResult<Self> {
        s.parse()
    }
}

impl From<Version> for String {
    fn from(v: Version) -> Self {
        v.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Version as requested by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestedVersion {
    #[default]
    Latest,
    Exact(Version),
}

impl RequestedVersion {
    /// Resolve to a concrete release using the latest known version
    pub fn resolve(&self, releases: &ReleaseData) -> SetupResult<Version> {
        let latest = releases.latest().version();
        match *self {
            Self::Latest => Ok(latest),
            Self::Exact(v) if v > latest => Err(SetupError::VersionNotReleased {
                requested: v.to_string(),
                latest: latest.to_string(),
            }),
            Self::Exact(v) => Ok(v),
        }
    }
}

impl FromStr for RequestedVersion {
    type Err = SetupError;

    fn from_str(s: &str) -> SetupResult<Self> {
        if s.trim().eq_ignore_ascii_case("latest") || s.trim().is_empty() {
            Ok(Self::Latest)
        } else {
            s.parse().map(Self::Exact)
        }
    }
}

impl fmt::Display for RequestedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => write!(f, "latest"),
            Self::Exact(v) => write!(f, "{}", v),
        }
    }
}
