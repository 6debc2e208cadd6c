//! Release tracking for TeX Live
//!
//! The latest version is seeded from bundled data and only refreshed from CTAN
//! once the next anticipated release date may have passed somewhere on Earth.
//! The value is computed once per process and handed around as `ReleaseData`.

use crate::clock::Clock;
use crate::error::{SetupError, SetupResult};
use crate::http::HttpClient;
use crate::texlive::ctan::CtanApi;
use crate::texlive::tlnet::with_trailing_slash;
use crate::texlive::version::Version;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use tracing::info;

const RELEASE_DATA: &str = include_str!("release-data.json");

/// Earliest UTC offset in use (UTC+14:00, Line Islands)
const EARLIEST_OFFSET_SECS: i32 = 14 * 3600;

/// Release information bundled at build time
#[derive(Debug, Clone, Deserialize)]
pub struct BundledReleases {
    pub latest: BundledRelease,
    pub next: NextRelease,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundledRelease {
    pub version: Version,
    pub release_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextRelease {
    pub release_date: NaiveDate,
}

impl BundledReleases {
    /// Parse the release table compiled into the binary
    pub fn load() -> SetupResult<Self> {
        serde_json::from_str(RELEASE_DATA).map_err(|e| SetupError::ReleaseData(e.to_string()))
    }

    /// The instant the next release could first have happened anywhere
    pub fn next_release_instant(&self) -> SetupResult<DateTime<Utc>> {
        let offset = FixedOffset::east_opt(EARLIEST_OFFSET_SECS)
            .ok_or_else(|| SetupError::Internal("invalid UTC offset".to_string()))?;
        let midnight = self
            .next
            .release_date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| SetupError::ReleaseData("invalid next release date".to_string()))?;
        offset
            .from_local_datetime(&midnight)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| SetupError::ReleaseData("ambiguous next release date".to_string()))
    }
}

/// The latest TeX Live release known to this process
#[derive(Debug, Clone)]
pub struct Latest {
    version: Version,
    release_date: Option<DateTime<Utc>>,
    bundled: BundledReleases,
}

impl Latest {
    pub fn new(bundled: BundledReleases) -> Self {
        Self {
            version: bundled.latest.version,
            release_date: None,
            bundled,
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Cached release date, if already derived
    pub fn release_date(&self) -> Option<DateTime<Utc>> {
        self.release_date
    }

    fn set_version(&mut self, latest: Version) {
        if self.version != latest {
            self.version = latest;
            self.release_date = None;
            info!("A new version of TeX Live has been released: {}", latest);
        } else {
            info!("Latest version: {}", self.version);
        }
    }

    /// Whether the bundled table may be stale at the clock's current instant
    pub fn need_to_check(&self, clock: &dyn Clock) -> SetupResult<bool> {
        Ok(clock.now() >= self.bundled.next_release_instant()?)
    }

    /// Ask CTAN for the published version.
    ///
    /// Never fails: on any error the previously known version is kept.
    pub async fn check_version(&mut self, ctan: &CtanApi<'_>) -> Version {
        info!("Checking for latest version of TeX Live");
        let remote = match ctan.pkg("texlive").await {
            Ok(pkg) => pkg
                .version
                .and_then(|v| v.number)
                .unwrap_or_default()
                .parse::<Version>(),
            Err(e) => Err(e),
        };
        match remote {
            Ok(version) => self.set_version(version),
            Err(error) => {
                info!("Failed to check for latest version: {}", error);
                info!("Use `{}` as latest version", self.version);
            }
        }
        self.version
    }

    /// Release date of the latest version.
    ///
    /// For a release newer than the bundled one, the last-modified time of
    /// `TEXLIVE_<year>` on the CTAN master approximates the release date.
    pub async fn check_release_date(
        &mut self,
        http: &dyn HttpClient,
        ctan_master: &str,
    ) -> SetupResult<DateTime<Utc>> {
        if let Some(date) = self.release_date {
            return Ok(date);
        }
        if self.version == self.bundled.latest.version {
            let date = self.bundled.latest.release_date;
            self.release_date = Some(date);
            return Ok(date);
        }

        let url = format!(
            "{}systems/texlive/tlnet/TEXLIVE_{}",
            with_trailing_slash(ctan_master),
            self.version
        );
        let timestamp = http
            .head_header(&url, "last-modified")
            .await?
            .unwrap_or_default();
        let date = DateTime::parse_from_rfc2822(timestamp.trim())
            .map_err(|_| SetupError::InvalidTimestamp(timestamp.clone()))?
            .with_timezone(&Utc);
        self.release_date = Some(date);
        Ok(date)
    }
}

/// Process-wide release context, built once and passed by reference
#[derive(Debug, Clone)]
pub struct ReleaseData {
    latest: Latest,
}

impl ReleaseData {
    /// Seed from bundled data and refresh from CTAN when it may be stale
    pub async fn setup(ctan: &CtanApi<'_>, clock: &dyn Clock) -> SetupResult<Self> {
        let mut latest = Latest::new(BundledReleases::load()?);
        if latest.need_to_check(clock)? {
            latest.check_version(ctan).await;
        }
        Ok(Self { latest })
    }

    pub fn from_latest(latest: Latest) -> Self {
        Self { latest }
    }

    pub fn latest(&self) -> &Latest {
        &self.latest
    }

    pub fn latest_mut(&mut self) -> &mut Latest {
        &mut self.latest
    }

    pub fn is_latest(&self, version: Version) -> bool {
        version == self.latest.version
    }
}
