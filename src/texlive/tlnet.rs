//! Package repository locations

use crate::clock::Clock;
use crate::config::schema::MirrorsConfig;
use crate::error::SetupResult;
use crate::http::HttpClient;
use crate::texlive::releases::ReleaseData;
use crate::texlive::version::Version;
use chrono::Duration;
use tracing::info;

const TLNET_PATH: &str = "systems/texlive/tlnet/";
const TLCONTRIB_PATH: &str = "systems/texlive/tlcontrib/";

/// Days after a release during which mirrors may still serve the old one
const MIRROR_SYNC_DAYS: i64 = 7;

/// `url` with exactly one trailing slash appended when missing
pub(crate) fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}

/// Current tlnet on the mirror network or the CTAN master
pub fn ctan(mirrors: &MirrorsConfig, master: bool) -> String {
    let root = if master { &mirrors.master } else { &mirrors.ctan };
    format!("{}{}", with_trailing_slash(root), TLNET_PATH)
}

/// TLContrib repository
pub fn contrib(mirrors: &MirrorsConfig) -> String {
    format!("{}{}", with_trailing_slash(&mirrors.ctan), TLCONTRIB_PATH)
}

/// Frozen repository of a past release
pub fn historic(mirrors: &MirrorsConfig, version: Version) -> String {
    let dir = if version.year() < 2010 { "tlnet" } else { "tlnet-final" };
    format!(
        "{}systems/texlive/{}/{}/",
        with_trailing_slash(&mirrors.historic),
        version,
        dir
    )
}

/// Pick the repository to install `version` from
pub async fn resolve(
    version: Version,
    releases: &mut ReleaseData,
    mirrors: &MirrorsConfig,
    http: &dyn HttpClient,
    clock: &dyn Clock,
) -> SetupResult<String> {
    if !releases.is_latest(version) {
        return Ok(historic(mirrors, version));
    }
    let released = releases
        .latest_mut()
        .check_release_date(http, &mirrors.master)
        .await?;
    if clock.now() - released < Duration::days(MIRROR_SYNC_DAYS) {
        info!(
            "TeX Live {} was released on {}; using the CTAN master",
            version,
            released.date_naive()
        );
        Ok(ctan(mirrors, true))
    } else {
        Ok(ctan(mirrors, false))
    }
}
