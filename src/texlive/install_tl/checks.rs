//! Post-run checks that turn known install-tl failures into typed errors

use crate::error::{SetupError, SetupResult};
use crate::process::ExecOutput;
use crate::texlive::version::Version;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

const INCOMPATIBLE_TAG: &str = "repository being accessed are not compatible";
const RELEASE_TEXT_FILE: &str = "release-texlive.txt";

static RE_REMOTE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*repository:\s*(20\d{2})").unwrap());

static RE_RELEASE_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^TeX Live .+ version (20\d{2})").unwrap());

/// Detect a repository that serves a different release than install-tl
pub fn check_repository_compat(output: &ExecOutput) -> SetupResult<()> {
    if output.success() || !output.stderr.contains(INCOMPATIBLE_TAG) {
        return Ok(());
    }
    let remote_version = RE_REMOTE_VERSION
        .captures(&output.stderr)
        .map(|c| c[1].to_string());
    Err(SetupError::RepositoryVersionIncompatible { remote_version })
}

/// Verify `release-texlive.txt` in the installation names `version`
pub async fn check_release_text(texdir: &Path, version: Version) -> SetupResult<()> {
    let path = texdir.join(RELEASE_TEXT_FILE);
    match tokio::fs::read_to_string(&path).await {
        Ok(text) if text.contains(&format!("version {}", version)) => Ok(()),
        Ok(text) => Err(SetupError::UnexpectedVersion {
            expected: version.to_string(),
            found: RE_RELEASE_TEXT.captures(&text).map(|c| c[1].to_string()),
            source: None,
        }),
        Err(e) => Err(SetupError::UnexpectedVersion {
            expected: version.to_string(),
            found: None,
            source: Some(e),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn failed(stderr: &str) -> ExecOutput {
        ExecOutput {
            exit_code: 1,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn incompatible_repository_detected() {
        let stderr = "\
./install-tl: The TeX Live versions of the local installation
and the repository being accessed are not compatible:
      local: 2024
 repository: 2023
Perhaps you need to use a different CTAN mirror?";
        let err = check_repository_compat(&failed(stderr)).unwrap_err();
        match err {
            SetupError::RepositoryVersionIncompatible { remote_version } => {
                assert_eq!(remote_version.as_deref(), Some("2023"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unrelated_failures_pass_through() {
        assert!(check_repository_compat(&failed("disk full")).is_ok());

        let ok = ExecOutput {
            exit_code: 0,
            stdout: String::new(),
            stderr: INCOMPATIBLE_TAG.to_string(),
        };
        assert!(check_repository_compat(&ok).is_ok());
    }

    #[tokio::test]
    async fn release_text_matches() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(RELEASE_TEXT_FILE),
            "TeX Live (https://tug.org/texlive) version 2024\n",
        )
        .unwrap();
        check_release_text(dir.path(), "2024".parse().unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn release_text_mismatch_reports_found_version() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(RELEASE_TEXT_FILE),
            "TeX Live (https://tug.org/texlive) version 2023\n",
        )
        .unwrap();
        let err = check_release_text(dir.path(), "2024".parse().unwrap())
            .await
            .unwrap_err();
        match err {
            SetupError::UnexpectedVersion { expected, found, .. } => {
                assert_eq!(expected, "2024");
                assert_eq!(found.as_deref(), Some("2023"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_release_text_keeps_cause() {
        let dir = TempDir::new().unwrap();
        let err = check_release_text(dir.path(), "2024".parse().unwrap())
            .await
            .unwrap_err();
        assert!(std::error::Error::source(&err).is_some());
    }
}
