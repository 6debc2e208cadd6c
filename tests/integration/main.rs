//! Integration tests for setup-texlive

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn setup_texlive() -> Command {
        let mut cmd = cargo_bin_cmd!("setup-texlive");
        for var in [
            "GITHUB_ACTIONS",
            "GITHUB_STATE",
            "GITHUB_OUTPUT",
            "GITHUB_PATH",
            "GITHUB_RUN_ID",
            "GITHUB_RUN_ATTEMPT",
            "RUNNER_DEBUG",
            "SETUP_TEXLIVE_RUN_ID",
            "INPUT_VERSION",
            "INPUT_CACHE",
        ] {
            cmd.env_remove(var);
        }
        cmd
    }

    /// Config file pointing the cache and state at `dir`
    fn write_config(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("config.toml");
        std::fs::write(
            &path,
            format!(
                "[cache]\ndir = {:?}\n\n[state]\ndir = {:?}\n",
                dir.join("cache"),
                dir.join("state")
            ),
        )
        .unwrap();
        path
    }

    #[test]
    fn help_displays() {
        setup_texlive()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("TeX Live"));
    }

    #[test]
    fn version_displays() {
        setup_texlive()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("setup-texlive"));
    }

    #[test]
    fn run_help_lists_inputs() {
        setup_texlive()
            .args(["run", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--texlive-version"))
            .stdout(predicate::str::contains("--package-file"));
    }

    #[test]
    fn post_without_state_succeeds() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());

        setup_texlive()
            .args(["post", "--run-id", "no-state"])
            .arg("--config")
            .arg(&config)
            .assert()
            .success();

        assert!(!temp.path().join("cache").exists());
    }

    #[test]
    fn post_saves_recorded_installation() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());

        let texdir = temp.path().join("texlive/2024");
        std::fs::create_dir_all(texdir.join("bin/x86_64-linux")).unwrap();
        std::fs::write(texdir.join("release-texlive.txt"), "version 2024\n").unwrap();

        let state_dir = temp.path().join("state/job-1");
        std::fs::create_dir_all(&state_dir).unwrap();
        std::fs::write(
            state_dir.join("SETUP_TEXLIVE"),
            serde_json::json!({
                "key": "setup-texlive-linux-x86_64-2024-abc",
                "texdir": texdir,
            })
            .to_string(),
        )
        .unwrap();

        setup_texlive()
            .args(["post", "--run-id", "job-1"])
            .arg("--config")
            .arg(&config)
            .assert()
            .success();

        let saved = temp
            .path()
            .join("cache/setup-texlive-linux-x86_64-2024-abc/release-texlive.txt");
        assert!(saved.exists());
        assert!(!state_dir.join("SETUP_TEXLIVE").exists());
    }

    #[test]
    fn run_rejects_invalid_version() {
        let temp = TempDir::new().unwrap();
        let config = write_config(temp.path());

        setup_texlive()
            .args(["run", "--texlive-version", "20x4"])
            .arg("--config")
            .arg(&config)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"));
    }

    #[test]
    fn invalid_config_fails() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("config.toml");
        std::fs::write(&config, "[cache\n").unwrap();

        setup_texlive()
            .args(["post", "--run-id", "x"])
            .arg("--config")
            .arg(&config)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }
}
