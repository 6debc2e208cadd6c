//! HTTP access used for release checks and installer downloads
//!
//! `ureq` is blocking, so each request runs on tokio's blocking pool.

use crate::error::{SetupError, SetupResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Minimal HTTP surface needed by setup-texlive
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET a URL and parse the body as JSON
    async fn get_json(&self, url: &str) -> SetupResult<serde_json::Value>;

    /// HEAD a URL and return the named response header, if present
    async fn head_header(&self, url: &str, header: &str) -> SetupResult<Option<String>>;

    /// GET a URL and stream the body into `dest`
    async fn download(&self, url: &str, dest: &Path) -> SetupResult<()>;
}

/// `HttpClient` backed by a shared `ureq::Agent`
#[derive(Clone)]
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    /// Create a client with a global per-request timeout
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .user_agent(concat!("setup-texlive/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent: config.into(),
        }
    }

    async fn blocking<T, F>(&self, url: &str, f: F) -> SetupResult<T>
    where
        T: Send + 'static,
        F: FnOnce(ureq::Agent, String) -> SetupResult<T> + Send + 'static,
    {
        let agent = self.agent.clone();
        let owned = url.to_string();
        tokio::task::spawn_blocking(move || f(agent, owned))
            .await
            .map_err(|e| SetupError::Internal(format!("HTTP worker panicked: {}", e)))?
    }
}

#[async_trait]
impl HttpClient for UreqClient {
    async fn get_json(&self, url: &str) -> SetupResult<serde_json::Value> {
        debug!("GET {}", url);
        self.blocking(url, |agent, url| {
            let mut response = agent.get(&url).call().map_err(|e| SetupError::http(&url, e))?;
            response
                .body_mut()
                .read_json::<serde_json::Value>()
                .map_err(|e| SetupError::http(&url, e))
        })
        .await
    }

    async fn head_header(&self, url: &str, header: &str) -> SetupResult<Option<String>> {
        debug!("HEAD {}", url);
        let header = header.to_string();
        self.blocking(url, move |agent, url| {
            let response = agent.head(&url).call().map_err(|e| SetupError::http(&url, e))?;
            Ok(response
                .headers()
                .get(header.as_str())
                .and_then(|v| v.to_str().ok())
                .map(str::to_string))
        })
        .await
    }

    async fn download(&self, url: &str, dest: &Path) -> SetupResult<()> {
        debug!("Downloading {} to {}", url, dest.display());
        let dest: PathBuf = dest.to_path_buf();
        self.blocking(url, move |agent, url| {
            let mut response = agent.get(&url).call().map_err(|e| SetupError::http(&url, e))?;
            let mut file = std::fs::File::create(&dest)
                .map_err(|e| SetupError::io(format!("creating {}", dest.display()), e))?;
            let mut reader = response.body_mut().as_reader();
            std::io::copy(&mut reader, &mut file)
                .map_err(|e| SetupError::io(format!("writing {}", dest.display()), e))?;
            Ok(())
        })
        .await
    }
}
