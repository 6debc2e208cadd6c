//! CTAN package index queries

use crate::error::SetupResult;
use crate::http::HttpClient;
use serde::Deserialize;

/// Default CTAN JSON API root
pub const DEFAULT_API_URL: &str = "https://ctan.org/json/2.0/";

/// Package record returned by `pkg/<name>`; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PkgInfo {
    pub version: Option<PkgVersion>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PkgVersion {
    pub number: Option<String>,
}

/// Client for the CTAN JSON API
pub struct CtanApi<'a> {
    http: &'a dyn HttpClient,
    base_url: String,
}

impl<'a> CtanApi<'a> {
    pub fn new(http: &'a dyn HttpClient, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { http, base_url }
    }

    /// Fetch the package record for `name`
    pub async fn pkg(&self, name: &str) -> SetupResult<PkgInfo> {
        let url = format!("{}pkg/{}", self.base_url, name);
        let value = self.http.get_json(&url).await?;
        Ok(serde_json::from_value(value)?)
    }
}
