use std::time::Duration;

use tracing::{debug, info};

use common::config::RegistryConfig;

use crate::{PackageRecord, RegistryError};

/// First page of search results; the registry caps at this many matches.
const SEARCH_PAGE_SIZE: u32 = 1000;

/// HTTP client for the package registry API
pub struct RegistryClient {
    base_url: String,
    user: String,
    repository: String,
    api_key: String,
    http: reqwest::Client,
}

impl RegistryClient {
    /// Create a new client for the configured registry repository
    pub fn new(config: &RegistryConfig, timeout: Duration) -> Result<Self, RegistryError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            user: config.user.clone(),
            repository: config.repository.clone(),
            api_key: config.api_key.clone(),
            http,
        })
    }

    /// Search the registry for packages matching the query string
    pub async fn search(&self, query: &str) -> Result<Vec<PackageRecord>, RegistryError> {
        debug!(query, "searching registry for packages");
        let url = format!(
            "{}/api/v1/repos/{}/{}/search.json",
            self.base_url, self.user, self.repository
        );
        let resp = self
            .http
            .get(&url)
            .query(&[("q", query)])
            .query(&[("per_page", SEARCH_PAGE_SIZE)])
            .basic_auth(&self.api_key, Some(""))
            .send()
            .await?;

        let records: Vec<PackageRecord> = handle_response(resp).await?;
        info!(query, results = records.len(), "registry search concluded");
        Ok(records)
    }

    /// Delete one Maven artifact by group id and file name
    pub async fn delete(&self, group_id: &str, filename: &str) -> Result<(), RegistryError> {
        debug!(group_id, filename, "deleting package");
        let url = format!(
            "{}/api/v1/repos/{}/{}/java/maven2/{}/{}",
            self.base_url, self.user, self.repository, group_id, filename
        );
        let resp = self
            .http
            .delete(&url)
            .basic_auth(&self.api_key, Some(""))
            .send()
            .await?;

        if resp.status().is_success() {
            debug!(filename, "deleted package");
            Ok(())
        } else {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            Err(RegistryError::Api { status, message })
        }
    }
}

async fn handle_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, RegistryError> {
    if resp.status().is_success() {
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    } else {
        let status = resp.status().as_u16();
        let message = resp.text().await.unwrap_or_default();
        Err(RegistryError::Api { status, message })
    }
}
