use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use common::config::GithubConfig;

use crate::GithubError;

/// HTTP client for the GitHub contents API
pub struct GithubClient {
    base_url: String,
    organization: String,
    http: reqwest::Client,
}

/// A file returned by the contents endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoFile {
    /// File name without its directory
    pub name: String,
    /// Path of the file within the repository
    #[serde(default)]
    pub path: Option<String>,
    /// Blob SHA of the file
    #[serde(default)]
    pub sha: Option<String>,
    /// File size in bytes
    #[serde(default)]
    pub size: Option<u64>,
    /// Base64-encoded file content
    #[serde(default)]
    pub content: String,
    /// Content encoding reported by the API
    #[serde(default)]
    pub encoding: Option<String>,
}

impl RepoFile {
    /// Decode the base64 content.
    ///
    /// The contents API wraps the payload with newlines, so whitespace is
    /// stripped before decoding.
    pub fn decoded_content(&self) -> Result<Vec<u8>, GithubError> {
        let compact: String = self
            .content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        Ok(BASE64.decode(compact.as_bytes())?)
    }

    /// Decode the content as UTF-8 text
    pub fn decoded_text(&self) -> Result<String, GithubError> {
        String::from_utf8(self.decoded_content()?).map_err(|_| {
            GithubError::Descriptor(format!("file {} is not valid UTF-8", self.name))
        })
    }
}

impl GithubClient {
    /// Create a new client for the configured organization
    pub fn new(config: &GithubConfig, timeout: Duration) -> Result<Self, GithubError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        let mut auth = HeaderValue::from_str(&format!("token {}", config.token))
            .map_err(|_| GithubError::Config("token contains invalid header bytes".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            organization: config.organization.clone(),
            http,
        })
    }

    /// Fetch a file from a repository by path
    pub async fn fetch_file(&self, repo: &str, path: &str) -> Result<RepoFile, GithubError> {
        debug!(repo, path, "fetching repository file");
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.base_url, self.organization, repo, path
        );
        let resp = self.http.get(&url).send().await?;
        let file: RepoFile = handle_response(resp).await?;
        debug!(repo, path, "found repository file");
        Ok(file)
    }
}

pub(crate) async fn handle_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, GithubError> {
    if resp.status().is_success() {
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    } else {
        let status = resp.status().as_u16();
        let message = resp.text().await.unwrap_or_default();
        Err(GithubError::Api { status, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_with_content(content: &str) -> RepoFile {
        RepoFile {
            name: "pom.xml".to_string(),
            path: None,
            sha: None,
            size: None,
            content: content.to_string(),
            encoding: Some("base64".to_string()),
        }
    }

    #[test]
    fn test_decoded_content_plain() {
        // "hello world"
        let file = file_with_content("aGVsbG8gd29ybGQ=");
        assert_eq!(file.decoded_content().unwrap(), b"hello world");
    }

    #[test]
    fn test_decoded_content_strips_api_newlines() {
        let file = file_with_content("aGVsbG8g\nd29ybGQ=\n");
        assert_eq!(file.decoded_text().unwrap(), "hello world");
    }

    #[test]
    fn test_decoded_content_rejects_invalid_base64() {
        let file = file_with_content("not base64!!");
        assert!(matches!(
            file.decoded_content(),
            Err(GithubError::Decode(_))
        ));
    }

    #[test]
    fn test_decoded_text_rejects_non_utf8() {
        // 0xFF 0xFE is not valid UTF-8
        let file = file_with_content("//4=");
        assert!(matches!(
            file.decoded_text(),
            Err(GithubError::Descriptor(_))
        ));
    }

    #[test]
    fn test_repo_file_deserializes_contents_envelope() {
        let body = r#"{
            "name": "pom.xml",
            "path": "pom.xml",
            "sha": "3d21ec5",
            "size": 512,
            "content": "aGVsbG8=",
            "encoding": "base64",
            "type": "file"
        }"#;
        let file: RepoFile = serde_json::from_str(body).unwrap();
        assert_eq!(file.name, "pom.xml");
        assert_eq!(file.size, Some(512));
        assert_eq!(file.decoded_content().unwrap(), b"hello");
    }
}
