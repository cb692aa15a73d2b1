use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{GithubClient, GithubError, RepoFile};

static APPLICATION_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"applicationId "([^"]*)""#).expect("valid applicationId pattern"));
static VERSION_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"versionName = '([^']*)'").expect("valid versionName pattern"));

/// Package identity derived from a repository's build descriptors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectIdentity {
    /// Namespace component of the package's qualified name
    pub group_id: String,
    /// Current version string of the project
    pub version: String,
}

impl ProjectIdentity {
    /// Extract the identity from a Maven POM manifest
    pub fn from_pom(xml: &str) -> Result<Self, GithubError> {
        #[derive(Deserialize)]
        struct PomProject {
            #[serde(rename = "groupId")]
            group_id: Option<String>,
            version: Option<String>,
        }

        let project: PomProject = quick_xml::de::from_str(xml)
            .map_err(|e| GithubError::Descriptor(format!("malformed pom.xml: {e}")))?;
        let group_id = project
            .group_id
            .ok_or_else(|| GithubError::Descriptor("pom.xml has no project.groupId".into()))?;
        let version = project
            .version
            .ok_or_else(|| GithubError::Descriptor("pom.xml has no project.version".into()))?;
        Ok(Self { group_id, version })
    }
}

/// First `applicationId "<value>"` occurrence in a gradle build script
pub(crate) fn extract_application_id(script: &str) -> Option<String> {
    APPLICATION_ID
        .captures(script)
        .map(|caps| caps[1].to_string())
}

/// First `versionName = '<value>'` occurrence in a gradle versions script
pub(crate) fn extract_version_name(script: &str) -> Option<String> {
    VERSION_NAME.captures(script).map(|caps| caps[1].to_string())
}

/// Seam over the contents API so the descriptor routing below can be
/// exercised with canned files instead of HTTP
#[async_trait]
pub(crate) trait FileSource: Sync {
    async fn file(&self, repo: &str, path: &str) -> Result<RepoFile, GithubError>;
}

#[async_trait]
impl FileSource for GithubClient {
    async fn file(&self, repo: &str, path: &str) -> Result<RepoFile, GithubError> {
        self.fetch_file(repo, path).await
    }
}

/// Descriptor routing: `pom.xml` when present under that exact name, the
/// gradle layout when the pom is absent, any other fetch error propagated.
pub(crate) async fn resolve_identity<F: FileSource>(
    source: &F,
    repo: &str,
) -> Result<ProjectIdentity, GithubError> {
    debug!(repo, "resolving group id and current version");

    let identity = match source.file(repo, "pom.xml").await {
        Ok(file) if file.name == "pom.xml" => ProjectIdentity::from_pom(&file.decoded_text()?)?,
        Ok(_) => gradle_identity(source, repo).await?,
        Err(err) if err.is_status(404) => gradle_identity(source, repo).await?,
        Err(err) => return Err(err),
    };

    info!(
        repo,
        group_id = %identity.group_id,
        version = %identity.version,
        "resolved project identity"
    );
    Ok(identity)
}

async fn gradle_identity<F: FileSource>(
    source: &F,
    repo: &str,
) -> Result<ProjectIdentity, GithubError> {
    let build_script = source.file(repo, "app/build.gradle").await?;
    let group_id = extract_application_id(&build_script.decoded_text()?).ok_or_else(|| {
        GithubError::Descriptor(format!("no applicationId found in app/build.gradle of {repo}"))
    })?;

    let versions_script = source.file(repo, "versions.gradle").await?;
    let version = extract_version_name(&versions_script.decoded_text()?).ok_or_else(|| {
        GithubError::Descriptor(format!("no versionName found in versions.gradle of {repo}"))
    })?;

    Ok(ProjectIdentity { group_id, version })
}

impl GithubClient {
    /// Resolve a repository's package identity.
    ///
    /// Tries `pom.xml` at the repository root first; when it is absent the
    /// gradle layout is used instead, taking the group id from
    /// `app/build.gradle` and the version from `versions.gradle`. Resolved
    /// fresh on every call, never cached.
    pub async fn project_identity(&self, repo: &str) -> Result<ProjectIdentity, GithubError> {
        resolve_identity(self, repo).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pom_extracts_group_and_version() {
        let xml = "<project><groupId>com.example.app</groupId><version>1.2.3</version></project>";
        let identity = ProjectIdentity::from_pom(xml).unwrap();
        assert_eq!(identity.group_id, "com.example.app");
        assert_eq!(identity.version, "1.2.3");
    }

    #[test]
    fn test_from_pom_ignores_unrelated_elements() {
        let xml = r#"<project xmlns="http://maven.apache.org/POM/4.0.0">
            <modelVersion>4.0.0</modelVersion>
            <groupId>com.example.app</groupId>
            <artifactId>app</artifactId>
            <version>2.0.0-SNAPSHOT</version>
            <dependencies><dependency><groupId>junit</groupId></dependency></dependencies>
        </project>"#;
        let identity = ProjectIdentity::from_pom(xml).unwrap();
        assert_eq!(identity.group_id, "com.example.app");
        assert_eq!(identity.version, "2.0.0-SNAPSHOT");
    }

    #[test]
    fn test_from_pom_missing_group_id_is_descriptor_error() {
        let xml = "<project><version>1.0</version></project>";
        let err = ProjectIdentity::from_pom(xml).unwrap_err();
        assert!(matches!(err, GithubError::Descriptor(_)));
        assert!(err.to_string().contains("groupId"));
    }

    #[test]
    fn test_from_pom_malformed_xml_is_descriptor_error() {
        let err = ProjectIdentity::from_pom("<project><groupId>x</project>").unwrap_err();
        assert!(matches!(err, GithubError::Descriptor(_)));
    }

    #[test]
    fn test_extract_application_id_first_match_wins() {
        let script = r#"
            android {
                defaultConfig {
                    applicationId "com.example.app"
                    applicationId "com.example.other"
                }
            }
        "#;
        assert_eq!(
            extract_application_id(script),
            Some("com.example.app".to_string())
        );
    }

    #[test]
    fn test_extract_application_id_absent() {
        assert_eq!(extract_application_id("android {}"), None);
    }

    #[test]
    fn test_extract_version_name() {
        let script = "ext {\n    versionName = '3.4.0-SNAPSHOT'\n}\n";
        assert_eq!(
            extract_version_name(script),
            Some("3.4.0-SNAPSHOT".to_string())
        );
    }

    #[test]
    fn test_extract_version_name_absent() {
        assert_eq!(extract_version_name("ext {}"), None);
    }

    mod routing {
        use super::super::*;
        use base64::Engine as _;
        use base64::engine::general_purpose::STANDARD as BASE64;
        use std::collections::HashMap;

        /// Canned contents API: files by path, error statuses by path,
        /// anything else a 404
        #[derive(Default)]
        struct CannedFiles {
            files: HashMap<&'static str, RepoFile>,
            errors: HashMap<&'static str, u16>,
        }

        impl CannedFiles {
            fn with_file(mut self, path: &'static str, name: &str, text: &str) -> Self {
                self.files.insert(
                    path,
                    RepoFile {
                        name: name.to_string(),
                        path: Some(path.to_string()),
                        sha: None,
                        size: None,
                        content: BASE64.encode(text),
                        encoding: Some("base64".to_string()),
                    },
                );
                self
            }

            fn with_error(mut self, path: &'static str, status: u16) -> Self {
                self.errors.insert(path, status);
                self
            }

            fn with_gradle_layout(self) -> Self {
                self.with_file(
                    "app/build.gradle",
                    "build.gradle",
                    "defaultConfig {\n    applicationId \"com.example.app\"\n}\n",
                )
                .with_file(
                    "versions.gradle",
                    "versions.gradle",
                    "ext {\n    versionName = '1.4.0'\n}\n",
                )
            }
        }

        #[async_trait]
        impl FileSource for CannedFiles {
            async fn file(&self, _repo: &str, path: &str) -> Result<RepoFile, GithubError> {
                if let Some(status) = self.errors.get(path) {
                    return Err(GithubError::Api {
                        status: *status,
                        message: format!("{path} unavailable"),
                    });
                }
                self.files.get(path).cloned().ok_or_else(|| GithubError::Api {
                    status: 404,
                    message: format!("{path} not found"),
                })
            }
        }

        #[tokio::test]
        async fn test_pom_repository_resolves_from_pom() {
            let source = CannedFiles::default().with_file(
                "pom.xml",
                "pom.xml",
                "<project><groupId>com.example.app</groupId><version>2.1.0</version></project>",
            );
            let identity = resolve_identity(&source, "svc").await.unwrap();
            assert_eq!(identity.group_id, "com.example.app");
            assert_eq!(identity.version, "2.1.0");
        }

        #[tokio::test]
        async fn test_missing_pom_falls_back_to_gradle_layout() {
            let source = CannedFiles::default()
                .with_error("pom.xml", 404)
                .with_gradle_layout();
            let identity = resolve_identity(&source, "svc").await.unwrap();
            assert_eq!(identity.group_id, "com.example.app");
            assert_eq!(identity.version, "1.4.0");
        }

        #[tokio::test]
        async fn test_pom_name_mismatch_falls_back_to_gradle_layout() {
            // the contents endpoint answered, but not with the pom itself
            let source = CannedFiles::default()
                .with_file("pom.xml", "index.html", "<html></html>")
                .with_gradle_layout();
            let identity = resolve_identity(&source, "svc").await.unwrap();
            assert_eq!(identity.group_id, "com.example.app");
        }

        #[tokio::test]
        async fn test_non_404_pom_error_propagates() {
            let source = CannedFiles::default()
                .with_error("pom.xml", 502)
                .with_gradle_layout();
            let err = resolve_identity(&source, "svc").await.unwrap_err();
            assert!(err.is_status(502));
        }

        #[tokio::test]
        async fn test_gradle_layout_without_version_pattern_is_descriptor_error() {
            let source = CannedFiles::default()
                .with_error("pom.xml", 404)
                .with_file(
                    "app/build.gradle",
                    "build.gradle",
                    "defaultConfig {\n    applicationId \"com.example.app\"\n}\n",
                )
                .with_file("versions.gradle", "versions.gradle", "ext {}\n");
            let err = resolve_identity(&source, "svc").await.unwrap_err();
            assert!(matches!(err, GithubError::Descriptor(_)));
            assert!(err.to_string().contains("versionName"));
        }
    }
}
