use async_trait::async_trait;
use futures::{StreamExt, stream};
use tracing::{debug, error, info};

use github::{GithubClient, GithubError, ProjectIdentity};
use registry::{PackageRecord, RegistryClient, RegistryError};

/// Source-control side of a cleanup run
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Resolve the package identity of a repository
    async fn project_identity(&self, repo: &str) -> Result<ProjectIdentity, GithubError>;
}

/// Registry side of a cleanup run
#[async_trait]
pub trait ArtifactRegistry: Send + Sync {
    /// Search for packages matching the query string
    async fn search(&self, query: &str) -> Result<Vec<PackageRecord>, RegistryError>;
    /// Delete one artifact by group id and file name
    async fn delete(&self, group_id: &str, filename: &str) -> Result<(), RegistryError>;
}

#[async_trait]
impl SourceControl for GithubClient {
    async fn project_identity(&self, repo: &str) -> Result<ProjectIdentity, GithubError> {
        GithubClient::project_identity(self, repo).await
    }
}

#[async_trait]
impl ArtifactRegistry for RegistryClient {
    async fn search(&self, query: &str) -> Result<Vec<PackageRecord>, RegistryError> {
        RegistryClient::search(self, query).await
    }

    async fn delete(&self, group_id: &str, filename: &str) -> Result<(), RegistryError> {
        RegistryClient::delete(self, group_id, filename).await
    }
}

/// Errors that abort a cleanup run before any deletion fan-out
#[derive(Debug, thiserror::Error)]
pub enum CleanupError {
    /// Identity resolution failed
    #[error("source control error: {0}")]
    SourceControl(#[from] GithubError),
    /// Registry search failed
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// One artifact the registry refused to delete
#[derive(Debug, Clone)]
pub struct DeleteFailure {
    pub filename: String,
    pub error: String,
}

/// Outcome of one cleanup run
#[derive(Debug, Clone, Default)]
pub struct CleanupReport {
    /// Search string issued against the registry
    pub search_string: String,
    /// Number of artifacts the search matched
    pub matched: usize,
    /// Number of artifacts deleted
    pub deleted: usize,
    /// Artifacts whose delete call failed
    pub failures: Vec<DeleteFailure>,
}

impl CleanupReport {
    /// Whether every matched artifact was deleted
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Composes identity resolution, registry search and bounded delete fan-out
pub struct CleanupService<S, R> {
    pub(crate) source: S,
    pub(crate) registry: R,
    max_concurrent_deletes: usize,
}

impl<S: SourceControl, R: ArtifactRegistry> CleanupService<S, R> {
    pub fn new(source: S, registry: R, max_concurrent_deletes: usize) -> Self {
        Self {
            source,
            registry,
            // a cap of zero would never launch a delete
            max_concurrent_deletes: max_concurrent_deletes.max(1),
        }
    }

    /// Remove every package of a deleted branch
    pub async fn remove_branch_packages(
        &self,
        repo: &str,
        branch: &str,
    ) -> Result<CleanupReport, CleanupError> {
        self.remove_matching(repo, branch.to_string()).await
    }

    /// Remove the snapshot packages superseded by a release tag
    pub async fn remove_tag_snapshots(
        &self,
        repo: &str,
        tag: &str,
    ) -> Result<CleanupReport, CleanupError> {
        self.remove_matching(repo, format!("{tag}-SNAPSHOT")).await
    }

    /// Shared run shape: resolve identity, search, delete each match.
    ///
    /// Zero matches terminates immediately with a complete report; a failed
    /// delete is recorded per artifact and never stalls the run.
    async fn remove_matching(
        &self,
        repo: &str,
        suffix: String,
    ) -> Result<CleanupReport, CleanupError> {
        let identity = self.source.project_identity(repo).await?;
        let search_string = format!("{}:{}", identity.group_id, suffix);

        let packages = self.registry.search(&search_string).await?;
        let mut report = CleanupReport {
            matched: packages.len(),
            search_string,
            ..CleanupReport::default()
        };

        let group_id = identity.group_id.as_str();
        let registry = &self.registry;
        let results: Vec<(String, Result<(), RegistryError>)> = stream::iter(packages)
            .map(|package| async move {
                let outcome = registry.delete(group_id, &package.filename).await;
                (package.filename, outcome)
            })
            .buffer_unordered(self.max_concurrent_deletes)
            .collect()
            .await;

        for (filename, outcome) in results {
            match outcome {
                Ok(()) => {
                    debug!(%filename, "deleted package");
                    report.deleted += 1;
                }
                Err(err) => {
                    error!(%filename, %err, "failed to delete package");
                    report.failures.push(DeleteFailure {
                        filename,
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            search_string = %report.search_string,
            matched = report.matched,
            deleted = report.deleted,
            failed = report.failures.len(),
            "cleanup run finished"
        );
        Ok(report)
    }
}
