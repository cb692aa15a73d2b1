//! In-memory fake collaborators for orchestration tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use github::{GithubError, ProjectIdentity};
use registry::{PackageRecord, RegistryError};

use crate::service::{ArtifactRegistry, SourceControl};

/// Source control fake resolving every repository to a fixed identity
pub struct FakeSourceControl {
    identity: ProjectIdentity,
    fail: bool,
}

impl FakeSourceControl {
    pub fn new(group_id: &str, version: &str) -> Self {
        Self {
            identity: ProjectIdentity {
                group_id: group_id.to_string(),
                version: version.to_string(),
            },
            fail: false,
        }
    }

    /// A fake whose identity resolution always fails
    pub fn failing() -> Self {
        Self {
            identity: ProjectIdentity {
                group_id: String::new(),
                version: String::new(),
            },
            fail: true,
        }
    }
}

#[async_trait]
impl SourceControl for FakeSourceControl {
    async fn project_identity(&self, repo: &str) -> Result<ProjectIdentity, GithubError> {
        if self.fail {
            return Err(GithubError::Api {
                status: 500,
                message: format!("identity resolution failed for {repo}"),
            });
        }
        Ok(self.identity.clone())
    }
}

/// Registry fake recording searches and deletions
#[derive(Default)]
pub struct FakeRegistry {
    results: Vec<PackageRecord>,
    failing_files: HashSet<String>,
    fail_search: bool,
    searches: Mutex<Vec<String>>,
    deletions: Mutex<Vec<(String, String)>>,
}

impl FakeRegistry {
    /// A fake returning the given records for every search
    pub fn with_results(results: Vec<PackageRecord>) -> Self {
        Self {
            results,
            ..Self::default()
        }
    }

    /// A fake whose search always fails
    pub fn failing_search() -> Self {
        Self {
            fail_search: true,
            ..Self::default()
        }
    }

    /// Make deletes of the given file name fail
    pub fn fail_delete_of(mut self, filename: &str) -> Self {
        self.failing_files.insert(filename.to_string());
        self
    }

    /// Convenience constructor for a search result record
    pub fn package(name: &str, filename: &str) -> PackageRecord {
        PackageRecord {
            name: name.to_string(),
            filename: filename.to_string(),
            version: None,
            created_at: None,
        }
    }

    /// Queries issued so far
    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    /// File names deleted so far
    pub fn deleted(&self) -> Vec<String> {
        self.deletions
            .lock()
            .unwrap()
            .iter()
            .map(|(_, filename)| filename.clone())
            .collect()
    }

    /// Group ids the deletes were scoped by
    pub fn delete_groups(&self) -> Vec<String> {
        self.deletions
            .lock()
            .unwrap()
            .iter()
            .map(|(group, _)| group.clone())
            .collect()
    }
}

#[async_trait]
impl ArtifactRegistry for FakeRegistry {
    async fn search(&self, query: &str) -> Result<Vec<PackageRecord>, RegistryError> {
        self.searches.lock().unwrap().push(query.to_string());
        if self.fail_search {
            return Err(RegistryError::Api {
                status: 503,
                message: "search unavailable".to_string(),
            });
        }
        Ok(self.results.clone())
    }

    async fn delete(&self, group_id: &str, filename: &str) -> Result<(), RegistryError> {
        if self.failing_files.contains(filename) {
            return Err(RegistryError::Api {
                status: 404,
                message: format!("{filename} not found"),
            });
        }
        self.deletions
            .lock()
            .unwrap()
            .push((group_id.to_string(), filename.to_string()));
        Ok(())
    }
}
