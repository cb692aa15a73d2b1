use serde::{Deserialize, Serialize};

/// A package returned by the registry search API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageRecord {
    /// Qualified package name (`group:artifact`)
    pub name: String,
    /// File name of the stored artifact
    pub filename: String,
    /// Package version, when the registry reports one
    #[serde(default)]
    pub version: Option<String>,
    /// ISO 8601 upload timestamp
    #[serde(default)]
    pub created_at: Option<String>,
}
