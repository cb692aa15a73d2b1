use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

/// HTTP server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the webhook listener binds to
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: String::from("0.0.0.0:3000"),
        }
    }
}

/// Configuration for the source-control contents API
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Base URL of the GitHub REST API
    pub api_url: String,
    /// Organization the watched repositories belong to
    pub organization: String,
    /// Personal access token used for contents reads
    pub token: String,
    /// User-Agent header GitHub requires on API calls
    pub user_agent: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: String::from("https://api.github.com"),
            organization: String::new(),
            token: String::new(),
            user_agent: String::from("pkgsweep"),
        }
    }
}

/// Configuration for the package registry API
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Base URL of the registry API
    pub api_url: String,
    /// Registry account owning the repository
    pub user: String,
    /// Registry repository holding the artifacts
    pub repository: String,
    /// API key, sent as the Basic auth username
    pub api_key: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            api_url: String::from("https://packagecloud.io"),
            user: String::new(),
            repository: String::new(),
            api_key: String::new(),
        }
    }
}

/// Tunables for a cleanup run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Cap on concurrently outstanding registry delete calls
    pub max_concurrent_deletes: usize,
    /// Per-request timeout applied to both upstream HTTP clients
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            max_concurrent_deletes: 8,
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Configuration {
    /// Webhook server configuration
    pub server: ServerConfig,
    /// Source-control API configuration
    pub github: GithubConfig,
    /// Package registry API configuration
    pub registry: RegistryConfig,
    /// Cleanup run tunables
    pub cleanup: CleanupConfig,
}

impl Configuration {
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config = Figment::from(Serialized::defaults(Configuration::default()))
            .merge(Toml::file("pkgsweep.toml"))
            .merge(Env::prefixed("PKGSWEEP__").split("__"))
            .extract()
            .map_err(Box::new)?;

        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, Box<figment::Error>> {
        let config = Figment::from(Serialized::defaults(Configuration::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("PKGSWEEP__").split("__"))
            .extract()
            .map_err(Box::new)?;

        Ok(config)
    }

    /// Names of required settings that are still empty.
    ///
    /// The service starts without them, but every cleanup run will fail
    /// authentication, so `validate` surfaces them up front.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.github.organization.is_empty() {
            missing.push("github.organization");
        }
        if self.github.token.is_empty() {
            missing.push("github.token");
        }
        if self.registry.user.is_empty() {
            missing.push("registry.user");
        }
        if self.registry.repository.is_empty() {
            missing.push("registry.repository");
        }
        if self.registry.api_key.is_empty() {
            missing.push("registry.api_key");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_configuration() {
        let config = Configuration::default();

        assert_eq!(config.server.listen_addr, "0.0.0.0:3000");
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.registry.api_url, "https://packagecloud.io");
        assert_eq!(config.cleanup.max_concurrent_deletes, 8);
        assert_eq!(config.cleanup.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_configless_operation() {
        // Defaults alone must extract without any config file
        let config = Figment::from(Serialized::defaults(Configuration::default()))
            .extract::<Configuration>()
            .unwrap();

        assert_eq!(config.github.user_agent, "pkgsweep");
        assert!(config.github.organization.is_empty());
    }

    #[test]
    fn test_env_var_override() {
        // SAFETY: test-local environment mutation, keys are unique to this test
        unsafe {
            std::env::set_var("PKGSWEEP__GITHUB__ORGANIZATION", "acme");
            std::env::set_var("PKGSWEEP__REGISTRY__API_KEY", "sekrit");
        }

        let config = Figment::from(Serialized::defaults(Configuration::default()))
            .merge(Env::prefixed("PKGSWEEP__").split("__"))
            .extract::<Configuration>()
            .unwrap();

        assert_eq!(config.github.organization, "acme");
        assert_eq!(config.registry.api_key, "sekrit");

        // Clean up
        // SAFETY: removing the same test-local keys
        unsafe {
            std::env::remove_var("PKGSWEEP__GITHUB__ORGANIZATION");
            std::env::remove_var("PKGSWEEP__REGISTRY__API_KEY");
        }
    }

    #[test]
    fn test_missing_required_lists_empty_settings() {
        let mut config = Configuration::default();
        assert_eq!(
            config.missing_required(),
            vec![
                "github.organization",
                "github.token",
                "registry.user",
                "registry.repository",
                "registry.api_key",
            ]
        );

        config.github.organization = "acme".into();
        config.github.token = "t".into();
        config.registry.user = "u".into();
        config.registry.repository = "r".into();
        config.registry.api_key = "k".into();
        assert!(config.missing_required().is_empty());
    }

    #[test]
    fn test_request_timeout_humantime_format() {
        let config = Figment::from(Serialized::defaults(Configuration::default()))
            .merge(Toml::string("[cleanup]\nrequest_timeout = \"5s\"\n"))
            .extract::<Configuration>()
            .unwrap();

        assert_eq!(config.cleanup.request_timeout, Duration::from_secs(5));
    }
}
