use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Common CLI arguments shared across pkgsweep binaries
#[derive(Parser, Debug, Clone)]
pub struct CommonArgs {
    #[arg(long, help = "Configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, help = "Enable quiet mode (minimal output)")]
    pub quiet: bool,
}

/// Common subcommands available for the service
#[derive(Subcommand, Debug, Clone, Default)]
pub enum CommonCommands {
    /// Start the service (default behavior)
    #[default]
    Start,
    /// Show current configuration and exit
    Config {
        #[arg(long, help = "Show configuration in JSON format")]
        json: bool,
    },
    /// Validate configuration and exit
    Validate,
    /// Show version information and exit
    Version,
}

/// Utility functions for CLI operations
pub mod utils {
    use super::*;
    use crate::config::Configuration;
    use anyhow::{Context, Result};

    /// Initialize logging based on CLI arguments
    pub fn init_logging(args: &CommonArgs) {
        let level = if args.quiet {
            "warn"
        } else if args.verbose {
            "debug"
        } else {
            "info"
        };

        // SAFETY: Setting RUST_LOG environment variable is safe for logging configuration
        unsafe {
            std::env::set_var("RUST_LOG", level);
        }
        tracing_subscriber::fmt::init();
    }

    /// Load configuration with optional override from CLI
    pub fn load_config(config_path: Option<&PathBuf>) -> Result<Configuration> {
        match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Configuration::load_from_path(path).context("Failed to load configuration")
            }
            None => Configuration::load().context("Failed to load configuration"),
        }
    }

    /// Display configuration in human-readable or JSON format
    pub fn display_config(config: &Configuration, json: bool) -> Result<()> {
        if json {
            let json = serde_json::to_string_pretty(config)
                .context("Failed to serialize configuration to JSON")?;
            println!("{json}");
        } else {
            println!("pkgsweep Configuration:");
            println!("=======================");
            println!("Listen address: {}", config.server.listen_addr);
            println!("GitHub API: {}", config.github.api_url);
            println!("GitHub organization: {}", config.github.organization);
            println!(
                "Registry: {}/{} at {}",
                config.registry.user, config.registry.repository, config.registry.api_url
            );
            println!(
                "Max concurrent deletes: {}",
                config.cleanup.max_concurrent_deletes
            );
            println!("Request timeout: {:?}", config.cleanup.request_timeout);
        }
        Ok(())
    }

    /// Handle common commands that short-circuit service startup.
    ///
    /// Returns `true` when the command was handled and the process should exit.
    pub fn handle_common_command(command: &CommonCommands, config: &Configuration) -> Result<bool> {
        match command {
            CommonCommands::Start => Ok(false),
            CommonCommands::Config { json } => {
                display_config(config, *json)?;
                Ok(true)
            }
            CommonCommands::Validate => {
                let missing = config.missing_required();
                if missing.is_empty() {
                    println!("Configuration is valid.");
                } else {
                    println!("Configuration is incomplete, missing: {}", missing.join(", "));
                }
                Ok(true)
            }
            CommonCommands::Version => {
                println!("pkgsweep {}", env!("CARGO_PKG_VERSION"));
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_start() {
        assert!(matches!(CommonCommands::default(), CommonCommands::Start));
    }

    #[test]
    fn test_handle_start_does_not_exit() {
        let config = crate::config::Configuration::default();
        let handled = utils::handle_common_command(&CommonCommands::Start, &config).unwrap();
        assert!(!handled);
    }

    #[test]
    fn test_handle_version_exits_early() {
        let config = crate::config::Configuration::default();
        let handled = utils::handle_common_command(&CommonCommands::Version, &config).unwrap();
        assert!(handled);
    }
}
