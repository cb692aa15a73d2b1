use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use clap::{Parser, Subcommand};
use cleanup::{CleanupService, NotificationEnvelope};
use common::cli::{CommonArgs, CommonCommands, utils};
use github::GithubClient;
use registry::RegistryClient;

/// Concrete service wiring used by the binary
type Sweeper = CleanupService<GithubClient, RegistryClient>;

#[derive(Parser)]
#[command(name = "pkgsweep")]
#[command(about = "pkgsweep - webhook-triggered package registry cleanup")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Option<PkgsweepCommands>,
}

#[derive(Subcommand)]
enum PkgsweepCommands {
    #[command(flatten)]
    Common(CommonCommands),
}

impl Default for PkgsweepCommands {
    fn default() -> Self {
        Self::Common(CommonCommands::Start)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on CLI arguments
    utils::init_logging(&cli.common);

    // Load application configuration
    let config = utils::load_config(cli.common.config.as_ref())?;

    // Handle common commands that don't require starting the service
    let command = cli.command.unwrap_or_default();
    let PkgsweepCommands::Common(ref common_cmd) = command;
    if utils::handle_common_command(common_cmd, &config)? {
        return Ok(()); // Command handled, exit early
    }

    log::info!("Loaded configuration:");
    log::info!("  GitHub organization: {}", config.github.organization);
    log::info!(
        "  Registry repository: {}/{}",
        config.registry.user,
        config.registry.repository
    );
    for missing in config.missing_required() {
        log::warn!("  Missing required setting: {missing}");
    }

    let github = GithubClient::new(&config.github, config.cleanup.request_timeout)
        .context("Failed to build GitHub client")?;
    let registry = RegistryClient::new(&config.registry, config.cleanup.request_timeout)
        .context("Failed to build registry client")?;
    let service = Arc::new(CleanupService::new(
        github,
        registry,
        config.cleanup.max_concurrent_deletes,
    ));

    let app = Router::new()
        .route("/webhook", post(receive_webhook))
        .route("/healthz", get(healthz))
        .with_state(service);

    let addr: SocketAddr = config
        .server
        .listen_addr
        .parse()
        .context("Invalid server.listen_addr")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    log::info!("Listening for webhooks on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Webhook server error")?;

    Ok(())
}

/// POST /webhook
///
/// Consume one notification envelope and answer with the cleanup status line.
/// The exchange always completes with 200; failures are described in the
/// status text and the log.
#[tracing::instrument(skip_all)]
async fn receive_webhook(
    State(service): State<Arc<Sweeper>>,
    Json(envelope): Json<NotificationEnvelope>,
) -> impl IntoResponse {
    let status = cleanup::handle_notification(service.as_ref(), &envelope).await;
    (StatusCode::OK, status)
}

/// GET /healthz
async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for ctrl+c signal: {e}");
    }
}
