//! yumcup-gs - Main entry point
//!
//! Bracket game server: loads configuration, builds the candidate catalog,
//! and serves the game protocol until Ctrl+C or SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yumcup_common::config::{resolve_config_path, TomlConfig};
use yumcup_gs::engine::GameRegistry;
use yumcup_gs::provider::build_provider;
use yumcup_gs::{build_router, AppState};

/// Command-line arguments for yumcup-gs
#[derive(Parser, Debug)]
#[command(name = "yumcup-gs")]
#[command(about = "Venue bracket game server")]
#[command(version)]
struct Args {
    /// Config file (overrides YUMCUP_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the config file
    #[arg(short, long, env = "YUMCUP_BIND")]
    bind: Option<String>,

    /// Kakao REST API key, overrides the config file
    #[arg(long, env = "KAKAO_API_KEY", hide_env_values = true)]
    kakao_api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if args.kakao_api_key.is_some() {
        config.provider.kakao_api_key = args.kakao_api_key;
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("yumcup_gs={0},yumcup_common={0},tower_http=info", config.logging.level)
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting yumcup-gs v{}", env!("CARGO_PKG_VERSION"));
    match resolve_config_path(args.config.as_deref()) {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("Configuration: compiled defaults"),
    }

    let provider = build_provider(&config.provider).context("Failed to build candidate provider")?;
    info!(provider = provider.name(), "Candidate provider ready");

    let idle_timeout = Duration::from_secs(config.game_idle_timeout_secs);
    let registry = Arc::new(GameRegistry::new(idle_timeout));
    let sweep_every = (idle_timeout / 4).max(Duration::from_secs(30));
    let sweeper = registry.clone().spawn_sweeper(sweep_every);

    let state = AppState::new(
        provider,
        registry,
        config.max_candidates,
        config.legacy.clone(),
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;
    info!("Listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    sweeper.abort();
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }
}
