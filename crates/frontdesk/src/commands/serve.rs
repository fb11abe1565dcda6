//! HTTP server command implementation.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tokio::signal;
use tracing::{info, warn};

use frontdesk::bundle::BundleStore;
use frontdesk::config::Config;
use frontdesk::llm::ProviderRegistry;
use frontdesk::router::ResponseRouter;
use frontdesk::server::{self, AppState};
use frontdesk::session::SessionStore;

pub async fn run(
    config_path: &str,
    host_override: Option<IpAddr>,
    port_override: Option<u16>,
    config_dir_override: Option<&Path>,
) -> Result<()> {
    let mut config = Config::load(config_path).await?;

    // CLI overrides config
    if let Some(host) = host_override {
        config.server.host = host.to_string();
    }
    if let Some(port) = port_override {
        config.server.port = port;
    }

    let dir = super::bundle_dir(&config, config_path, config_dir_override);
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "Config directory not found, serving empty defaults");
    }

    // Initial snapshot; later requests pick up file changes on their own
    let bundles = BundleStore::open(dir.clone()).await;
    let bundle = bundles.current().await;
    info!(
        dir = %dir.display(),
        clinic = %bundle.clinic_name(),
        max_turns = bundle.settings.max_turns,
        admin = bundle.settings.admin_enabled,
        "Loaded configuration"
    );

    let providers = ProviderRegistry::from_env();

    let sessions = SessionStore::new();
    let sweeper = match config.sessions.sweep_interval_seconds {
        0 => None,
        secs => {
            info!(interval_seconds = secs, "Session sweep enabled");
            Some(sessions.spawn_sweeper(Duration::from_secs(secs)))
        }
    };

    let router = ResponseRouter::new(
        sessions,
        providers.generator(),
        providers.default_model().to_string(),
    );

    let state = AppState {
        bundles,
        router,
        cors_origins: bundle.settings.cors_origins.clone(),
        max_connections: config.server.max_connections,
    };

    let app = server::build_app(state, config.server.request_timeout_seconds);

    let ip: IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::new(ip, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(addr = %addr, "Starting server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = sweeper {
        handle.abort();
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
