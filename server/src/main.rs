mod app;
mod config;
mod routes;
mod services;
mod state;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let region = config::region();
    let update_mode = config::update_mode();
    let index_path = config::client_dist_dir().join("index.html");
    let index_template = match tokio::fs::read_to_string(&index_path).await {
        Ok(template) => Some(template),
        Err(e) => {
            tracing::warn!(
                error = %e,
                path = %index_path.display(),
                "client index.html not found, serving bare shell"
            );
            None
        }
    };
    tracing::info!(
        region = region.key(),
        update_mode = update_mode.as_str(),
        "starting {}",
        region.title()
    );

    let state = AppState::new(region, update_mode, index_template);

    // Spawn background services
    tokio::spawn(services::user_source::run(state.clone()));

    let app = app::build_app(state);

    let addr = format!("0.0.0.0:{}", config::SERVER_PORT);
    tracing::info!("Leaderboard server listening on {addr}");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind TCP listener");
            return;
        }
    };
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server failed");
    }

    tracing::info!("Server shut down gracefully");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
