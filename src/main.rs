use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use renalplate::config::{Args, Secrets};
use renalplate::rate_limit::spawn_sweeper;
use renalplate::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // parse cli arguments, then pull credentials from the environment
    let args = Args::parse();
    let secrets = Secrets::from_env();

    let analysis = secrets.api_key.is_some();
    let push = secrets.vapid.is_some();

    let state = Arc::new(AppState::new(&args, secrets));

    spawn_sweeper(
        state.rate_limiter.clone(),
        Duration::from_secs(args.sweep_interval),
    );

    let app = renalplate::app(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();

    info!("renalplate API running on http://localhost:{}", args.port);
    info!("Model: {} via {}", args.model, args.upstream_url);
    info!(
        "Rate limit: {} requests per {} seconds",
        args.rate_limit, args.rate_window
    );
    info!(analysis, push, "feature availability");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    info!("Server shut down");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
