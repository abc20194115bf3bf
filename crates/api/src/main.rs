use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use illustrator_api::config::ServerConfig;
use illustrator_api::router::build_app_router;
use illustrator_api::state::AppState;
use illustrator_comfyui::gateway::ComfyUIGateway;
use illustrator_core::gateway::ImageSynthesizer;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "illustrator_api=debug,illustrator_pipeline=debug,illustrator_comfyui=debug,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        output_dir = %config.output_dir,
        comfyui_url = %config.comfyui.api_url,
        "Loaded server configuration",
    );

    // --- Image backend ---
    let gateway = Arc::new(ComfyUIGateway::new(config.comfyui.clone()));
    if let Err(e) = gateway.health().await {
        tracing::warn!(error = %e, "ComfyUI not reachable at startup; requests will fail until it is");
    }

    // --- App state ---
    let state = AppState::new(config.clone(), gateway);
    state
        .store
        .ensure_root()
        .await
        .expect("Failed to create output directory");
    tracing::info!(dir = %state.store.root().display(), "Output directory ready");

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
