mod api;
mod middleware;

use std::sync::Arc;

use snaploc_engine::StoreEngine;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::RateLimitState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = snaploc_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(env = %config.env, dataset = %config.dataset_path.display(), "starting snaploc-server");

    let engine = Arc::new(StoreEngine::new(config.dataset_path.clone()));
    spawn_dataset_load(Arc::clone(&engine));

    let state = AppState {
        engine,
        default_k: config.default_k,
        max_k: config.max_k,
    };
    let app = build_app(
        state,
        RateLimitState::per_minute(config.rate_limit_per_minute),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Loads the CSV on a blocking worker. Queries answer 503 until it finishes;
/// a failed load is logged by the engine and leaves the service unavailable.
fn spawn_dataset_load(engine: Arc<StoreEngine>) {
    tokio::task::spawn_blocking(move || {
        if let Err(error) = engine.load() {
            tracing::error!(error = %error, "serving without retailer data; restart to retry");
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
