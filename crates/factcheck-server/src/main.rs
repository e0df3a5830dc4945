use anyhow::Result;
use axum::Router;
use factcheck_server::config::AppConfig;
use factcheck_server::routes::build_router;
use factcheck_server::state::AppState;
use factcheck_server::telemetry::init_tracing;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let config = AppConfig::from_env()?;
    if config.factcheck.model.api_key.is_none() {
        warn!("GOOGLE_API_KEY not set; fact-check requests will fail until it is provided");
    }
    if config.factcheck.search.api_key.is_none() {
        warn!("SERPER_API_KEY not set; research searches will fail until it is provided");
    }

    let state = AppState::new(&config);
    let app: Router = build_router(state);

    let listener = TcpListener::bind(&config.listen_addr).await?;
    info!(
        address = %config.listen_addr,
        model = %config.factcheck.model.name,
        static_dir = %config.static_dir.display(),
        "factcheck-server listening"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| {
            error!(error = %err, "server shutdown with error");
            err
        })?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            stream.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
}
