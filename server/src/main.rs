use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::info;

use dcfcrew::OpenAiPipelineFactory;
use dcfcrew_server::config::LogFormat;
use dcfcrew_server::{create_router, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid config: {}", e))?;

    dcfcrew_server::telemetry::init_tracing(
        &config.log_level,
        config.log_format.unwrap_or(LogFormat::Pretty),
    )
    .context("Failed to initialise logging")?;

    let addr = config
        .socket_addr()
        .map_err(|e| anyhow::anyhow!(e))?;

    let factory = OpenAiPipelineFactory::new(config.pipeline_config());
    info!(
        model = %factory.config().openai.model,
        stage_timeout = ?config.stage_timeout,
        "pipeline configured"
    );

    let state = AppState::new(Arc::new(factory));
    let app = create_router(state, &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Server listening on: http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install TERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Received shutdown signal");
}
