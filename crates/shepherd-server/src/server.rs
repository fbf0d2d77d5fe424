//! Server lifecycle: wiring, binding, and graceful shutdown.

use std::sync::Arc;

use tokio::signal;
use tracing::info;

use shepherd_chat::ChatPipeline;
use shepherd_core::{Result, ShepherdConfig, ShepherdError};
use shepherd_llm::OpenAiClient;
use shepherd_store::RestStore;

use crate::routes::{create_router, AppState};

/// Build the production pipeline from config and serve until a shutdown
/// signal arrives.
pub async fn run(config: ShepherdConfig) -> Result<()> {
    let store = Arc::new(RestStore::from_config(&config.store)?);
    let llm = Arc::new(OpenAiClient::from_config(&config.llm)?);

    let pipeline = ChatPipeline::new(store, Arc::clone(&llm), llm, config.search);
    let app = create_router(AppState::new(pipeline));

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .map_err(|e| {
            ShepherdError::config(format!(
                "Failed to bind {}: {}",
                config.server.bind_address, e
            ))
        })?;
    info!("Listening on http://{}", config.server.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ShepherdError::internal(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received TERM signal");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
