//! `serve` subcommand.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

use wsdom_channel_web::{DomServer, DomServerConfig, SessionEvent};
use wsdom_config::{Config, ConfigValidator};
use wsdom_sandbox::ModuleRegistry;

/// Run the WebSocket server until Ctrl-C.
pub(crate) async fn serve(
    mut config: Config,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let warnings = ConfigValidator::validate(&config)?
        .into_result()
        .context("Invalid configuration")?;
    for warning in warnings {
        warn!("Config: {}", warning);
    }

    let modules = Arc::new(ModuleRegistry::new());
    for url in &config.sandbox.preload {
        if !modules.contains(url) {
            warn!("Preload module {} is not registered; imports will fail", url);
        }
    }

    let server_config = DomServerConfig::from_config(&config)?;
    let server = DomServer::new(server_config, modules);
    let addr = server.start().await.context("Failed to start server")?;
    info!("wsdom ready at ws://{}/ws", addr);

    let mut events = server.subscribe();
    let log_events = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SessionEvent::ClientEvent { session_id, event }) => {
                    info!(
                        "[{}] client {} on {}",
                        session_id,
                        event.event_type(),
                        event.target()
                    );
                }
                Ok(SessionEvent::WorkerMessage {
                    session_id,
                    message,
                }) => {
                    info!("[{}] worker message: {}", session_id, message);
                }
                Err(RecvError::Lagged(n)) => warn!("Dropped {} session events", n),
                Err(RecvError::Closed) => break,
            }
        }
    });

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
    server.stop();
    log_events.abort();

    Ok(())
}
