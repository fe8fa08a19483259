//! HTTP server lifecycle: bind, serve, graceful shutdown.

use std::net::SocketAddr;

use rusqlite::Connection;
use tokio::sync::oneshot;

use crate::api::router::api_router;
use crate::config::Config;

/// Handle to a running server.
pub struct ApiServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ApiServer {
    /// Signal graceful shutdown. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("shutdown signal sent");
        }
    }
}

/// Bind `config.bind_addr`, mount the router, and serve in a background
/// task. Returns a handle with the bound address and a shutdown channel.
pub async fn start_server(conn: Connection, config: Config) -> anyhow::Result<ApiServer> {
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    let app = api_router(conn, config);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
        };

        tracing::info!(%addr, "server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("server error: {e}");
        }

        tracing::info!("server stopped");
    });

    Ok(ApiServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
    })
}
