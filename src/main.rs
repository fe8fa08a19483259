use tracing_subscriber::EnvFilter;

use afyalink::api::api_router;
use afyalink::config::{self, Config};
use afyalink::db::sqlite::open_database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let config = Config::from_env();
    tracing::info!(
        db = %config.db_path.display(),
        addr = %config.bind_addr,
        "starting {} v{}",
        config::APP_NAME,
        config::APP_VERSION
    );

    let conn = open_database(&config.db_path)?;
    let bind_addr = config.bind_addr;
    let app = api_router(conn, config);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}
