//! Storefront Store - storefront and back-office API over an embedded JSON store

use anyhow::Result;
use storefront_store::{api, EventPublisher, ShopStore, StoreConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let config = StoreConfig::from_env()?;
    let publisher = match &config.nats_url {
        Some(url) => EventPublisher::connect(url).await,
        None => EventPublisher::disabled(),
    };
    let store = ShopStore::open(&config, publisher).await?;
    let app = api::router(api::AppState::new(store.clone()));

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(%addr, persistent = store.is_persistent(), "storefront store listening");
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.flush().await?;
    tracing::info!("store flushed, shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
