//! WeatherSync Replica - Slave Node
//!
//! Mirrors published snapshots into a local SQLite store.

use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use weathersync_replica::config::Config;
use weathersync_replica::routes::router;
use weathersync_replica::store::LocalStore;
use weathersync_replica::subscriber::{run_subscriber, RedisSubscription};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wsync_replica=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting WeatherSync Replica");
    tracing::info!("Environment: {}", config.environment);

    let store = LocalStore::open(&config.store.path).await?;
    tracing::info!(path = %config.store.path, "local store ready");

    let subscription =
        RedisSubscription::connect(&config.broker.url, &config.broker.channel).await?;

    let receive_store = store.clone();
    tokio::spawn(async move {
        if let Err(error) = run_subscriber(subscription, &receive_store).await {
            tracing::error!(error = %error, "receive loop terminated");
            std::process::exit(1);
        }
    });

    // Liveness plus the local read-back API
    let app = router(store);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
