//! WeatherSync Ingestor - Master Node
//!
//! Polls the weather provider, persists every telemetry category, publishes
//! the canonical snapshot for replicas, and fires threshold alerts.

use axum::{routing::get, Router};
use rust_decimal::Decimal;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use weathersync_ingestor::config::Config;
use weathersync_ingestor::external::sms::SmsSender;
use weathersync_ingestor::external::weather::OpenWeatherClient;
use weathersync_ingestor::services::alarm::{AlarmManager, AlertRule};
use weathersync_ingestor::services::publisher::RedisPublisher;
use weathersync_ingestor::services::scheduler::IngestScheduler;
use weathersync_ingestor::services::store::CategoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wsync_ingestor=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting WeatherSync Ingestor");
    tracing::info!("Environment: {}", config.environment);

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    // Run migrations in development
    if config.environment == "development" {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        tracing::info!("Migrations completed");
    }

    // Wire up the pipeline
    let provider = Arc::new(OpenWeatherClient::with_base_url(
        config.provider.api_key.clone(),
        config.provider.api_endpoint.clone(),
        config.provider.city.clone(),
        config.provider.units.clone(),
        config.provider.lang.clone(),
    ));
    let store = Arc::new(CategoryStore::new(db_pool));
    let publisher = Arc::new(RedisPublisher::new(
        &config.broker.url,
        config.broker.channel.clone(),
    )?);
    let notifier = Arc::new(SmsSender::new(config.alarm.sms_api_url.clone()));
    let alarm = AlarmManager::new(
        AlertRule::from_config(&config.alarm.rules),
        store.clone(),
        notifier,
        config.alarm.recipients.clone(),
    );

    let latitude = Decimal::from_f64_retain(config.provider.latitude)
        .ok_or_else(|| anyhow::anyhow!("invalid provider latitude"))?;
    let longitude = Decimal::from_f64_retain(config.provider.longitude)
        .ok_or_else(|| anyhow::anyhow!("invalid provider longitude"))?;

    let scheduler = IngestScheduler::new(
        provider,
        store,
        publisher,
        Some(alarm),
        latitude,
        longitude,
    );

    let interval = Duration::from_secs(config.scheduler.interval_secs);
    tokio::spawn(async move {
        scheduler.run(interval).await;
    });

    // Liveness endpoints
    let app = Router::new()
        .route("/", get(root))
        .route("/api/health", get(health_check))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Root endpoint
async fn root() -> &'static str {
    "WeatherSync Ingestor v1.0"
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
