//! Local read-back API
//!
//! Read-only view over the replicated records. Shares nothing with the
//! receive loop beyond the store handle.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::store::LocalStore;
use shared::validation::NormalizedRecord;

#[derive(Debug, Deserialize)]
pub struct LocalQuery {
    /// Maximum number of records to return, newest first
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize)]
pub struct LocalWeatherResponse {
    /// Total rows held locally
    pub count: i64,
    /// Newest records first, at most `limit`
    pub records: Vec<NormalizedRecord>,
}

/// Build the replica router: liveness endpoints plus the local read-back
pub fn router(store: LocalStore) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health_check))
        .route("/api/weather/local", get(local_weather))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

/// Root endpoint
async fn root() -> &'static str {
    "WeatherSync Replica v1.0"
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Most recently replicated records
async fn local_weather(
    State(store): State<LocalStore>,
    Query(query): Query<LocalQuery>,
) -> Result<Json<LocalWeatherResponse>, StatusCode> {
    let limit = query.limit.clamp(1, 100);

    let records = store.latest(limit).await.map_err(|error| {
        tracing::error!(error = %error, "local store read failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let count = store.count().await.map_err(|error| {
        tracing::error!(error = %error, "local store count failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(LocalWeatherResponse { count, records }))
}
