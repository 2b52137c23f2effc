//! Local replica store
//!
//! Flat SQLite table holding one row per accepted message, append-only.
//! The schema is created on startup; there is no migration history to keep.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use crate::error::ReplicaError;
use shared::validation::NormalizedRecord;

#[derive(Clone)]
pub struct LocalStore {
    db: SqlitePool,
}

impl LocalStore {
    /// Open (creating if missing) the store at `path` and ensure the schema
    pub async fn open(path: &str) -> Result<Self, ReplicaError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let db = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let store = Self { db };
        store.init().await?;
        Ok(store)
    }

    /// Store over an existing pool, for in-memory testing
    pub async fn with_pool(db: SqlitePool) -> Result<Self, ReplicaError> {
        let store = Self { db };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> Result<(), ReplicaError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS weather_data (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                city TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                temperature REAL NOT NULL,
                humidity REAL NOT NULL,
                weather TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.db)
        .await?;
        Ok(())
    }

    /// Append one accepted record; returns its rowid
    pub async fn insert(&self, record: &NormalizedRecord) -> Result<i64, ReplicaError> {
        let result = sqlx::query(
            r#"
            INSERT INTO weather_data
                (city, latitude, longitude, temperature, humidity, weather, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.city)
        .bind(record.latitude)
        .bind(record.longitude)
        .bind(record.temperature)
        .bind(record.humidity)
        .bind(&record.weather)
        .bind(&record.recorded_at)
        .execute(&self.db)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Most recently inserted records, newest first
    pub async fn latest(&self, limit: i64) -> Result<Vec<NormalizedRecord>, ReplicaError> {
        let rows = sqlx::query(
            r#"
            SELECT city, latitude, longitude, temperature, humidity, weather, recorded_at
            FROM weather_data
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| NormalizedRecord {
                city: row.get("city"),
                latitude: row.get("latitude"),
                longitude: row.get("longitude"),
                temperature: row.get("temperature"),
                humidity: row.get("humidity"),
                weather: row.get("weather"),
                recorded_at: row.get("recorded_at"),
            })
            .collect())
    }

    /// Total rows held locally
    pub async fn count(&self) -> Result<i64, ReplicaError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM weather_data")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }
}
