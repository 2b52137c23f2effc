//! Category store over the durable PostgreSQL pool
//!
//! Each of the five telemetry categories persists into its own insert-only
//! table inside its own transaction, so one category's failure rolls back
//! only that category's writes and never blocks the others.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::PersistError;
use shared::models::{Category, WeatherSnapshot};

/// Durable persistence seam used by the scheduler and the alarm manager
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Persist one category of the snapshot; returns rows written.
    /// An empty category writes nothing and is not an error.
    async fn persist(
        &self,
        category: Category,
        snapshot: &WeatherSnapshot,
    ) -> Result<u64, PersistError>;

    /// Newest current-weather temperature recorded for `city` inside the
    /// given window, for the trailing-delta rules. `None` when no prior
    /// observation qualifies.
    async fn temperature_at(
        &self,
        city: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<Decimal>, PersistError>;

    /// Append one audit record for a fired rule
    async fn record_alert(
        &self,
        message: &str,
        triggered_at: DateTime<Utc>,
    ) -> Result<Uuid, PersistError>;
}

/// Category store backed by an injected connection pool
///
/// The pool is constructed at process start and shared with every component
/// needing durable storage; acquisition beyond the maximum blocks until a
/// connection frees or the acquire timeout elapses.
#[derive(Clone)]
pub struct CategoryStore {
    db: PgPool,
}

impl CategoryStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn insert_current(&self, snapshot: &WeatherSnapshot) -> Result<u64, PersistError> {
        let Some(current) = &snapshot.current else {
            return Ok(0);
        };

        let mut tx = self.db.begin().await.map_err(PersistError::from)?;
        sqlx::query(
            r#"
            INSERT INTO current_weather (
                city, recorded_at, sunrise, sunset, temperature, feels_like,
                pressure, humidity, dew_point, uv_index, cloud_cover_pct,
                visibility_m, wind_speed, wind_deg, wind_gust,
                condition_code, condition_main, condition_description, icon_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(&snapshot.city)
        .bind(current.timestamp)
        .bind(current.sunrise)
        .bind(current.sunset)
        .bind(current.temperature)
        .bind(current.feels_like)
        .bind(current.pressure)
        .bind(current.humidity)
        .bind(current.dew_point)
        .bind(current.uv_index)
        .bind(current.cloud_cover_pct)
        .bind(current.visibility_m)
        .bind(current.wind_speed)
        .bind(current.wind_deg)
        .bind(current.wind_gust)
        .bind(current.condition_code)
        .bind(&current.condition_main)
        .bind(&current.condition_description)
        .bind(&current.icon_id)
        .execute(&mut *tx)
        .await
        .map_err(PersistError::from)?;
        tx.commit().await.map_err(PersistError::from)?;

        Ok(1)
    }

    async fn insert_minutely(&self, snapshot: &WeatherSnapshot) -> Result<u64, PersistError> {
        if snapshot.minutely.is_empty() {
            return Ok(0);
        }

        let mut tx = self.db.begin().await.map_err(PersistError::from)?;
        for minute in &snapshot.minutely {
            sqlx::query(
                "INSERT INTO minutely_forecast (recorded_at, precipitation_mm) VALUES ($1, $2)",
            )
            .bind(minute.timestamp)
            .bind(minute.precipitation_mm)
            .execute(&mut *tx)
            .await
            .map_err(PersistError::from)?;
        }
        tx.commit().await.map_err(PersistError::from)?;

        Ok(snapshot.minutely.len() as u64)
    }

    async fn insert_hourly(&self, snapshot: &WeatherSnapshot) -> Result<u64, PersistError> {
        if snapshot.hourly.is_empty() {
            return Ok(0);
        }

        let mut tx = self.db.begin().await.map_err(PersistError::from)?;
        for hour in &snapshot.hourly {
            sqlx::query(
                r#"
                INSERT INTO hourly_forecast (
                    recorded_at, temperature, feels_like, pressure, humidity,
                    wind_speed, wind_deg, cloud_cover_pct,
                    precipitation_probability, condition_main
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(hour.timestamp)
            .bind(hour.temperature)
            .bind(hour.feels_like)
            .bind(hour.pressure)
            .bind(hour.humidity)
            .bind(hour.wind_speed)
            .bind(hour.wind_deg)
            .bind(hour.cloud_cover_pct)
            .bind(hour.precipitation_probability)
            .bind(&hour.condition_main)
            .execute(&mut *tx)
            .await
            .map_err(PersistError::from)?;
        }
        tx.commit().await.map_err(PersistError::from)?;

        Ok(snapshot.hourly.len() as u64)
    }

    async fn insert_daily(&self, snapshot: &WeatherSnapshot) -> Result<u64, PersistError> {
        if snapshot.daily.is_empty() {
            return Ok(0);
        }

        let mut tx = self.db.begin().await.map_err(PersistError::from)?;
        for day in &snapshot.daily {
            sqlx::query(
                r#"
                INSERT INTO daily_forecast (
                    recorded_at, sunrise, sunset, moonrise, moonset, moon_phase,
                    summary, temp_day, temp_min, temp_max, temp_night, temp_eve,
                    temp_morn, feels_like_day, feels_like_night, feels_like_eve,
                    feels_like_morn, pressure, humidity, wind_speed, wind_deg,
                    cloud_cover_pct, precipitation_probability, rain_mm,
                    uv_index, condition_main
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                        $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26)
                "#,
            )
            .bind(day.timestamp)
            .bind(day.sunrise)
            .bind(day.sunset)
            .bind(day.moonrise)
            .bind(day.moonset)
            .bind(day.moon_phase)
            .bind(&day.summary)
            .bind(day.temp.day)
            .bind(day.temp.min)
            .bind(day.temp.max)
            .bind(day.temp.night)
            .bind(day.temp.eve)
            .bind(day.temp.morn)
            .bind(day.feels_like.day)
            .bind(day.feels_like.night)
            .bind(day.feels_like.eve)
            .bind(day.feels_like.morn)
            .bind(day.pressure)
            .bind(day.humidity)
            .bind(day.wind_speed)
            .bind(day.wind_deg)
            .bind(day.cloud_cover_pct)
            .bind(day.precipitation_probability)
            .bind(day.rain_mm)
            .bind(day.uv_index)
            .bind(&day.condition_main)
            .execute(&mut *tx)
            .await
            .map_err(PersistError::from)?;
        }
        tx.commit().await.map_err(PersistError::from)?;

        Ok(snapshot.daily.len() as u64)
    }

    async fn insert_alerts(&self, snapshot: &WeatherSnapshot) -> Result<u64, PersistError> {
        if snapshot.alerts.is_empty() {
            return Ok(0);
        }

        let mut tx = self.db.begin().await.map_err(PersistError::from)?;
        for alert in &snapshot.alerts {
            sqlx::query(
                r#"
                INSERT INTO weather_alerts (
                    sender_name, event_name, start_time, end_time, description, tags
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(&alert.sender_name)
            .bind(&alert.event_name)
            .bind(alert.start_time)
            .bind(alert.end_time)
            .bind(&alert.description)
            .bind(alert.tags.join(","))
            .execute(&mut *tx)
            .await
            .map_err(PersistError::from)?;
        }
        tx.commit().await.map_err(PersistError::from)?;

        Ok(snapshot.alerts.len() as u64)
    }
}

#[async_trait]
impl SnapshotStore for CategoryStore {
    async fn persist(
        &self,
        category: Category,
        snapshot: &WeatherSnapshot,
    ) -> Result<u64, PersistError> {
        let written = match category {
            Category::Current => self.insert_current(snapshot).await?,
            Category::Minutely => self.insert_minutely(snapshot).await?,
            Category::Hourly => self.insert_hourly(snapshot).await?,
            Category::Daily => self.insert_daily(snapshot).await?,
            Category::Alerts => self.insert_alerts(snapshot).await?,
        };

        if written > 0 {
            tracing::info!(category = %category, rows = written, "category persisted");
        } else {
            tracing::debug!(category = %category, "category empty, nothing persisted");
        }

        Ok(written)
    }

    async fn temperature_at(
        &self,
        city: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<Decimal>, PersistError> {
        let temperature = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT temperature
            FROM current_weather
            WHERE city = $1
              AND recorded_at >= $2
              AND recorded_at <= $3
            ORDER BY recorded_at DESC
            LIMIT 1
            "#,
        )
        .bind(city)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.db)
        .await
        .map_err(PersistError::from)?;

        Ok(temperature)
    }

    async fn record_alert(
        &self,
        message: &str,
        triggered_at: DateTime<Utc>,
    ) -> Result<Uuid, PersistError> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO alerts (message, triggered_at) VALUES ($1, $2) RETURNING id",
        )
        .bind(message)
        .bind(triggered_at)
        .fetch_one(&self.db)
        .await
        .map_err(PersistError::from)?;

        Ok(id)
    }
}
