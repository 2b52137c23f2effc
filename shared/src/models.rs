//! Canonical weather snapshot model
//!
//! One `WeatherSnapshot` is produced per ingestion cycle, persisted
//! category-by-category on the master side, and replicated verbatim over the
//! broker channel to the replicas.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The five telemetry resolutions persisted independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Current,
    Minutely,
    Hourly,
    Daily,
    Alerts,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Current,
        Category::Minutely,
        Category::Hourly,
        Category::Daily,
        Category::Alerts,
    ];

    /// Durable table backing this category
    pub fn table_name(&self) -> &'static str {
        match self {
            Category::Current => "current_weather",
            Category::Minutely => "minutely_forecast",
            Category::Hourly => "hourly_forecast",
            Category::Daily => "daily_forecast",
            Category::Alerts => "weather_alerts",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Root aggregate for one ingestion cycle
///
/// `city` is the configured location name; the provider echoes only the
/// coordinates. A snapshot without `current` is invalid for persistence and
/// publication, while empty sequence categories are simply skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city: String,
    pub latitude: Decimal,
    pub longitude: Decimal,
    pub current: Option<CurrentConditions>,
    #[serde(default)]
    pub minutely: Vec<MinutePrecipitation>,
    #[serde(default)]
    pub hourly: Vec<HourForecast>,
    #[serde(default)]
    pub daily: Vec<DayForecast>,
    #[serde(default)]
    pub alerts: Vec<ProviderAlert>,
}

impl WeatherSnapshot {
    /// A snapshot missing the `current` category must not be persisted
    /// or published.
    pub fn is_publishable(&self) -> bool {
        self.current.is_some()
    }
}

/// Single current-conditions record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub timestamp: DateTime<Utc>,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    pub temperature: Decimal,
    pub feels_like: Decimal,
    pub pressure: i32,
    pub humidity: i32,
    pub dew_point: Decimal,
    pub uv_index: Decimal,
    pub cloud_cover_pct: i32,
    pub visibility_m: i32,
    pub wind_speed: Decimal,
    pub wind_deg: i32,
    pub wind_gust: Option<Decimal>,
    pub condition_code: i32,
    pub condition_main: String,
    pub condition_description: String,
    pub icon_id: String,
}

/// Minute-resolution precipitation entry, chronological
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinutePrecipitation {
    pub timestamp: DateTime<Utc>,
    pub precipitation_mm: Decimal,
}

/// Hour-resolution forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourForecast {
    pub timestamp: DateTime<Utc>,
    pub temperature: Decimal,
    pub feels_like: Decimal,
    pub pressure: i32,
    pub humidity: i32,
    pub wind_speed: Decimal,
    pub wind_deg: i32,
    pub cloud_cover_pct: i32,
    pub precipitation_probability: Decimal,
    pub condition_main: String,
}

/// Day/min/max/night/eve/morn temperature block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayTemperatures {
    pub day: Decimal,
    pub min: Decimal,
    pub max: Decimal,
    pub night: Decimal,
    pub eve: Decimal,
    pub morn: Decimal,
}

/// Feels-like block for a daily entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayFeelsLike {
    pub day: Decimal,
    pub night: Decimal,
    pub eve: Decimal,
    pub morn: Decimal,
}

/// Day-resolution forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    pub timestamp: DateTime<Utc>,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    pub moonrise: DateTime<Utc>,
    pub moonset: DateTime<Utc>,
    pub moon_phase: Decimal,
    pub summary: String,
    pub temp: DayTemperatures,
    pub feels_like: DayFeelsLike,
    pub pressure: i32,
    pub humidity: i32,
    pub wind_speed: Decimal,
    pub wind_deg: i32,
    pub cloud_cover_pct: i32,
    pub precipitation_probability: Decimal,
    /// Absent in dry forecasts; defaults to zero
    #[serde(default)]
    pub rain_mm: Decimal,
    pub uv_index: Decimal,
    pub condition_main: String,
}

/// Government/provider weather warning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderAlert {
    pub sender_name: String,
    pub event_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Serialize a snapshot to the channel payload text encoding
pub fn encode_payload(snapshot: &WeatherSnapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string(snapshot)
}

/// Decode a channel payload back into a snapshot
pub fn decode_payload(payload: &str) -> Result<WeatherSnapshot, serde_json::Error> {
    serde_json::from_str(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn sample_current() -> CurrentConditions {
        CurrentConditions {
            timestamp: ts(1_700_000_000),
            sunrise: ts(1_699_980_000),
            sunset: ts(1_700_020_000),
            temperature: dec("21.37"),
            feels_like: dec("20.9"),
            pressure: 1013,
            humidity: 64,
            dew_point: dec("14.2"),
            uv_index: dec("3.1"),
            cloud_cover_pct: 40,
            visibility_m: 10000,
            wind_speed: dec("4.63"),
            wind_deg: 180,
            wind_gust: Some(dec("7.2")),
            condition_code: 802,
            condition_main: "Clouds".to_string(),
            condition_description: "多云".to_string(),
            icon_id: "03d".to_string(),
        }
    }

    fn sample_snapshot() -> WeatherSnapshot {
        WeatherSnapshot {
            city: "Beijing".to_string(),
            latitude: dec("39.9042"),
            longitude: dec("116.4074"),
            current: Some(sample_current()),
            minutely: vec![MinutePrecipitation {
                timestamp: ts(1_700_000_060),
                precipitation_mm: dec("0.25"),
            }],
            hourly: vec![HourForecast {
                timestamp: ts(1_700_003_600),
                temperature: dec("22.01"),
                feels_like: dec("21.5"),
                pressure: 1012,
                humidity: 60,
                wind_speed: dec("5.1"),
                wind_deg: 190,
                cloud_cover_pct: 55,
                precipitation_probability: dec("0.12"),
                condition_main: "Clouds".to_string(),
            }],
            daily: vec![],
            alerts: vec![ProviderAlert {
                sender_name: "CMA".to_string(),
                event_name: "Rainstorm Warning".to_string(),
                start_time: ts(1_700_000_000),
                end_time: ts(1_700_086_400),
                description: "暴雨蓝色预警".to_string(),
                tags: vec!["Rain".to_string()],
            }],
        }
    }

    #[test]
    fn payload_round_trip_is_field_for_field_equal() {
        let snapshot = sample_snapshot();
        let payload = encode_payload(&snapshot).unwrap();
        let decoded = decode_payload(&payload).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn round_trip_preserves_decimal_precision() {
        let snapshot = sample_snapshot();
        let decoded = decode_payload(&encode_payload(&snapshot).unwrap()).unwrap();
        let current = decoded.current.unwrap();
        assert_eq!(current.temperature, dec("21.37"));
        assert_eq!(current.wind_gust, Some(dec("7.2")));
        assert_eq!(decoded.minutely[0].precipitation_mm, dec("0.25"));
    }

    #[test]
    fn snapshot_without_current_is_not_publishable() {
        let mut snapshot = sample_snapshot();
        assert!(snapshot.is_publishable());
        snapshot.current = None;
        assert!(!snapshot.is_publishable());
    }

    #[test]
    fn empty_categories_decode_as_empty() {
        let payload = r#"{"city":"Beijing","latitude":"39.9","longitude":"116.4","current":null}"#;
        let decoded = decode_payload(payload).unwrap();
        assert!(decoded.minutely.is_empty());
        assert!(decoded.alerts.is_empty());
        assert!(decoded.current.is_none());
    }

    #[test]
    fn daily_rain_defaults_to_zero() {
        let daily = serde_json::json!({
            "timestamp": "2023-11-14T22:13:20Z",
            "sunrise": "2023-11-14T22:13:20Z",
            "sunset": "2023-11-14T22:13:20Z",
            "moonrise": "2023-11-14T22:13:20Z",
            "moonset": "2023-11-14T22:13:20Z",
            "moon_phase": "0.5",
            "summary": "Clear",
            "temp": {"day":"20","min":"12","max":"24","night":"14","eve":"19","morn":"13"},
            "feels_like": {"day":"19","night":"13","eve":"18","morn":"12"},
            "pressure": 1015,
            "humidity": 50,
            "wind_speed": "3.2",
            "wind_deg": 90,
            "cloud_cover_pct": 5,
            "precipitation_probability": "0",
            "uv_index": "4.5",
            "condition_main": "Clear"
        });
        let decoded: DayForecast = serde_json::from_value(daily).unwrap();
        assert_eq!(decoded.rain_mm, Decimal::ZERO);
    }

    #[test]
    fn category_tables_are_distinct() {
        let mut names: Vec<_> = Category::ALL.iter().map(|c| c.table_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 5);
    }
}
