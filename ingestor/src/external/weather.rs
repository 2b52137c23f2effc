//! Weather provider client
//!
//! Fetches a One Call snapshot for the configured coordinates and translates
//! the provider JSON into the canonical snapshot. The client never retries;
//! the next scheduler cycle is the retry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::ProviderError;
use shared::models::{
    CurrentConditions, DayFeelsLike, DayForecast, DayTemperatures, HourForecast,
    MinutePrecipitation, ProviderAlert, WeatherSnapshot,
};

/// Source of canonical snapshots, one fetch per ingestion cycle
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch(
        &self,
        latitude: Decimal,
        longitude: Decimal,
    ) -> Result<WeatherSnapshot, ProviderError>;
}

/// One Call API client
#[derive(Clone)]
pub struct OpenWeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
    city: String,
    units: String,
    lang: String,
}

impl OpenWeatherClient {
    /// Create a new client against the production endpoint
    pub fn new(api_key: String, city: String, units: String, lang: String) -> Self {
        Self::with_base_url(
            api_key,
            "https://api.openweathermap.org/data/3.0/onecall".to_string(),
            city,
            units,
            lang,
        )
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(
        api_key: String,
        base_url: String,
        city: String,
        units: String,
        lang: String,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
            city,
            units,
            lang,
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn fetch(
        &self,
        latitude: Decimal,
        longitude: Decimal,
    ) -> Result<WeatherSnapshot, ProviderError> {
        let url = format!(
            "{}?lat={}&lon={}&appid={}&units={}&lang={}",
            self.base_url, latitude, longitude, self.api_key, self.units, self.lang
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Transport(format!("{} - {}", status, body)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        snapshot_from_json(&self.city, &body)
    }
}

/// Translate a provider response body into the canonical snapshot
///
/// Absent optional categories map to empty sequences; a missing `current`
/// block or coordinate echo is a malformed response.
pub fn snapshot_from_json(city: &str, body: &str) -> Result<WeatherSnapshot, ProviderError> {
    let data: OneCallResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;

    let (lat, lon) = match (data.lat, data.lon) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => {
            return Err(ProviderError::Malformed(
                "missing coordinate echo".to_string(),
            ))
        }
    };
    let current = data
        .current
        .ok_or_else(|| ProviderError::Malformed("missing current category".to_string()))?;

    Ok(WeatherSnapshot {
        city: city.to_string(),
        latitude: dec(lat),
        longitude: dec(lon),
        current: Some(convert_current(current)),
        minutely: data.minutely.into_iter().map(convert_minute).collect(),
        hourly: data.hourly.into_iter().map(convert_hour).collect(),
        daily: data.daily.into_iter().map(convert_day).collect(),
        alerts: data.alerts.into_iter().map(convert_alert).collect(),
    })
}

fn convert_current(raw: OneCallCurrent) -> CurrentConditions {
    let condition = raw.weather.into_iter().next().unwrap_or_default();
    CurrentConditions {
        timestamp: ts(raw.dt),
        sunrise: ts(raw.sunrise),
        sunset: ts(raw.sunset),
        temperature: dec(raw.temp),
        feels_like: dec(raw.feels_like),
        pressure: raw.pressure,
        humidity: raw.humidity,
        dew_point: dec(raw.dew_point),
        uv_index: dec(raw.uvi),
        cloud_cover_pct: raw.clouds,
        visibility_m: raw.visibility.unwrap_or(10000),
        wind_speed: dec(raw.wind_speed),
        wind_deg: raw.wind_deg.unwrap_or(0),
        wind_gust: raw.wind_gust.map(dec),
        condition_code: condition.id,
        condition_main: condition.main,
        condition_description: condition.description,
        icon_id: condition.icon,
    }
}

fn convert_minute(raw: OneCallMinute) -> MinutePrecipitation {
    MinutePrecipitation {
        timestamp: ts(raw.dt),
        precipitation_mm: dec(raw.precipitation),
    }
}

fn convert_hour(raw: OneCallHour) -> HourForecast {
    let condition = raw.weather.into_iter().next().unwrap_or_default();
    HourForecast {
        timestamp: ts(raw.dt),
        temperature: dec(raw.temp),
        feels_like: dec(raw.feels_like),
        pressure: raw.pressure,
        humidity: raw.humidity,
        wind_speed: dec(raw.wind_speed),
        wind_deg: raw.wind_deg.unwrap_or(0),
        cloud_cover_pct: raw.clouds,
        precipitation_probability: dec(raw.pop),
        condition_main: condition.main,
    }
}

fn convert_day(raw: OneCallDay) -> DayForecast {
    let condition = raw.weather.into_iter().next().unwrap_or_default();
    DayForecast {
        timestamp: ts(raw.dt),
        sunrise: ts(raw.sunrise),
        sunset: ts(raw.sunset),
        moonrise: ts(raw.moonrise),
        moonset: ts(raw.moonset),
        moon_phase: dec(raw.moon_phase),
        summary: raw.summary.unwrap_or_default(),
        temp: DayTemperatures {
            day: dec(raw.temp.day),
            min: dec(raw.temp.min),
            max: dec(raw.temp.max),
            night: dec(raw.temp.night),
            eve: dec(raw.temp.eve),
            morn: dec(raw.temp.morn),
        },
        feels_like: DayFeelsLike {
            day: dec(raw.feels_like.day),
            night: dec(raw.feels_like.night),
            eve: dec(raw.feels_like.eve),
            morn: dec(raw.feels_like.morn),
        },
        pressure: raw.pressure,
        humidity: raw.humidity,
        wind_speed: dec(raw.wind_speed),
        wind_deg: raw.wind_deg.unwrap_or(0),
        cloud_cover_pct: raw.clouds,
        precipitation_probability: dec(raw.pop),
        rain_mm: raw.rain.map(dec).unwrap_or_default(),
        uv_index: dec(raw.uvi),
        condition_main: condition.main,
    }
}

fn convert_alert(raw: OneCallAlert) -> ProviderAlert {
    ProviderAlert {
        sender_name: raw.sender_name,
        event_name: raw.event,
        start_time: ts(raw.start),
        end_time: ts(raw.end),
        description: raw.description,
        tags: raw.tags,
    }
}

fn dec(value: f64) -> Decimal {
    Decimal::from_f64_retain(value).unwrap_or_default()
}

fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
}

/// One Call API response
#[derive(Debug, Deserialize)]
struct OneCallResponse {
    lat: Option<f64>,
    lon: Option<f64>,
    current: Option<OneCallCurrent>,
    #[serde(default)]
    minutely: Vec<OneCallMinute>,
    #[serde(default)]
    hourly: Vec<OneCallHour>,
    #[serde(default)]
    daily: Vec<OneCallDay>,
    #[serde(default)]
    alerts: Vec<OneCallAlert>,
}

#[derive(Debug, Deserialize)]
struct OneCallCurrent {
    dt: i64,
    sunrise: i64,
    sunset: i64,
    temp: f64,
    feels_like: f64,
    pressure: i32,
    humidity: i32,
    dew_point: f64,
    uvi: f64,
    clouds: i32,
    visibility: Option<i32>,
    wind_speed: f64,
    wind_deg: Option<i32>,
    wind_gust: Option<f64>,
    #[serde(default)]
    weather: Vec<OneCallCondition>,
}

#[derive(Debug, Deserialize, Default)]
struct OneCallCondition {
    id: i32,
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OneCallMinute {
    dt: i64,
    precipitation: f64,
}

#[derive(Debug, Deserialize)]
struct OneCallHour {
    dt: i64,
    temp: f64,
    feels_like: f64,
    pressure: i32,
    humidity: i32,
    wind_speed: f64,
    wind_deg: Option<i32>,
    clouds: i32,
    pop: f64,
    #[serde(default)]
    weather: Vec<OneCallCondition>,
}

#[derive(Debug, Deserialize)]
struct OneCallDay {
    dt: i64,
    sunrise: i64,
    sunset: i64,
    moonrise: i64,
    moonset: i64,
    moon_phase: f64,
    summary: Option<String>,
    temp: OneCallDayTemp,
    feels_like: OneCallDayFeels,
    pressure: i32,
    humidity: i32,
    wind_speed: f64,
    wind_deg: Option<i32>,
    clouds: i32,
    pop: f64,
    rain: Option<f64>,
    uvi: f64,
    #[serde(default)]
    weather: Vec<OneCallCondition>,
}

#[derive(Debug, Deserialize)]
struct OneCallDayTemp {
    day: f64,
    min: f64,
    max: f64,
    night: f64,
    eve: f64,
    morn: f64,
}

#[derive(Debug, Deserialize)]
struct OneCallDayFeels {
    day: f64,
    night: f64,
    eve: f64,
    morn: f64,
}

#[derive(Debug, Deserialize)]
struct OneCallAlert {
    sender_name: String,
    event: String,
    start: i64,
    end: i64,
    description: String,
    #[serde(default)]
    tags: Vec<String>,
}
