//! Provider response translation tests

use rust_decimal::Decimal;
use weathersync_ingestor::error::ProviderError;
use weathersync_ingestor::external::weather::snapshot_from_json;

fn full_response() -> &'static str {
    r#"{
        "lat": 39.9042,
        "lon": 116.4074,
        "timezone": "Asia/Shanghai",
        "timezone_offset": 28800,
        "current": {
            "dt": 1714550400,
            "sunrise": 1714513000,
            "sunset": 1714562000,
            "temp": 22.5,
            "feels_like": 21.8,
            "pressure": 1012,
            "humidity": 48,
            "dew_point": 10.9,
            "uvi": 6.3,
            "clouds": 20,
            "visibility": 10000,
            "wind_speed": 3.6,
            "wind_deg": 180,
            "wind_gust": 5.2,
            "weather": [
                {"id": 801, "main": "Clouds", "description": "少云", "icon": "02d"}
            ]
        },
        "minutely": [
            {"dt": 1714550400, "precipitation": 0.0},
            {"dt": 1714550460, "precipitation": 0.25}
        ],
        "hourly": [
            {
                "dt": 1714554000, "temp": 23.1, "feels_like": 22.4,
                "pressure": 1011, "humidity": 45, "wind_speed": 4.1,
                "wind_deg": 190, "clouds": 15, "pop": 0.1,
                "weather": [{"id": 800, "main": "Clear", "description": "晴", "icon": "01d"}]
            }
        ],
        "daily": [
            {
                "dt": 1714536000, "sunrise": 1714513000, "sunset": 1714562000,
                "moonrise": 1714520000, "moonset": 1714570000, "moon_phase": 0.75,
                "summary": "Partly cloudy throughout the day",
                "temp": {"day": 24.0, "min": 14.2, "max": 25.6, "night": 16.1, "eve": 22.3, "morn": 15.0},
                "feels_like": {"day": 23.4, "night": 15.8, "eve": 21.9, "morn": 14.6},
                "pressure": 1012, "humidity": 40, "wind_speed": 5.0, "wind_deg": 200,
                "clouds": 30, "pop": 0.2, "rain": 1.4, "uvi": 7.1,
                "weather": [{"id": 802, "main": "Clouds", "description": "多云", "icon": "03d"}]
            }
        ],
        "alerts": [
            {
                "sender_name": "NMC", "event": "Rainstorm Warning",
                "start": 1714550000, "end": 1714600000,
                "description": "Heavy rain expected", "tags": ["Rain", "Flood"]
            }
        ]
    }"#
}

#[test]
fn full_response_translates_every_category() {
    let snapshot = snapshot_from_json("Beijing", full_response()).unwrap();

    assert_eq!(snapshot.city, "Beijing");
    assert_eq!(snapshot.latitude, Decimal::from_f64_retain(39.9042).unwrap());
    assert_eq!(snapshot.longitude, Decimal::from_f64_retain(116.4074).unwrap());

    let current = snapshot.current.as_ref().unwrap();
    assert_eq!(current.temperature.to_string(), "22.5");
    assert_eq!(current.humidity, 48);
    assert_eq!(current.condition_main, "Clouds");
    assert_eq!(current.condition_description, "少云");
    assert_eq!(current.wind_gust, Decimal::from_f64_retain(5.2));

    assert_eq!(snapshot.minutely.len(), 2);
    assert_eq!(snapshot.minutely[1].precipitation_mm.to_string(), "0.25");

    assert_eq!(snapshot.hourly.len(), 1);
    assert_eq!(snapshot.hourly[0].condition_main, "Clear");

    assert_eq!(snapshot.daily.len(), 1);
    assert_eq!(
        snapshot.daily[0].temp.max,
        Decimal::from_f64_retain(25.6).unwrap()
    );
    assert_eq!(
        snapshot.daily[0].rain_mm,
        Decimal::from_f64_retain(1.4).unwrap()
    );

    assert_eq!(snapshot.alerts.len(), 1);
    assert_eq!(snapshot.alerts[0].event_name, "Rainstorm Warning");
    assert_eq!(snapshot.alerts[0].tags, vec!["Rain", "Flood"]);
}

#[test]
fn absent_optional_categories_become_empty() {
    let body = r#"{
        "lat": 39.9, "lon": 116.4,
        "current": {
            "dt": 1714550400, "sunrise": 1714513000, "sunset": 1714562000,
            "temp": 20.0, "feels_like": 19.5, "pressure": 1010, "humidity": 50,
            "dew_point": 9.0, "uvi": 4.0, "clouds": 0, "wind_speed": 2.0,
            "weather": [{"id": 800, "main": "Clear", "description": "晴", "icon": "01d"}]
        }
    }"#;

    let snapshot = snapshot_from_json("Beijing", body).unwrap();
    assert!(snapshot.minutely.is_empty());
    assert!(snapshot.hourly.is_empty());
    assert!(snapshot.daily.is_empty());
    assert!(snapshot.alerts.is_empty());
    assert!(snapshot.is_publishable());

    // Absent visibility and wind direction fall back to defaults
    let current = snapshot.current.unwrap();
    assert_eq!(current.visibility_m, 10000);
    assert_eq!(current.wind_deg, 0);
}

#[test]
fn missing_current_is_malformed() {
    let body = r#"{"lat": 39.9, "lon": 116.4, "minutely": []}"#;
    let error = snapshot_from_json("Beijing", body).unwrap_err();
    assert!(matches!(error, ProviderError::Malformed(_)));
}

#[test]
fn missing_coordinate_echo_is_malformed() {
    let body = r#"{
        "current": {
            "dt": 1714550400, "sunrise": 1714513000, "sunset": 1714562000,
            "temp": 20.0, "feels_like": 19.5, "pressure": 1010, "humidity": 50,
            "dew_point": 9.0, "uvi": 4.0, "clouds": 0, "wind_speed": 2.0
        }
    }"#;
    let error = snapshot_from_json("Beijing", body).unwrap_err();
    assert!(matches!(error, ProviderError::Malformed(_)));
}

#[test]
fn unparseable_body_is_malformed() {
    let error = snapshot_from_json("Beijing", "not json at all").unwrap_err();
    assert!(matches!(error, ProviderError::Malformed(_)));
}
