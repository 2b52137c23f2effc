//! Ingestion cycle tests
//!
//! Exercises the cycle logic through stub implementations of the provider,
//! store, and publisher seams, with no real database or broker.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::models::{Category, CurrentConditions, MinutePrecipitation, WeatherSnapshot};
use weathersync_ingestor::error::{PersistError, ProviderError, PublishError};
use weathersync_ingestor::external::weather::WeatherProvider;
use weathersync_ingestor::services::publisher::SnapshotPublisher;
use weathersync_ingestor::services::scheduler::IngestScheduler;
use weathersync_ingestor::services::store::SnapshotStore;

fn sample_current(temperature: i64) -> CurrentConditions {
    let at = DateTime::from_timestamp(1_714_550_400, 0).unwrap();
    CurrentConditions {
        timestamp: at,
        sunrise: at,
        sunset: at,
        temperature: Decimal::from(temperature),
        feels_like: Decimal::from(temperature),
        pressure: 1012,
        humidity: 50,
        dew_point: Decimal::from(10),
        uv_index: Decimal::from(5),
        cloud_cover_pct: 20,
        visibility_m: 10000,
        wind_speed: Decimal::from(3),
        wind_deg: 180,
        wind_gust: None,
        condition_code: 800,
        condition_main: "Clear".to_string(),
        condition_description: "晴".to_string(),
        icon_id: "01d".to_string(),
    }
}

fn sample_snapshot() -> WeatherSnapshot {
    WeatherSnapshot {
        city: "Beijing".to_string(),
        latitude: Decimal::new(399, 1),
        longitude: Decimal::new(1164, 1),
        current: Some(sample_current(22)),
        minutely: vec![MinutePrecipitation {
            timestamp: DateTime::from_timestamp(1_714_550_400, 0).unwrap(),
            precipitation_mm: Decimal::ZERO,
        }],
        hourly: vec![],
        daily: vec![],
        alerts: vec![],
    }
}

struct StubProvider {
    snapshot: Option<WeatherSnapshot>,
}

#[async_trait]
impl WeatherProvider for StubProvider {
    async fn fetch(
        &self,
        _latitude: Decimal,
        _longitude: Decimal,
    ) -> Result<WeatherSnapshot, ProviderError> {
        self.snapshot
            .clone()
            .ok_or_else(|| ProviderError::Transport("connection refused".to_string()))
    }
}

#[derive(Default)]
struct StubStore {
    fail_category: Option<Category>,
    persisted: Mutex<Vec<Category>>,
}

#[async_trait]
impl SnapshotStore for StubStore {
    async fn persist(
        &self,
        category: Category,
        _snapshot: &WeatherSnapshot,
    ) -> Result<u64, PersistError> {
        if self.fail_category == Some(category) {
            return Err(PersistError::ConnectionFailure("pool timed out".to_string()));
        }
        self.persisted.lock().unwrap().push(category);
        Ok(1)
    }

    async fn temperature_at(
        &self,
        _city: &str,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> Result<Option<Decimal>, PersistError> {
        Ok(None)
    }

    async fn record_alert(
        &self,
        _message: &str,
        _triggered_at: DateTime<Utc>,
    ) -> Result<Uuid, PersistError> {
        Ok(Uuid::new_v4())
    }
}

#[derive(Default)]
struct StubPublisher {
    fail: bool,
    published: AtomicUsize,
}

#[async_trait]
impl SnapshotPublisher for StubPublisher {
    async fn publish(&self, _snapshot: &WeatherSnapshot) -> Result<(), PublishError> {
        if self.fail {
            return Err(PublishError::Broker("broker unreachable".to_string()));
        }
        self.published.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn scheduler(
    provider: StubProvider,
    store: Arc<StubStore>,
    publisher: Arc<StubPublisher>,
) -> IngestScheduler {
    IngestScheduler::new(
        Arc::new(provider),
        store,
        publisher,
        None,
        Decimal::new(399, 1),
        Decimal::new(1164, 1),
    )
}

#[tokio::test]
async fn one_category_failure_does_not_block_the_others() {
    let store = Arc::new(StubStore {
        fail_category: Some(Category::Hourly),
        ..Default::default()
    });
    let publisher = Arc::new(StubPublisher::default());
    let scheduler = scheduler(
        StubProvider {
            snapshot: Some(sample_snapshot()),
        },
        store.clone(),
        publisher.clone(),
    );

    let report = scheduler.run_cycle().await;

    assert_eq!(report.categories.len(), 5);
    assert_eq!(report.failed_categories(), vec![Category::Hourly]);
    let persisted = store.persisted.lock().unwrap();
    assert_eq!(persisted.len(), 4);
    assert!(!persisted.contains(&Category::Hourly));
    // Publication is independent of persistence failures
    assert!(report.published);
    assert_eq!(publisher.published.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_current_skips_persistence_and_publication() {
    let mut snapshot = sample_snapshot();
    snapshot.current = None;

    let store = Arc::new(StubStore::default());
    let publisher = Arc::new(StubPublisher::default());
    let scheduler = scheduler(
        StubProvider {
            snapshot: Some(snapshot),
        },
        store.clone(),
        publisher.clone(),
    );

    let report = scheduler.run_cycle().await;

    assert!(report.skipped_missing_current);
    assert!(report.categories.is_empty());
    assert!(!report.published);
    assert!(store.persisted.lock().unwrap().is_empty());
    assert_eq!(publisher.published.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn publish_failure_does_not_undo_persistence() {
    let store = Arc::new(StubStore::default());
    let publisher = Arc::new(StubPublisher {
        fail: true,
        ..Default::default()
    });
    let scheduler = scheduler(
        StubProvider {
            snapshot: Some(sample_snapshot()),
        },
        store.clone(),
        publisher,
    );

    let report = scheduler.run_cycle().await;

    assert!(!report.published);
    assert!(report.publish_error.is_some());
    assert!(report.failed_categories().is_empty());
    assert_eq!(store.persisted.lock().unwrap().len(), 5);
}

#[tokio::test]
async fn fetch_failure_ends_the_cycle_immediately() {
    let store = Arc::new(StubStore::default());
    let publisher = Arc::new(StubPublisher::default());
    let scheduler = scheduler(
        StubProvider { snapshot: None },
        store.clone(),
        publisher.clone(),
    );

    let report = scheduler.run_cycle().await;

    assert!(report.fetch_error.is_some());
    assert!(report.categories.is_empty());
    assert!(!report.published);
    assert!(store.persisted.lock().unwrap().is_empty());
    assert_eq!(publisher.published.load(Ordering::SeqCst), 0);
}
