//! Ingestion scheduler
//!
//! Drives the fetch → persist-per-category → publish → rule-evaluation loop
//! on a fixed interval. At most one cycle runs at a time; when a cycle
//! overruns the interval the next tick is deferred until it finishes.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::time::MissedTickBehavior;

use crate::error::PersistError;
use crate::external::weather::WeatherProvider;
use crate::services::alarm::AlarmManager;
use crate::services::publisher::SnapshotPublisher;
use crate::services::store::SnapshotStore;
use shared::models::Category;

/// Outcome of one category's persistence attempt
#[derive(Debug)]
pub struct CategoryOutcome {
    pub category: Category,
    pub outcome: Result<u64, PersistError>,
}

/// Structured result of one ingestion cycle
///
/// Every failure inside a cycle lands here instead of propagating; the loop
/// logs the summary and waits for the next tick.
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Provider fetch failed; nothing else was attempted
    pub fetch_error: Option<String>,
    /// Snapshot arrived without `current`; persistence and publication
    /// were both skipped
    pub skipped_missing_current: bool,
    /// One entry per category, in attempt order
    pub categories: Vec<CategoryOutcome>,
    pub published: bool,
    pub publish_error: Option<String>,
    pub rules_fired: usize,
}

impl CycleReport {
    /// Categories whose persistence attempt failed
    pub fn failed_categories(&self) -> Vec<Category> {
        self.categories
            .iter()
            .filter(|c| c.outcome.is_err())
            .map(|c| c.category)
            .collect()
    }

    fn log_summary(&self) {
        if let Some(error) = &self.fetch_error {
            tracing::warn!(error = %error, "cycle ended: provider fetch failed");
            return;
        }
        if self.skipped_missing_current {
            tracing::warn!("cycle ended: snapshot missing current category, nothing persisted or published");
            return;
        }
        let failed = self.failed_categories();
        tracing::info!(
            categories_attempted = self.categories.len(),
            categories_failed = failed.len(),
            published = self.published,
            rules_fired = self.rules_fired,
            "cycle complete"
        );
    }
}

/// Single-flight ingestion loop
pub struct IngestScheduler {
    provider: Arc<dyn WeatherProvider>,
    store: Arc<dyn SnapshotStore>,
    publisher: Arc<dyn SnapshotPublisher>,
    alarm: Option<AlarmManager>,
    latitude: Decimal,
    longitude: Decimal,
}

impl IngestScheduler {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        store: Arc<dyn SnapshotStore>,
        publisher: Arc<dyn SnapshotPublisher>,
        alarm: Option<AlarmManager>,
        latitude: Decimal,
        longitude: Decimal,
    ) -> Self {
        Self {
            provider,
            store,
            publisher,
            alarm,
            latitude,
            longitude,
        }
    }

    /// Run forever, one cycle per interval tick
    pub async fn run(&self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        // Overrunning cycles defer the next tick instead of bursting
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let report = self.run_cycle().await;
            report.log_summary();
        }
    }

    /// Execute one full cycle; never returns an error
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();

        let snapshot = match self.provider.fetch(self.latitude, self.longitude).await {
            Ok(snapshot) => snapshot,
            Err(error) => {
                tracing::error!(error = %error, "provider fetch failed, retrying next cycle");
                report.fetch_error = Some(error.to_string());
                return report;
            }
        };

        if !snapshot.is_publishable() {
            report.skipped_missing_current = true;
            return report;
        }

        // The five categories are independent: a failure in one must not
        // prevent the others from being attempted.
        for category in Category::ALL {
            let outcome = self.store.persist(category, &snapshot).await;
            if let Err(error) = &outcome {
                tracing::error!(
                    category = %category,
                    error = %error,
                    retryable = error.is_retryable(),
                    "category persist failed"
                );
            }
            report.categories.push(CategoryOutcome { category, outcome });
        }

        // Publication is not gated on persistence success, only ordered
        // after every attempt has been made.
        match self.publisher.publish(&snapshot).await {
            Ok(()) => report.published = true,
            Err(error) => {
                tracing::error!(error = %error, "snapshot publish failed");
                report.publish_error = Some(error.to_string());
            }
        }

        if let Some(alarm) = &self.alarm {
            report.rules_fired = alarm.check_alerts(&snapshot).await;
        }

        report
    }
}
