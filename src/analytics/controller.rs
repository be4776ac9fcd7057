//! Analytics Controller
//!
//! Orchestrates one analysis run: plans the windows, fetches the primary
//! period and the comparison span, aggregates both, computes the deltas and
//! publishes the report.
//!
//! Runs may overlap (the operator picks a new window while the previous run is
//! still fetching). Every run takes a generation number once its window has
//! been validated and may only publish while it is still the newest run; a
//! stale run returns [`AnalysisError::Superseded`] and leaves the published
//! state alone.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::buckets::TemporalBucketer;
use super::compare::{compare, ComparisonResult};
use super::error::{AnalysisError, ErrorKind, PublishedError};
use super::export::{export_rows, FlatRow};
use super::fetcher::{FetchMode, LogFetcher};
use super::metrics::{LatencyAveraging, MetricsAggregator, MetricsSnapshot};
use super::window::{filter_to_subrange, plan_windows, WindowPlan};
use super::zone::ViewerZone;
use crate::config::{AnalyticsConfig, Config, ConfigError};
use crate::store::{SearchEvent, SearchLogStore, TimeWindow, TypesenseClient};

/// Metrics for one period of a report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodReport {
    pub window: TimeWindow,
    /// Records the metrics were computed from
    pub records: usize,
    /// Whether the safety cap cut the records short
    pub truncated: bool,
    #[serde(flatten)]
    pub snapshot: MetricsSnapshot,
}

/// Result of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub generation: u64,
    pub window_days: u32,
    pub current: PeriodReport,
    /// `None` when the comparison period could not be fetched
    pub comparison: Option<PeriodReport>,
    pub deltas: Option<ComparisonResult>,
    pub fetched_at: DateTime<Utc>,
    pub error: Option<ErrorKind>,
}

/// What the controller currently shows
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    pub report: Option<AnalysisReport>,
    pub last_error: Option<PublishedError>,
}

pub struct AnalyticsController {
    fetcher: LogFetcher,
    aggregator: MetricsAggregator,
    bucketer: TemporalBucketer,
    zone: ViewerZone,
    max_window_days: u32,
    generation: AtomicU64,
    state: RwLock<DashboardState>,
}

impl AnalyticsController {
    /// Build a controller over an existing store
    pub fn new(
        store: Arc<dyn SearchLogStore>,
        config: &AnalyticsConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let zone = config.zone()?;

        Ok(Self {
            fetcher: LogFetcher::new(store, config.page_size, config.safety_cap),
            aggregator: MetricsAggregator::new(config.latency_averaging),
            bucketer: TemporalBucketer::new(zone),
            zone,
            max_window_days: config.max_window_days,
            generation: AtomicU64::new(0),
            state: RwLock::new(DashboardState::default()),
        })
    }

    /// Validate the whole configuration and connect to the configured store
    pub fn from_config(config: &Config) -> Result<Self, AnalysisError> {
        config.validate()?;
        let store = TypesenseClient::new(config.store.clone())?;
        Ok(Self::new(Arc::new(store), &config.analytics)?)
    }

    pub fn store(&self) -> &Arc<dyn SearchLogStore> {
        self.fetcher.store()
    }

    pub fn zone(&self) -> ViewerZone {
        self.zone
    }

    pub fn latency_averaging(&self) -> LatencyAveraging {
        self.aggregator.latency()
    }

    /// Run an analysis over the last `window_days` days
    pub async fn run_analysis(&self, window_days: u32) -> Result<AnalysisReport, AnalysisError> {
        self.run_analysis_at(window_days, Utc::now()).await
    }

    pub async fn run_analysis_at(
        &self,
        window_days: u32,
        now: DateTime<Utc>,
    ) -> Result<AnalysisReport, AnalysisError> {
        // A rejected request never starts a run, so it must not supersede one
        let plan = match self.plan(window_days, now) {
            Ok(plan) => plan,
            Err(e) => {
                self.state.write().await.last_error = Some(PublishedError::from(&e));
                return Err(e);
            }
        };
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        match self.analyze(generation, window_days, plan, now).await {
            Ok(report) => self.publish(report).await,
            Err(e) => {
                self.record_failure(generation, &e).await;
                Err(e)
            }
        }
    }

    async fn analyze(
        &self,
        generation: u64,
        window_days: u32,
        plan: WindowPlan,
        now: DateTime<Utc>,
    ) -> Result<AnalysisReport, AnalysisError> {
        tracing::info!(
            generation,
            window_days,
            primary = %plan.primary,
            comparison = %plan.comparison,
            "Starting analysis"
        );

        let primary = self.fetcher.fetch(plan.primary, FetchMode::Primary).await?;
        let current = self.period_report(plan.primary, &primary.events, primary.truncated());

        let span = self
            .fetcher
            .fetch(plan.fetch_span, FetchMode::Comparison)
            .await?;

        let (comparison, error) = if span.failure.is_some() {
            (None, Some(ErrorKind::ComparisonFetch))
        } else {
            let truncated = span.truncated();
            let baseline = filter_to_subrange(span.events, &plan.comparison);
            (
                Some(self.period_report(plan.comparison, &baseline, truncated)),
                None,
            )
        };

        let deltas = comparison
            .as_ref()
            .map(|prior| compare(&current.snapshot.metrics, &prior.snapshot.metrics));

        Ok(AnalysisReport {
            generation,
            window_days,
            current,
            comparison,
            deltas,
            fetched_at: now,
            error,
        })
    }

    fn period_report(&self, window: TimeWindow, events: &[SearchEvent], truncated: bool) -> PeriodReport {
        PeriodReport {
            window,
            records: events.len(),
            truncated,
            snapshot: MetricsSnapshot {
                metrics: self.aggregator.aggregate(events),
                trends: self.bucketer.bucket(events),
            },
        }
    }

    fn plan(&self, window_days: u32, now: DateTime<Utc>) -> Result<WindowPlan, AnalysisError> {
        if window_days == 0 || window_days > self.max_window_days {
            return Err(AnalysisError::InvalidWindow(format!(
                "window must be between 1 and {} days, got {}",
                self.max_window_days, window_days
            )));
        }
        plan_windows(window_days, now, &self.zone).ok_or_else(|| {
            AnalysisError::InvalidWindow(format!("{} days before {} is out of range", window_days, now))
        })
    }

    async fn publish(&self, report: AnalysisReport) -> Result<AnalysisReport, AnalysisError> {
        let mut state = self.state.write().await;
        let newest = self.generation.load(Ordering::SeqCst);

        if report.generation != newest {
            tracing::info!(
                generation = report.generation,
                newest,
                "Discarding superseded analysis"
            );
            return Err(AnalysisError::Superseded {
                generation: report.generation,
            });
        }

        tracing::info!(
            generation = report.generation,
            records = report.current.records,
            comparison = report.comparison.is_some(),
            "Published analysis"
        );

        state.report = Some(report.clone());
        state.last_error = None;
        Ok(report)
    }

    async fn record_failure(&self, generation: u64, error: &AnalysisError) {
        let mut state = self.state.write().await;
        if generation != self.generation.load(Ordering::SeqCst) {
            return;
        }
        state.last_error = Some(PublishedError::from(error));
    }

    /// Most recently published report and error
    pub async fn latest(&self) -> DashboardState {
        self.state.read().await.clone()
    }

    /// Export rows for the last `window_days` days
    pub async fn export(&self, window_days: u32) -> Result<Vec<FlatRow>, AnalysisError> {
        self.export_at(window_days, Utc::now()).await
    }

    pub async fn export_at(
        &self,
        window_days: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<FlatRow>, AnalysisError> {
        let plan = self.plan(window_days, now)?;

        let logs = self.fetcher.fetch(plan.primary, FetchMode::Primary).await?;
        tracing::info!(window = %plan.primary, rows = logs.events.len(), "Exporting search logs");

        Ok(export_rows(&logs.events, &self.zone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::compare::ComparedMetric;
    use crate::store::memory::MemoryStore;
    use std::time::Duration;
    use tokio::sync::Notify;

    const DAY: i64 = 86_400;
    // 2024-03-10T12:00:00Z
    const NOW: i64 = 1_710_028_800 + 12 * 3600;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(NOW, 0).unwrap()
    }

    fn config() -> AnalyticsConfig {
        AnalyticsConfig {
            timezone: "utc".to_string(),
            ..AnalyticsConfig::default()
        }
    }

    fn controller(store: MemoryStore) -> AnalyticsController {
        AnalyticsController::new(Arc::new(store), &config()).unwrap()
    }

    /// Two searches today, one of them clicked, and one clicked search
    /// in each of the 7 days before the primary week
    fn two_weeks() -> Vec<SearchEvent> {
        let mut events = vec![
            SearchEvent::new("algebra", 0, NOW - 3600).latency(100),
            SearchEvent::new("geometry", 3, NOW - 7200).clicked("g1").latency(100),
        ];
        for day in 7..14 {
            events.push(
                SearchEvent::new("algebra", 2, NOW - day * DAY)
                    .clicked("a1")
                    .latency(200),
            );
        }
        events
    }

    #[tokio::test]
    async fn test_full_run() {
        let controller = controller(MemoryStore::new(two_weeks()));
        let report = controller.run_analysis_at(7, now()).await.unwrap();

        assert_eq!(report.current.records, 2);
        assert_eq!(report.current.snapshot.metrics.click_through_rate, 50.0);
        assert!(report.error.is_none());

        let prior = report.comparison.as_ref().unwrap();
        assert_eq!(prior.records, 7);
        assert!(!prior.window.overlaps(&report.current.window));

        let deltas = report.deltas.as_ref().unwrap();
        assert_eq!(deltas.get(ComparedMetric::ClickThroughRate).unwrap().delta, -50.0);
        assert_eq!(deltas.get(ComparedMetric::AvgLatency).unwrap().delta, 50.0);

        let latest = controller.latest().await;
        assert_eq!(latest.report, Some(report));
        assert!(latest.last_error.is_none());
    }

    #[tokio::test]
    async fn test_trend_totals_match() {
        let controller = controller(MemoryStore::new(two_weeks()));
        let report = controller.run_analysis_at(14, now()).await.unwrap();
        let snapshot = &report.current.snapshot;

        let trend: usize = snapshot.trends.search_trend.iter().map(|d| d.count).sum();
        let hourly: usize = snapshot.trends.hourly_distribution.iter().map(|h| h.count).sum();
        assert_eq!(trend, snapshot.metrics.total_searches);
        assert_eq!(hourly, snapshot.metrics.total_searches);
    }

    #[tokio::test]
    async fn test_comparison_failure_keeps_primary() {
        // Request 1 is the primary window; the comparison span fails
        let controller = controller(MemoryStore::new(two_weeks()).failing_from(2));
        let report = controller.run_analysis_at(7, now()).await.unwrap();

        assert_eq!(report.current.records, 2);
        assert!(report.comparison.is_none());
        assert!(report.deltas.is_none());
        assert_eq!(report.error, Some(ErrorKind::ComparisonFetch));
    }

    #[tokio::test]
    async fn test_primary_failure_leaves_report_untouched() {
        let store = Arc::new(MemoryStore::new(two_weeks()));
        let controller = AnalyticsController::new(store.clone(), &config()).unwrap();
        let first = controller.run_analysis_at(7, now()).await.unwrap();

        let failing = AnalyticsController::new(
            Arc::new(MemoryStore::new(Vec::new()).failing_from(1)),
            &config(),
        )
        .unwrap();
        let err = failing.run_analysis_at(7, now()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fetch);

        let state = failing.latest().await;
        assert!(state.report.is_none());
        assert_eq!(state.last_error.unwrap().kind, ErrorKind::Fetch);

        assert_eq!(controller.latest().await.report, Some(first));
    }

    #[tokio::test]
    async fn test_invalid_window() {
        let controller = controller(MemoryStore::new(Vec::new()));

        for days in [0, 366] {
            let err = controller.run_analysis_at(days, now()).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidWindow);
        }
        assert_eq!(
            controller.latest().await.last_error.unwrap().kind,
            ErrorKind::InvalidWindow
        );
    }

    #[tokio::test]
    async fn test_superseded_run_is_discarded() {
        let release = Arc::new(Notify::new());
        let store = MemoryStore::new(two_weeks()).holding_first_request(release.clone());
        let controller = Arc::new(controller(store));

        let slow = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.run_analysis_at(1, now()).await })
        };
        // Let the first run reach its held request
        tokio::time::sleep(Duration::from_millis(50)).await;

        let fast = controller.run_analysis_at(7, now()).await.unwrap();
        release.notify_one();

        let stale = slow.await.unwrap().unwrap_err();
        assert!(matches!(stale, AnalysisError::Superseded { generation: 1 }));

        let latest = controller.latest().await;
        assert_eq!(latest.report.unwrap().generation, fast.generation);
        assert!(latest.last_error.is_none());
    }

    #[tokio::test]
    async fn test_invalid_request_does_not_supersede_run_in_flight() {
        let release = Arc::new(Notify::new());
        let store = MemoryStore::new(two_weeks()).holding_first_request(release.clone());
        let controller = Arc::new(controller(store));

        let running = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.run_analysis_at(7, now()).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let err = controller.run_analysis_at(0, now()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidWindow);
        release.notify_one();

        let report = running.await.unwrap().unwrap();
        assert_eq!(report.generation, 1);
        assert_eq!(report.fetched_at, now());

        let latest = controller.latest().await;
        assert_eq!(latest.report, Some(report));
        assert!(latest.last_error.is_none());
    }

    #[tokio::test]
    async fn test_export_rows() {
        let controller = controller(MemoryStore::new(two_weeks()));
        let rows = controller.export_at(7, now()).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].query, "algebra");
        assert_eq!(rows[0].clicked_result, "None");
        assert_eq!(rows[1].clicked_result, "g1");
    }

    #[test]
    fn test_from_config_requires_store() {
        let err = AnalyticsController::from_config(&Config::default()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
