//! Search Analytics Core
//!
//! Turns the raw search-event log into dashboard metrics for a time window
//! and compares them with the window immediately before it.
//!
//! ## Architecture
//!
//! ```text
//! LogFetcher ──► MetricsAggregator ─┐
//!            └─► TemporalBucketer ──┼──► ComparisonEngine ──► AnalyticsController
//! ```
//!
//! - **fetcher**: bounded, paged retrieval from a [`SearchLogStore`](crate::store::SearchLogStore)
//! - **metrics**: scalar and top-K metrics (pure)
//! - **buckets**: daily and hour-of-day histograms (pure)
//! - **compare**: direction-aware period-over-period deltas (pure)
//! - **window**: primary/comparison window derivation
//! - **controller**: orchestration, generation tracking and the published state
//! - **export**: CSV row shaping

pub mod buckets;
pub mod compare;
pub mod controller;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod metrics;
pub mod window;
mod zone;

pub use buckets::{DayCount, HourCount, TemporalBucketer, TemporalBuckets};
pub use compare::{compare, percent_change, ComparedMetric, ComparisonResult, MetricDelta, Polarity};
pub use controller::{AnalysisReport, AnalyticsController, DashboardState, PeriodReport};
pub use error::{AnalysisError, ErrorKind, FetchError, PublishedError};
pub use export::{export_filename, export_rows, to_csv_string, write_csv, FlatRow, CSV_HEADERS};
pub use fetcher::{FetchMode, FetchedLogs, LogFetcher};
pub use metrics::{
    insights, Engagement, FilterCount, Insight, LatencyAveraging, MetricsAggregator,
    MetricsSnapshot, QueryCount, QueryMetrics,
};
pub use window::{filter_to_subrange, plan_windows, WindowPlan};
pub use zone::ViewerZone;
