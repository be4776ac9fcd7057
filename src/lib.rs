//! # Searchlens
//!
//! Search analytics over a search-event log held in Typesense. For a window
//! of days it retrieves the logged searches (bounded by a safety cap),
//! computes engagement metrics and daily/hourly histograms, and compares them
//! with the equally long period immediately before.
//!
//! ## Features
//!
//! - **Bounded retrieval**: paged fetches that stop at the store's total or the safety cap
//! - **Metrics**: click-through rate, latency, top and zero-result queries, filter usage
//! - **Trends**: chronological daily counts and a 24-slot hourly distribution
//! - **Comparison**: direction-aware period-over-period deltas
//! - **Export**: CSV rows with standard quoting
//!
//! ## Modules
//!
//! - [`store`]: search-log store boundary and Typesense client
//! - [`analytics`]: fetcher, aggregator, bucketer, comparison engine and controller
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use searchlens::analytics::{AnalyticsController, ComparedMetric};
//! use searchlens::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let controller = AnalyticsController::from_config(&config)?;
//!
//!     // Last 7 days compared with the 7 days before
//!     let report = controller.run_analysis(7).await?;
//!     let metrics = &report.current.snapshot.metrics;
//!
//!     println!("{} searches, CTR {:.1}%", metrics.total_searches, metrics.click_through_rate);
//!
//!     if let Some(delta) = report.deltas.as_ref().and_then(|d| d.get(ComparedMetric::AvgLatency)) {
//!         println!("Latency change: {:+.1}%", delta.delta);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod api;
pub mod config;
pub mod logging;
pub mod store;

// Re-export top-level types for convenience
pub use store::{
    PageRequest, SearchEvent, SearchLogStore, SearchPage, StoreError, TimeWindow, TypesenseClient,
};

pub use analytics::{
    AnalysisError, AnalysisReport, AnalyticsController, ComparedMetric, ComparisonResult,
    DashboardState, ErrorKind, FetchError, FlatRow, LatencyAveraging, LogFetcher,
    MetricsAggregator, MetricsSnapshot, QueryMetrics, TemporalBucketer, ViewerZone,
};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{
    AnalyticsConfig, ApiConfig, Config, ConfigError, LogFormat, LoggingConfig, StoreConfig,
};
