//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::analytics::AnalyticsController;
use crate::store::SearchLogStore;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Runs analyses and holds the published report
    pub controller: Arc<AnalyticsController>,
    /// Window used when a request does not name one
    pub default_window_days: u32,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(controller: Arc<AnalyticsController>, default_window_days: u32) -> Self {
        Self {
            controller,
            default_window_days,
            start_time: Instant::now(),
        }
    }

    /// Store the controller reads from
    pub fn store(&self) -> &Arc<dyn SearchLogStore> {
        self.controller.store()
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
