//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};

use crate::store::SearchEvent;

// ============================================
// ANALYTICS DTOs
// ============================================

/// Query parameters for analysis and export
#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsParams {
    /// Window length in days (default: configured default window)
    #[serde(default)]
    pub days: Option<u32>,
}

// ============================================
// SEARCH LOG DTOs
// ============================================

/// One search event as reported by the search page
#[derive(Debug, Deserialize)]
pub struct LogSearchRequest {
    pub query: String,
    pub result_count: u32,
    #[serde(default)]
    pub filter_type: String,
    /// Result the user clicked, if any
    #[serde(default)]
    pub clicked_result: Option<String>,
    /// Unix seconds, defaults to now
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub latency_ms: Option<u64>,
}

impl LogSearchRequest {
    /// Build the stored event
    pub fn into_event(self, id: String, now: i64) -> SearchEvent {
        let mut event = SearchEvent::new(self.query, self.result_count, self.timestamp.unwrap_or(now))
            .id(id)
            .filter(self.filter_type)
            .session(self.session_id)
            .user_agent(self.user_agent);

        if let Some(clicked) = self.clicked_result.filter(|c| !c.is_empty()) {
            event = event.clicked(clicked);
        }
        if let Some(latency) = self.latency_ms {
            event = event.latency(latency);
        }
        event
    }
}

/// Response after logging a search
#[derive(Debug, Serialize, Deserialize)]
pub struct LogSearchResponse {
    pub success: bool,
    /// ID of the stored document
    pub id: String,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy, degraded
    pub status: String,
    /// Search store status: ok, error
    pub store: String,
    /// Whether an analysis has been published yet
    pub has_report: bool,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}
