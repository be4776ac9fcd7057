//! Core data types for the search-log store boundary
//!
//! - `SearchEvent`: one logged search action with its outcome metadata
//! - `TimeWindow`: a closed epoch-seconds interval used to scope a fetch
//! - `PageRequest` / `SearchPage`: one paged request against the store and its answer

use serde::{Deserialize, Deserializer, Serialize};

/// A single logged search action
///
/// Records are immutable once fetched. They live only as long as the
/// in-memory result set of one fetch and are dropped after aggregation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchEvent {
    /// Store-assigned document ID
    #[serde(default)]
    pub id: String,
    /// Raw query text as typed by the user
    pub query: String,
    /// Number of results the search returned
    pub result_count: u32,
    /// Which filter tab was active (e.g. "all", "tutors", "courses")
    #[serde(default)]
    pub filter_type: String,
    /// Result the user clicked, if any. The store persists "no click" as an
    /// empty string, which is read back as `None`.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub clicked_result: Option<String>,
    /// Unix timestamp in seconds
    pub timestamp: i64,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub session_id: String,
    /// Server-side search latency, when the client reported it
    #[serde(default)]
    pub latency_ms: Option<u64>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_empty()))
}

impl SearchEvent {
    /// Create an event with the required fields; everything else is empty
    pub fn new(query: impl Into<String>, result_count: u32, timestamp: i64) -> Self {
        Self {
            id: String::new(),
            query: query.into(),
            result_count,
            filter_type: String::new(),
            clicked_result: None,
            timestamp,
            user_agent: String::new(),
            session_id: String::new(),
            latency_ms: None,
        }
    }

    /// Builder method: set the document ID
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Builder method: set the active filter
    pub fn filter(mut self, filter_type: impl Into<String>) -> Self {
        self.filter_type = filter_type.into();
        self
    }

    /// Builder method: record a click
    pub fn clicked(mut self, result: impl Into<String>) -> Self {
        self.clicked_result = Some(result.into());
        self
    }

    /// Builder method: set the session
    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Builder method: set the user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Builder method: set the measured latency
    pub fn latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }

    /// Whether the user clicked a result for this search
    pub fn was_clicked(&self) -> bool {
        matches!(&self.clicked_result, Some(result) if !result.is_empty())
    }

    /// Grouping key for query rankings (case-insensitive)
    pub fn query_key(&self) -> String {
        self.query.to_lowercase()
    }
}

/// Closed time window in epoch seconds: both `start` and `end` are inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    /// Create a new window
    ///
    /// # Panics
    /// Panics if start > end
    pub fn new(start: i64, end: i64) -> Self {
        assert!(start <= end, "TimeWindow: start must not be after end");
        Self { start, end }
    }

    /// Create a window, returning None if invalid
    pub fn try_new(start: i64, end: i64) -> Option<Self> {
        if start <= end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Check if a timestamp falls within this window
    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }

    /// Check if this window shares any second with another
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Number of seconds covered, counting both ends
    pub fn duration_secs(&self) -> i64 {
        self.end - self.start + 1
    }

    /// Store filter expression for this window
    pub fn filter_expression(&self) -> String {
        format!("timestamp:>={} && timestamp:<={}", self.start, self.end)
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}..={}]", self.start, self.end)
    }
}

/// One page request: 1-based page number, fixed page size, newest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub window: TimeWindow,
    pub page: u32,
    pub per_page: u32,
}

/// One page of matches plus the store's total match count for the query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    /// Total number of matches for the whole query, not just this page
    pub found: u64,
    pub hits: Vec<SearchEvent>,
}
