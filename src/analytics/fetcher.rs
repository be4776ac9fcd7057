//! Log Fetcher
//!
//! Pulls every event of a window out of the store, one page at a time,
//! newest first. The loop stops when the store's reported total is exhausted
//! or the safety cap is reached, whichever comes first, and the result is
//! never longer than the cap.
//!
//! Pages are awaited sequentially: whether page `n + 1` is needed depends on
//! the total reported with page `n`.

use std::sync::Arc;

use super::error::FetchError;
use crate::store::{PageRequest, SearchEvent, SearchLogStore, TimeWindow};

/// How a failed page is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Any failure aborts the fetch
    Primary,
    /// Failures are logged and yield an empty result
    Comparison,
}

/// Events fetched for one window
#[derive(Debug, Default)]
pub struct FetchedLogs {
    pub events: Vec<SearchEvent>,
    /// Page requests issued
    pub requests: u32,
    /// Total matches the store reported on the last page received
    pub reported_total: u64,
    /// Set when a comparison-mode fetch failed and was swallowed
    pub failure: Option<FetchError>,
    capped: bool,
}

impl FetchedLogs {
    /// Whether the safety cap cut the result short
    pub fn truncated(&self) -> bool {
        self.capped
    }
}

pub struct LogFetcher {
    store: Arc<dyn SearchLogStore>,
    page_size: u32,
    safety_cap: usize,
}

impl LogFetcher {
    pub fn new(store: Arc<dyn SearchLogStore>, page_size: u32, safety_cap: usize) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
            safety_cap,
        }
    }

    pub fn store(&self) -> &Arc<dyn SearchLogStore> {
        &self.store
    }

    pub async fn fetch(&self, window: TimeWindow, mode: FetchMode) -> Result<FetchedLogs, FetchError> {
        match self.fetch_pages(window).await {
            Ok(logs) => Ok(logs),
            Err(e) => match mode {
                FetchMode::Primary => {
                    tracing::error!(window = %window, page = e.page, error = %e.source, "Primary fetch failed");
                    Err(e)
                }
                FetchMode::Comparison => {
                    tracing::warn!(
                        window = %window,
                        page = e.page,
                        error = %e.source,
                        "Comparison fetch failed, continuing without baseline"
                    );
                    Ok(FetchedLogs {
                        requests: e.page,
                        failure: Some(e),
                        ..FetchedLogs::default()
                    })
                }
            },
        }
    }

    async fn fetch_pages(&self, window: TimeWindow) -> Result<FetchedLogs, FetchError> {
        let mut logs = FetchedLogs::default();
        let mut page = 1u32;

        loop {
            let request = PageRequest {
                window,
                page,
                per_page: self.page_size,
            };
            let result = self
                .store
                .search_page(&request)
                .await
                .map_err(|source| FetchError {
                    window,
                    page,
                    source,
                })?;

            logs.requests = page;
            logs.reported_total = result.found;
            let received = result.hits.len();
            logs.events.extend(result.hits);

            let total_pages = result.found.div_ceil(u64::from(self.page_size));
            tracing::debug!(
                page,
                total_pages,
                accumulated = logs.events.len(),
                "Fetched page"
            );

            if u64::from(page) >= total_pages || logs.events.len() >= self.safety_cap {
                break;
            }
            if received == 0 {
                tracing::warn!(
                    window = %window,
                    page,
                    total_pages,
                    reported_total = result.found,
                    "Store returned an empty page before its reported total"
                );
                break;
            }
            page += 1;
        }

        logs.events.truncate(self.safety_cap);
        logs.capped = logs.events.len() == self.safety_cap
            && logs.reported_total > self.safety_cap as u64;
        if logs.capped {
            tracing::info!(
                window = %window,
                reported_total = logs.reported_total,
                safety_cap = self.safety_cap,
                "Result truncated at safety cap"
            );
        }

        Ok(logs)
    }
}
