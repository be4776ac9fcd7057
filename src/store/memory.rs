//! In-memory `SearchLogStore` for tests
//!
//! Honors window filtering, newest-first ordering, paging and reported totals,
//! and can be told to fail or to hold its first request until released.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use super::types::{PageRequest, SearchEvent, SearchPage};
use super::{SearchLogStore, StoreError};

#[derive(Default)]
pub(crate) struct MemoryStore {
    events: Mutex<Vec<SearchEvent>>,
    requests: AtomicUsize,
    reported_total: Option<u64>,
    fail_from_request: Option<usize>,
    unhealthy: AtomicBool,
    hold_first: Option<Arc<Notify>>,
}

impl MemoryStore {
    pub(crate) fn new(events: Vec<SearchEvent>) -> Self {
        Self {
            events: Mutex::new(events),
            ..Self::default()
        }
    }

    /// Report this total regardless of how many events actually match
    pub(crate) fn reporting_total(mut self, found: u64) -> Self {
        self.reported_total = Some(found);
        self
    }

    /// Fail every request from the given 1-based request number onward
    pub(crate) fn failing_from(mut self, request: usize) -> Self {
        self.fail_from_request = Some(request);
        self
    }

    /// Block the first request until `release` is notified
    pub(crate) fn holding_first_request(mut self, release: Arc<Notify>) -> Self {
        self.hold_first = Some(release);
        self
    }

    pub(crate) fn set_unhealthy(&self) {
        self.unhealthy.store(true, Ordering::SeqCst);
    }

    pub(crate) fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub(crate) fn recorded(&self) -> Vec<SearchEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchLogStore for MemoryStore {
    async fn search_page(&self, request: &PageRequest) -> Result<SearchPage, StoreError> {
        let number = self.requests.fetch_add(1, Ordering::SeqCst) + 1;

        if number == 1 {
            if let Some(release) = &self.hold_first {
                release.notified().await;
            }
        }

        if let Some(from) = self.fail_from_request {
            if number >= from {
                return Err(StoreError::Unavailable);
            }
        }

        let mut matching: Vec<SearchEvent> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| request.window.contains(e.timestamp))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let per_page = request.per_page as usize;
        let skip = (request.page as usize - 1) * per_page;
        let found = self.reported_total.unwrap_or(matching.len() as u64);
        let hits = matching.into_iter().skip(skip).take(per_page).collect();

        Ok(SearchPage { found, hits })
    }

    async fn record_event(&self, event: &SearchEvent) -> Result<(), StoreError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        if self.unhealthy.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable)
        } else {
            Ok(())
        }
    }
}
