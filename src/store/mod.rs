//! Search-Log Store
//!
//! Boundary to the external indexed store that holds the search-event log.
//!
//! ## Architecture
//!
//! - **types**: `SearchEvent`, `TimeWindow`, page request/response shapes
//! - **SearchLogStore**: the capabilities the analytics core needs from a store
//! - **TypesenseClient**: REST implementation of `SearchLogStore`
//!
//! The store is constructed explicitly from configuration and handed to the
//! analytics controller as an `Arc<dyn SearchLogStore>`, so tests can swap in
//! an in-memory fake.

mod client;
#[cfg(test)]
pub(crate) mod memory;
pub mod types;

pub use client::{collection_schema, TypesenseClient};
pub use types::{PageRequest, SearchEvent, SearchPage, TimeWindow};

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ConfigError;

/// What the analytics core needs from the external store
#[async_trait]
pub trait SearchLogStore: Send + Sync {
    /// Fetch one page of events inside `request.window`, newest first,
    /// together with the total number of matches
    async fn search_page(&self, request: &PageRequest) -> Result<SearchPage, StoreError>;

    /// Append one event to the log
    async fn record_event(&self, event: &SearchEvent) -> Result<(), StoreError>;

    /// Check if the store is reachable
    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Errors that can occur when communicating with the store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Search store unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Malformed store response: {0}")]
    Decode(String),

    #[error("Store is misconfigured: {0}")]
    Misconfigured(#[from] ConfigError),
}
