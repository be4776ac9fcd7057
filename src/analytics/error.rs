//! Analysis errors
//!
//! `AnalysisError` is what a run returns to its caller. `ErrorKind` is the
//! serialisable classification that ends up in published reports.

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::store::{StoreError, TimeWindow};

/// A page request failed while fetching a window
#[derive(Error, Debug)]
#[error("Fetching {window} failed at page {page}: {source}")]
pub struct FetchError {
    pub window: TimeWindow,
    pub page: u32,
    #[source]
    pub source: StoreError,
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Invalid analysis window: {0}")]
    InvalidWindow(String),

    /// A newer run started before this one could publish
    #[error("Analysis run {generation} was superseded by a newer run")]
    Superseded { generation: u64 },

    #[error("CSV export failed: {0}")]
    Export(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Fetch,
    ComparisonFetch,
    InvalidWindow,
    Superseded,
    Export,
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::Configuration(_) => ErrorKind::Configuration,
            AnalysisError::Store(StoreError::Misconfigured(_)) => ErrorKind::Configuration,
            AnalysisError::Store(_) | AnalysisError::Fetch(_) => ErrorKind::Fetch,
            AnalysisError::InvalidWindow(_) => ErrorKind::InvalidWindow,
            AnalysisError::Superseded { .. } => ErrorKind::Superseded,
            AnalysisError::Export(_) => ErrorKind::Export,
        }
    }
}

/// Last failure as shown next to the published report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&AnalysisError> for PublishedError {
    fn from(err: &AnalysisError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
