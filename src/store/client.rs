//! Typesense REST API Client
//!
//! HTTP client for the collection holding the search-event log.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use super::types::{PageRequest, SearchEvent, SearchPage};
use super::{SearchLogStore, StoreError};
use crate::config::StoreConfig;

const API_KEY_HEADER: &str = "X-TYPESENSE-API-KEY";

/// Typesense-backed search-log store
pub struct TypesenseClient {
    client: Client,
    config: StoreConfig,
    collection_ready: OnceCell<()>,
}

impl TypesenseClient {
    /// Create a client for an already-configured store
    ///
    /// Fails with [`StoreError::Misconfigured`] when host or API key is missing.
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        config.validate()?;

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.connection_timeout_secs))
            .build()
            .map_err(StoreError::Request)?;

        Ok(Self {
            client,
            config,
            collection_ready: OnceCell::new(),
        })
    }

    /// Get the current configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.config.base_url(), self.config.collection)
    }

    /// Make sure the log collection exists, creating it on first use
    pub async fn ensure_collection(&self) -> Result<(), StoreError> {
        self.collection_ready
            .get_or_try_init(|| self.retrieve_or_create_collection())
            .await?;
        Ok(())
    }

    async fn retrieve_or_create_collection(&self) -> Result<(), StoreError> {
        let response = self
            .client
            .get(self.collection_url())
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(classify)?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => self.create_collection().await,
            _ => Err(api_error(response).await),
        }
    }

    async fn create_collection(&self) -> Result<(), StoreError> {
        tracing::info!(collection = %self.config.collection, "Creating search log collection");

        let url = format!("{}/collections", self.config.base_url());
        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&collection_schema(&self.config.collection))
            .send()
            .await
            .map_err(classify)?;

        // 409 means another writer created it first
        if response.status().is_success() || response.status() == StatusCode::CONFLICT {
            Ok(())
        } else {
            Err(api_error(response).await)
        }
    }
}

#[async_trait]
impl SearchLogStore for TypesenseClient {
    async fn search_page(&self, request: &PageRequest) -> Result<SearchPage, StoreError> {
        let url = format!("{}/documents/search", self.collection_url());
        let filter = request.window.filter_expression();
        let per_page = request.per_page.to_string();
        let page = request.page.to_string();

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .query(&[
                ("q", "*"),
                ("query_by", "query"),
                ("filter_by", filter.as_str()),
                ("per_page", per_page.as_str()),
                ("page", page.as_str()),
                ("sort_by", "timestamp:desc"),
            ])
            .send()
            .await
            .map_err(classify)?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok(SearchPage {
            found: body.found,
            hits: body.hits.into_iter().map(|hit| hit.document).collect(),
        })
    }

    async fn record_event(&self, event: &SearchEvent) -> Result<(), StoreError> {
        self.ensure_collection().await?;

        let url = format!("{}/documents", self.collection_url());
        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&LogDocument::from(event))
            .send()
            .await
            .map_err(classify)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(api_error(response).await)
        }
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let url = format!("{}/health", self.config.base_url());

        let response = self.client.get(&url).send().await.map_err(classify)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }
}

/// Schema for the search-log collection
pub fn collection_schema(name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "fields": [
            { "name": "query", "type": "string" },
            { "name": "result_count", "type": "int32" },
            { "name": "filter_type", "type": "string" },
            { "name": "clicked_result", "type": "string", "optional": true },
            { "name": "timestamp", "type": "int64" },
            { "name": "user_agent", "type": "string" },
            { "name": "session_id", "type": "string" },
            { "name": "latency_ms", "type": "int32", "optional": true }
        ],
        "default_sorting_field": "timestamp"
    })
}

fn classify(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout
    } else if e.is_connect() {
        StoreError::Unavailable
    } else {
        StoreError::Request(e)
    }
}

async fn api_error(response: Response) -> StoreError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    StoreError::Api {
        status: status.as_u16(),
        message: text,
    }
}

// ============================================
// Request/Response DTOs
// ============================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    found: u64,
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    document: SearchEvent,
}

/// Document body as written to the store; "no click" is stored as ""
#[derive(Debug, Serialize)]
struct LogDocument<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    id: &'a str,
    query: &'a str,
    result_count: u32,
    filter_type: &'a str,
    clicked_result: &'a str,
    timestamp: i64,
    user_agent: &'a str,
    session_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
}

impl<'a> From<&'a SearchEvent> for LogDocument<'a> {
    fn from(event: &'a SearchEvent) -> Self {
        Self {
            id: &event.id,
            query: &event.query,
            result_count: event.result_count,
            filter_type: &event.filter_type,
            clicked_result: event.clicked_result.as_deref().unwrap_or(""),
            timestamp: event.timestamp,
            user_agent: &event.user_agent,
            session_id: &event.session_id,
            latency_ms: event.latency_ms,
        }
    }
}
