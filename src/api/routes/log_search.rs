//! Search Log Routes
//!
//! - POST /api/v1/log-search - Record one search event

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use std::sync::Arc;

use crate::api::dto::{LogSearchRequest, LogSearchResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

const MAX_QUERY_LEN: usize = 512;

/// POST /api/v1/log-search
///
/// Append one search event to the log. The collection is created on first
/// write if it does not exist yet.
pub async fn log_search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LogSearchRequest>,
) -> ApiResult<(StatusCode, Json<LogSearchResponse>)> {
    validate_log_request(&req)?;

    let id = uuid::Uuid::new_v4().to_string();
    let event = req.into_event(id.clone(), Utc::now().timestamp());

    state.store().record_event(&event).await?;
    tracing::debug!(id = %id, query = %event.query, "Logged search");

    Ok((
        StatusCode::CREATED,
        Json(LogSearchResponse { success: true, id }),
    ))
}

fn validate_log_request(req: &LogSearchRequest) -> ApiResult<()> {
    if req.query.trim().is_empty() {
        return Err(ApiError::Validation("Query cannot be empty".to_string()));
    }

    if req.query.len() > MAX_QUERY_LEN {
        return Err(ApiError::Validation(format!(
            "Query exceeds maximum length of {} characters",
            MAX_QUERY_LEN
        )));
    }

    if let Some(ts) = req.timestamp {
        if ts < 0 {
            return Err(ApiError::Validation(
                "Timestamp must be Unix seconds".to_string(),
            ));
        }
    }

    Ok(())
}
