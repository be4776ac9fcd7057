//! Export Routes
//!
//! - GET /api/v1/analytics/export?days=N - Download the window's events as CSV

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::sync::Arc;

use crate::analytics::{export_filename, to_csv_string, AnalysisError};
use crate::api::dto::AnalyticsParams;
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// GET /api/v1/analytics/export
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AnalyticsParams>,
) -> ApiResult<Response> {
    let days = params.days.unwrap_or(state.default_window_days);
    let rows = state.controller.export(days).await?;
    let body = to_csv_string(&rows).map_err(AnalysisError::from)?;

    let today = state.controller.zone().today(Utc::now());
    let disposition = format!("attachment; filename=\"{}\"", export_filename(today));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, disposition.as_str()),
        ],
        Body::from(body),
    )
        .into_response())
}
