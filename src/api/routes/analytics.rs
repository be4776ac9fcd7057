//! Analytics Routes
//!
//! - GET /api/v1/analytics?days=N - Run an analysis and return the report
//! - GET /api/v1/analytics/latest - Last published report and error

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::analytics::{AnalysisReport, DashboardState};
use crate::api::dto::AnalyticsParams;
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// GET /api/v1/analytics
///
/// Runs a fresh analysis. Each call is a new run; a run overtaken by a newer
/// one answers 409 instead of publishing stale numbers.
///
/// The run counter is shared by every client of this server, not kept per
/// caller: when two clients request analyses at the same time, the earlier
/// one gets 409 and should read `GET /api/v1/analytics/latest` for the
/// report that won. A request rejected with 400 does not count as a run.
pub async fn run_analysis(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AnalyticsParams>,
) -> ApiResult<Json<AnalysisReport>> {
    let days = params.days.unwrap_or(state.default_window_days);
    let report = state.controller.run_analysis(days).await?;
    Ok(Json(report))
}

/// GET /api/v1/analytics/latest
pub async fn latest(State(state): State<Arc<AppState>>) -> Json<DashboardState> {
    Json(state.controller.latest().await)
}
