// HTTP request handlers
use crate::application::chart_service::ViewId;
use crate::application::chart_view::{ChartModel, HoverEvent, RangeSelection};
use crate::application::csv_export::SaveCapability;
use crate::infrastructure::http_response::{accepts_brotli, csv_download_response, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
pub struct OpenChartRequest {
    #[serde(default)]
    pub tag_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChartResponse<'a> {
    view_id: ViewId,
    #[serde(flatten)]
    chart: ChartModel<'a>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List all meters with their numeric gauges
pub async fn list_meters(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    match state.meter_service.list_meters().await {
        Ok(meters) => into_response(json_response(&meters, accepts_brotli(&headers)).await),
        Err(e) => {
            tracing::warn!("Error fetching meters: {:#}", e);
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

/// Fetch a meter's readings and open a chart view on them
pub async fn open_chart(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(request): Json<OpenChartRequest>,
) -> Response {
    let view_id = match state.chart_service.open_chart(request.tag_id.as_deref()).await {
        Ok(view_id) => view_id,
        Err(e) => {
            tracing::warn!("Error opening chart for {:?}: {:#}", request.tag_id, e);
            return StatusCode::BAD_GATEWAY.into_response();
        }
    };
    chart_response(&state, view_id, accepts_brotli(&headers)).await
}

/// Current model of an open chart view
pub async fn get_chart(
    Path(view_id): Path<ViewId>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    chart_response(&state, view_id, accepts_brotli(&headers)).await
}

/// Apply a range selected on the overview chart
pub async fn select_range(
    Path(view_id): Path<ViewId>,
    State(state): State<Arc<AppState>>,
    Json(selection): Json<RangeSelection>,
) -> Response {
    match state
        .chart_service
        .with_view(view_id, |view| view.select_range(&selection))
    {
        Some(viewports) => into_response(json_response(&viewports, false).await),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Pointer moved over a chart; answers with the refreshed legend rows or 204
pub async fn hover(
    Path(view_id): Path<ViewId>,
    State(state): State<Arc<AppState>>,
    Json(event): Json<HoverEvent>,
) -> Response {
    let refreshed = state
        .chart_service
        .with_view(view_id, |view| view.hover(event).map(|rows| rows.to_vec()));

    match refreshed {
        Some(Some(rows)) => into_response(json_response(&rows, false).await),
        Some(None) => StatusCode::NO_CONTENT.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Tear a chart view down
pub async fn close_chart(Path(view_id): Path<ViewId>, State(state): State<Arc<AppState>>) -> StatusCode {
    if state.chart_service.close_chart(view_id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Download one gauge's readings of an open view as CSV
pub async fn export_csv(
    Path((view_id, gauge_id)): Path<(ViewId, String)>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let exported_at_ms = chrono::Utc::now().timestamp_millis();
    let export = match state.chart_service.export_csv(view_id, &gauge_id, exported_at_ms) {
        Ok(Some(export)) => export,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!("Error exporting gauge {} of view {}: {:#}", gauge_id, view_id, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let accept = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok());
    into_response(csv_download_response(export, SaveCapability::detect(accept)))
}

async fn chart_response(state: &AppState, view_id: ViewId, compress: bool) -> Response {
    // Serialize while the view is locked, encode after releasing it
    let chart = state.chart_service.with_view(view_id, |view| {
        serde_json::to_value(ChartResponse {
            view_id,
            chart: view.model(),
        })
    });

    match chart {
        Some(Ok(chart)) => into_response(json_response(&chart, compress).await),
        Some(Err(e)) => {
            tracing::error!("Chart serialization error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn into_response(result: Result<Response, StatusCode>) -> Response {
    match result {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
