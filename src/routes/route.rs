use crate::error::{AppError, Result};
use crate::models::{RouteRequest, RouteResponse};
use crate::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// GET /route/ping
pub async fn ping() -> Json<Value> {
    Json(json!({ "ok": true, "service": "route" }))
}

/// POST /route
/// Route through the given points; points without coordinates are skipped
pub async fn route_points(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RouteRequest>,
) -> Result<Json<RouteResponse>> {
    let points = request.coordinates();
    if points.len() < 2 {
        return Err(AppError::InvalidRequest(
            "At least two points with coordinates are required".to_string(),
        ));
    }

    tracing::debug!(
        "Route request: mode={}, {} points, round_trip={}",
        request.mode,
        points.len(),
        request.round_trip
    );

    let leg = state
        .router
        .route(request.mode, &points, request.round_trip)
        .await?;

    Ok(Json(RouteResponse {
        route: leg.into_summary(),
    }))
}
