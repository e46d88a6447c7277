use crate::error::Result;
use crate::models::{AiPlanRequest, CreateTripRequest, Plan, Trip, UpdateTripRequest};
use crate::routes::user::CurrentUser;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

const IDEMPOTENCY_HEADERS: [&str; 2] = ["idempotency-key", "x-idempotency-key"];

/// First non-empty idempotency header, if any
fn idempotency_key(headers: &HeaderMap) -> Option<&str> {
    IDEMPOTENCY_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    })
}

/// GET /trips
pub async fn list_trips(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<Trip>>> {
    Ok(Json(state.trips.list(user_id).await?))
}

/// POST /trips
/// 201 for a new trip, 200 when the idempotency key replays an earlier one
pub async fn create_trip(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    headers: HeaderMap,
    Json(request): Json<CreateTripRequest>,
) -> Result<(StatusCode, Json<Trip>)> {
    let (trip, created) = state
        .trips
        .create(user_id, idempotency_key(&headers), request)
        .await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(trip)))
}

/// POST /trips/ai
/// Plan an itinerary with the model; nothing is stored
pub async fn plan_trip(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(request): Json<AiPlanRequest>,
) -> Result<Json<Plan>> {
    tracing::info!(
        user = %user_id,
        "AI plan request: destination={:?}, mode={:?}",
        request.destination,
        request.mode
    );
    Ok(Json(state.trips.plan(&request).await?))
}

/// GET /trips/{id}
pub async fn get_trip(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Trip>> {
    Ok(Json(state.trips.get(user_id, id).await?))
}

/// PATCH /trips/{id}
pub async fn update_trip(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTripRequest>,
) -> Result<Json<Trip>> {
    Ok(Json(state.trips.update(user_id, id, request).await?))
}

/// DELETE /trips/{id}
pub async fn delete_trip(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>> {
    state.trips.delete(user_id, id).await?;
    Ok(Json(json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_idempotency_key_header_precedence() {
        let mut headers = HeaderMap::new();
        assert_eq!(idempotency_key(&headers), None);

        headers.insert("x-idempotency-key", HeaderValue::from_static("legacy"));
        assert_eq!(idempotency_key(&headers), Some("legacy"));

        headers.insert("idempotency-key", HeaderValue::from_static("  "));
        assert_eq!(idempotency_key(&headers), Some("legacy"));

        headers.insert("idempotency-key", HeaderValue::from_static("primary"));
        assert_eq!(idempotency_key(&headers), Some("primary"));
    }
}
