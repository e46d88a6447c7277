use crate::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// GET /ping
pub async fn ping() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// GET /debug/health - Check if the trip store is reachable
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let repo = state.trips.repository();
    let mut status = json!({
        "status": "ok",
        "fast_mode": state.trips.fast_mode(),
        "checks": {}
    });

    match repo.health_check().await {
        Ok(()) => {
            status["checks"]["storage"] = json!({ "backend": repo.backend_name(), "status": "ok" });
        }
        Err(e) => {
            status["checks"]["storage"] =
                json!({ "backend": repo.backend_name(), "error": e.to_string() });
            status["status"] = json!("error");
        }
    }

    Json(status)
}
