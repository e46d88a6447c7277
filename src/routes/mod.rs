pub mod health;
pub mod route;
pub mod trips;
pub mod user;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ping", get(health::ping))
        .route("/debug/health", get(health::health_check))
        .route("/trips", get(trips::list_trips).post(trips::create_trip))
        .route("/trips/ai", post(trips::plan_trip))
        .route(
            "/trips/{id}",
            get(trips::get_trip)
                .patch(trips::update_trip)
                .delete(trips::delete_trip),
        )
        .route("/route/ping", get(route::ping))
        .route("/route", post(route::route_points))
        .with_state(state)
}
