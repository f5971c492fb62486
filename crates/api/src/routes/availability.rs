use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/teachers/:teacher_id/availability",
            put(handlers::availability::publish_availability),
        )
        .route(
            "/api/teachers/:teacher_id/availability",
            get(handlers::availability::get_availability),
        )
        .route(
            "/api/teachers/:teacher_id/availability/capacity",
            get(handlers::availability::get_available_capacity),
        )
}
