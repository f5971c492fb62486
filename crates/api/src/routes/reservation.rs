use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/reservations",
            post(handlers::reservation::create_reservation),
        )
        .route(
            "/api/reservations/:id",
            get(handlers::reservation::get_reservation),
        )
        .route(
            "/api/reservations/:id",
            delete(handlers::reservation::release_reservation),
        )
        .route(
            "/api/slots/:id/recount",
            post(handlers::reservation::recount_slot),
        )
}
