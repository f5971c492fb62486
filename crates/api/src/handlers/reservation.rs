//! # Reservation Handlers
//!
//! The call surface the enrollment/purchase subsystem consumes: reserve a
//! unit of a slot's capacity, release it on cancellation, and trigger an
//! on-demand reconciliation of a slot's counter. The atomicity and
//! idempotency guarantees live in `tutorbook_db::repositories::reservation`;
//! these handlers parse input and map outcomes to HTTP.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::info;
use tutorbook_core::{
    models::reservation::{CreateReservationRequest, ReleaseResponse, ReservationResponse},
    models::slot::RecountResponse,
    time::parse_slot_key,
};
use tutorbook_db::models::DbSlotReservation;
use uuid::Uuid;

use crate::{middleware::error_handling::AppError, ApiState};

fn to_reservation_response(r: DbSlotReservation) -> ReservationResponse {
    ReservationResponse {
        id: r.id,
        enrollment_id: r.enrollment_id,
        teacher_id: r.teacher_id,
        day: r.day,
        start: r.start_at,
        end: r.end_at,
        created_at: r.created_at,
        released_at: r.released_at,
    }
}

/// Reserves one unit of a slot's capacity for an enrollment.
///
/// # Endpoint
///
/// ```text
/// POST /api/reservations
/// ```
///
/// Idempotent on (enrollment_id, teacher_id, day, start, end): repeating a
/// request returns the existing reservation unchanged.
///
/// # Errors
///
/// * `Validation` - malformed weekday or HH:MM, or end not after start
/// * `SlotUnavailable` - no such slot published, or it was deactivated
/// * `CapacityExceeded` - slot fully booked; definitive, not retryable
/// * `Contention` - slot lock wait timed out; retry with backoff
#[axum::debug_handler]
pub async fn create_reservation(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<CreateReservationRequest>,
) -> Result<Json<ReservationResponse>, AppError> {
    let (day, start, end) = parse_slot_key(&payload.day, &payload.start, &payload.end)?;

    let reservation = tutorbook_db::repositories::reservation::reserve(
        &state.db_pool,
        payload.enrollment_id,
        payload.teacher_id,
        day.as_str(),
        &start.to_string(),
        &end.to_string(),
    )
    .await?;

    info!(
        "Enrollment {} holds reservation {} on {} {}-{}",
        payload.enrollment_id, reservation.id, day, start, end
    );

    Ok(Json(to_reservation_response(reservation)))
}

/// Fetches a single reservation by id.
///
/// # Endpoint
///
/// ```text
/// GET /api/reservations/:id
/// ```
#[axum::debug_handler]
pub async fn get_reservation(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReservationResponse>, AppError> {
    let reservation =
        tutorbook_db::repositories::reservation::get_reservation_by_id(&state.db_pool, id)
            .await?
            .ok_or_else(|| {
                tutorbook_core::errors::BookingError::NotFound(format!(
                    "Reservation with ID {} not found",
                    id
                ))
            })?;

    Ok(Json(to_reservation_response(reservation)))
}

/// Releases a reservation, freeing one unit of the owning slot's capacity.
///
/// # Endpoint
///
/// ```text
/// DELETE /api/reservations/:id
/// ```
///
/// Releasing an already-released reservation is a no-op success; the
/// response flags it via `was_already_released`. An unknown id is a 404.
#[axum::debug_handler]
pub async fn release_reservation(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReleaseResponse>, AppError> {
    let outcome = tutorbook_db::repositories::reservation::release(&state.db_pool, id).await?;

    Ok(Json(ReleaseResponse {
        id: outcome.reservation.id,
        released_at: outcome.reservation.released_at,
        was_already_released: outcome.was_already_released,
    }))
}

/// Recomputes a slot's reserved count from its ledger of active
/// reservations.
///
/// # Endpoint
///
/// ```text
/// POST /api/slots/:id/recount
/// ```
///
/// Idempotent repair: invoking it any number of times yields the same
/// counter. Detected drift is logged by the repository.
#[axum::debug_handler]
pub async fn recount_slot(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RecountResponse>, AppError> {
    let outcome =
        tutorbook_db::repositories::reservation::recompute_reserved_count(&state.db_pool, id)
            .await?;

    Ok(Json(RecountResponse {
        slot_id: outcome.slot_id,
        previous: outcome.previous,
        recomputed: outcome.recomputed,
    }))
}
