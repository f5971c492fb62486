//! # Availability Handlers
//!
//! Endpoints for the slot availability store: publishing a teacher's weekly
//! window set, listing it, and querying remaining capacity for one exact
//! window. All input validation (weekday codes, HH:MM format, end after
//! start, overlap detection) happens here in core types before any database
//! work; the repository then enforces the reservation-safety policies under
//! row locks.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tutorbook_core::{
    errors::BookingError,
    models::slot::{
        CapacityResponse, PublishAvailabilityRequest, SlotResponse, TeacherAvailabilityResponse,
    },
    time::{check_no_overlap, parse_slot_key, Window},
};
use tutorbook_db::models::DbTeacherSlot;
use uuid::Uuid;

use crate::{middleware::error_handling::AppError, ApiState};

fn to_slot_response(slot: DbTeacherSlot) -> SlotResponse {
    SlotResponse {
        id: slot.id,
        day: slot.day,
        start: slot.start_at,
        end: slot.end_at,
        is_active: slot.is_active,
        capacity: slot.capacity,
        reserved_count: slot.reserved_count,
    }
}

/// Replaces the set of published availability windows for a teacher.
///
/// # Endpoint
///
/// ```text
/// PUT /api/teachers/:teacher_id/availability
/// ```
///
/// The request body carries the full window set; windows omitted from it are
/// retired (deleted when idle, deactivated when they still hold active
/// reservations). Overlapping windows, malformed times, or a capacity below
/// a window's current reservation count reject the whole publish.
#[axum::debug_handler]
pub async fn publish_availability(
    State(state): State<Arc<ApiState>>,
    Path(teacher_id): Path<Uuid>,
    Json(payload): Json<PublishAvailabilityRequest>,
) -> Result<Json<TeacherAvailabilityResponse>, AppError> {
    let mut windows = Vec::with_capacity(payload.windows.len());
    for window in &payload.windows {
        let (day, start, end) = parse_slot_key(&window.day, &window.start, &window.end)?;
        windows.push(Window::new(day, start, end, window.capacity.unwrap_or(1))?);
    }
    check_no_overlap(&windows)?;

    let slots =
        tutorbook_db::repositories::slot::publish_availability(&state.db_pool, teacher_id, &windows)
            .await?;

    Ok(Json(TeacherAvailabilityResponse {
        teacher_id,
        slots: slots.into_iter().map(to_slot_response).collect(),
    }))
}

/// Lists a teacher's published slots, active and inactive.
///
/// # Endpoint
///
/// ```text
/// GET /api/teachers/:teacher_id/availability
/// ```
#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<ApiState>>,
    Path(teacher_id): Path<Uuid>,
) -> Result<Json<TeacherAvailabilityResponse>, AppError> {
    let slots =
        tutorbook_db::repositories::slot::get_slots_by_teacher_id(&state.db_pool, teacher_id)
            .await?;

    Ok(Json(TeacherAvailabilityResponse {
        teacher_id,
        slots: slots.into_iter().map(to_slot_response).collect(),
    }))
}

/// Query parameters identifying one exact slot window.
#[derive(Debug, Deserialize)]
pub struct CapacityQuery {
    pub day: String,
    pub start: String,
    pub end: String,
}

/// Returns the remaining capacity of one exact active slot.
///
/// # Endpoint
///
/// ```text
/// GET /api/teachers/:teacher_id/availability/capacity?day=mon&start=20:00&end=21:00
/// ```
///
/// # Errors
///
/// * `Validation` - malformed weekday or HH:MM
/// * `NotFound` - no active slot matches the exact window
#[axum::debug_handler]
pub async fn get_available_capacity(
    State(state): State<Arc<ApiState>>,
    Path(teacher_id): Path<Uuid>,
    Query(query): Query<CapacityQuery>,
) -> Result<Json<CapacityResponse>, AppError> {
    let (day, start, end) = parse_slot_key(&query.day, &query.start, &query.end)?;

    let slot = tutorbook_db::repositories::slot::get_active_slot(
        &state.db_pool,
        teacher_id,
        day.as_str(),
        &start.to_string(),
        &end.to_string(),
    )
    .await?
    .ok_or_else(|| {
        BookingError::NotFound(format!(
            "No active slot for teacher {} on {} {}-{}",
            teacher_id, day, start, end
        ))
    })?;

    Ok(Json(CapacityResponse {
        teacher_id,
        day: slot.day.clone(),
        start: slot.start_at.clone(),
        end: slot.end_at.clone(),
        capacity: slot.capacity,
        reserved_count: slot.reserved_count,
        available: slot.capacity - slot.reserved_count,
    }))
}
