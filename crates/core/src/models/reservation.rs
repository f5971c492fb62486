use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One hold of one unit of a slot's capacity for one enrollment.
///
/// The ledger is append-only: cancellation sets `released_at` rather than
/// deleting the row, so the booking history survives and a released key
/// tuple can be reserved again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotReservation {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub teacher_id: Uuid,
    pub day: String,
    pub start_at: String,
    pub end_at: String,
    pub created_at: DateTime<Utc>,
    pub released_at: Option<DateTime<Utc>>,
}

impl SlotReservation {
    pub fn is_active(&self) -> bool {
        self.released_at.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReservationRequest {
    pub enrollment_id: Uuid,
    pub teacher_id: Uuid,
    pub day: String,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationResponse {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub teacher_id: Uuid,
    pub day: String,
    pub start: String,
    pub end: String,
    pub created_at: DateTime<Utc>,
    pub released_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseResponse {
    pub id: Uuid,
    pub released_at: Option<DateTime<Utc>>,
    /// True when this call found the reservation already released and
    /// changed nothing.
    pub was_already_released: bool,
}
