use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recurring weekly availability window published by one teacher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherSlot {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub day: String,
    pub start_at: String,
    pub end_at: String,
    pub is_active: bool,
    pub capacity: i32,
    pub reserved_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishAvailabilityRequest {
    pub windows: Vec<WindowRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowRequest {
    pub day: String,
    pub start: String,
    pub end: String,
    /// Maximum concurrent reservations; defaults to 1 when omitted.
    pub capacity: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotResponse {
    pub id: Uuid,
    pub day: String,
    pub start: String,
    pub end: String,
    pub is_active: bool,
    pub capacity: i32,
    pub reserved_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherAvailabilityResponse {
    pub teacher_id: Uuid,
    pub slots: Vec<SlotResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityResponse {
    pub teacher_id: Uuid,
    pub day: String,
    pub start: String,
    pub end: String,
    pub capacity: i32,
    pub reserved_count: i32,
    pub available: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecountResponse {
    pub slot_id: Uuid,
    pub previous: i32,
    pub recomputed: i32,
}
