use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbTeacherSlot {
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

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSlotReservation {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub teacher_id: Uuid,
    pub day: String,
    pub start_at: String,
    pub end_at: String,
    pub created_at: DateTime<Utc>,
    pub released_at: Option<DateTime<Utc>>,
}

impl DbSlotReservation {
    pub fn is_active(&self) -> bool {
        self.released_at.is_none()
    }
}
