use mockall::mock;
use tutorbook_core::errors::BookingResult;
use tutorbook_core::time::Window;
use uuid::Uuid;

use crate::models::{DbSlotReservation, DbTeacherSlot};
use crate::repositories::reservation::{RecountOutcome, ReleaseOutcome};

// Mock repositories for testing
mock! {
    pub SlotRepo {
        pub async fn publish_availability(
            &self,
            teacher_id: Uuid,
            windows: Vec<Window>,
        ) -> BookingResult<Vec<DbTeacherSlot>>;

        pub async fn get_slots_by_teacher_id(
            &self,
            teacher_id: Uuid,
        ) -> BookingResult<Vec<DbTeacherSlot>>;

        pub async fn get_active_slot(
            &self,
            teacher_id: Uuid,
            day: &'static str,
            start_at: &'static str,
            end_at: &'static str,
        ) -> BookingResult<Option<DbTeacherSlot>>;
    }
}

mock! {
    pub ReservationRepo {
        pub async fn reserve(
            &self,
            enrollment_id: Uuid,
            teacher_id: Uuid,
            day: &'static str,
            start_at: &'static str,
            end_at: &'static str,
        ) -> BookingResult<DbSlotReservation>;

        pub async fn get_reservation_by_id(
            &self,
            id: Uuid,
        ) -> BookingResult<Option<DbSlotReservation>>;

        pub async fn release(&self, id: Uuid) -> BookingResult<ReleaseOutcome>;

        pub async fn recompute_reserved_count(
            &self,
            slot_id: Uuid,
        ) -> BookingResult<RecountOutcome>;
    }
}
