use chrono::Utc;
use pretty_assertions::assert_eq;
use serde_json::{from_str, to_string};
use tutorbook_core::models::{
    reservation::{CreateReservationRequest, ReleaseResponse, SlotReservation},
    slot::{PublishAvailabilityRequest, SlotResponse, TeacherSlot, WindowRequest},
};
use uuid::Uuid;

#[test]
fn test_teacher_slot_serialization() {
    let now = Utc::now();
    let slot = TeacherSlot {
        id: Uuid::new_v4(),
        teacher_id: Uuid::new_v4(),
        day: "mon".to_string(),
        start_at: "20:00".to_string(),
        end_at: "21:00".to_string(),
        is_active: true,
        capacity: 2,
        reserved_count: 1,
        created_at: now,
        updated_at: now,
    };

    let json = to_string(&slot).expect("Failed to serialize teacher slot");
    let deserialized: TeacherSlot = from_str(&json).expect("Failed to deserialize teacher slot");

    assert_eq!(deserialized.id, slot.id);
    assert_eq!(deserialized.teacher_id, slot.teacher_id);
    assert_eq!(deserialized.day, slot.day);
    assert_eq!(deserialized.start_at, slot.start_at);
    assert_eq!(deserialized.end_at, slot.end_at);
    assert_eq!(deserialized.capacity, slot.capacity);
    assert_eq!(deserialized.reserved_count, slot.reserved_count);
}

#[test]
fn test_slot_reservation_active_state() {
    let now = Utc::now();
    let mut reservation = SlotReservation {
        id: Uuid::new_v4(),
        enrollment_id: Uuid::new_v4(),
        teacher_id: Uuid::new_v4(),
        day: "mon".to_string(),
        start_at: "20:00".to_string(),
        end_at: "21:00".to_string(),
        created_at: now,
        released_at: None,
    };

    assert!(reservation.is_active());
    reservation.released_at = Some(now);
    assert!(!reservation.is_active());
}

#[test]
fn test_create_reservation_request_serialization() {
    let request = CreateReservationRequest {
        enrollment_id: Uuid::new_v4(),
        teacher_id: Uuid::new_v4(),
        day: "mon".to_string(),
        start: "20:00".to_string(),
        end: "21:00".to_string(),
    };

    let json = to_string(&request).expect("Failed to serialize create reservation request");
    let deserialized: CreateReservationRequest =
        from_str(&json).expect("Failed to deserialize create reservation request");

    assert_eq!(deserialized.enrollment_id, request.enrollment_id);
    assert_eq!(deserialized.teacher_id, request.teacher_id);
    assert_eq!(deserialized.day, request.day);
    assert_eq!(deserialized.start, request.start);
    assert_eq!(deserialized.end, request.end);
}

#[test]
fn test_window_request_capacity_defaults_to_none() {
    let json = r#"{"windows":[{"day":"mon","start":"20:00","end":"21:00"}]}"#;
    let request: PublishAvailabilityRequest =
        from_str(json).expect("Failed to deserialize publish request");

    assert_eq!(request.windows.len(), 1);
    assert_eq!(request.windows[0].capacity, None);
}

#[test]
fn test_window_request_with_capacity() {
    let request = WindowRequest {
        day: "fri".to_string(),
        start: "09:00".to_string(),
        end: "10:30".to_string(),
        capacity: Some(3),
    };

    let json = to_string(&request).expect("Failed to serialize window request");
    let deserialized: WindowRequest = from_str(&json).expect("Failed to deserialize window request");

    assert_eq!(deserialized.day, request.day);
    assert_eq!(deserialized.capacity, Some(3));
}

#[test]
fn test_slot_response_serialization() {
    let response = SlotResponse {
        id: Uuid::new_v4(),
        day: "wed".to_string(),
        start: "18:00".to_string(),
        end: "19:00".to_string(),
        is_active: false,
        capacity: 1,
        reserved_count: 1,
    };

    let json = to_string(&response).expect("Failed to serialize slot response");
    let deserialized: SlotResponse = from_str(&json).expect("Failed to deserialize slot response");

    assert_eq!(deserialized.id, response.id);
    assert_eq!(deserialized.is_active, response.is_active);
    assert_eq!(deserialized.reserved_count, response.reserved_count);
}

#[test]
fn test_release_response_serialization() {
    let response = ReleaseResponse {
        id: Uuid::new_v4(),
        released_at: Some(Utc::now()),
        was_already_released: false,
    };

    let json = to_string(&response).expect("Failed to serialize release response");
    let deserialized: ReleaseResponse =
        from_str(&json).expect("Failed to deserialize release response");

    assert_eq!(deserialized.id, response.id);
    assert_eq!(deserialized.was_already_released, response.was_already_released);
}
