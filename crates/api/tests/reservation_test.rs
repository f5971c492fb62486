//! Tests for the reservation call surface: the handler validation path, and
//! the capacity scenario, idempotent re-reserve, and release outcomes
//! expressed against the repository contract the handlers consume.

mod test_utils;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use pretty_assertions::assert_eq;
use tutorbook_api::handlers::reservation::create_reservation;
use tutorbook_api::middleware::error_handling::AppError;
use tutorbook_core::errors::BookingError;
use tutorbook_core::models::reservation::CreateReservationRequest;
use tutorbook_db::models::DbSlotReservation;
use tutorbook_db::repositories::reservation::{RecountOutcome, ReleaseOutcome};
use uuid::Uuid;

use crate::test_utils::TestContext;

const DAY: &str = "mon";
const START: &str = "20:00";
const END: &str = "21:00";

fn make_reservation(enrollment_id: Uuid, teacher_id: Uuid) -> DbSlotReservation {
    DbSlotReservation {
        id: Uuid::new_v4(),
        enrollment_id,
        teacher_id,
        day: DAY.to_string(),
        start_at: START.to_string(),
        end_at: END.to_string(),
        created_at: Utc::now(),
        released_at: None,
    }
}

// The real handler rejects malformed input before any database work, so it
// can be driven directly against a lazily-connected pool.
#[tokio::test]
async fn test_create_reservation_handler_rejects_malformed_day() {
    let state = TestContext::new().build_state();

    let payload = CreateReservationRequest {
        enrollment_id: Uuid::new_v4(),
        teacher_id: Uuid::new_v4(),
        day: "monday".to_string(),
        start: START.to_string(),
        end: END.to_string(),
    };

    let result = create_reservation(State(state), Json(payload)).await;
    assert!(matches!(result, Err(AppError(BookingError::Validation(_)))));
}

#[tokio::test]
async fn test_create_reservation_handler_rejects_inverted_range() {
    let state = TestContext::new().build_state();

    let payload = CreateReservationRequest {
        enrollment_id: Uuid::new_v4(),
        teacher_id: Uuid::new_v4(),
        day: DAY.to_string(),
        start: END.to_string(),
        end: START.to_string(),
    };

    let result = create_reservation(State(state), Json(payload)).await;
    assert!(matches!(result, Err(AppError(BookingError::Validation(_)))));
}

// Teacher T publishes (mon, 20:00-21:00) capacity 2. A reserves, B reserves,
// C is rejected, A releases, C retries and succeeds.
#[tokio::test]
async fn test_capacity_scenario() {
    let mut ctx = TestContext::new();
    let teacher_id = Uuid::new_v4();
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    let reservation_a = make_reservation(a, teacher_id);
    let reservation_a_id = reservation_a.id;

    {
        let reservation_a = reservation_a.clone();
        ctx.reservation_repo
            .expect_reserve()
            .withf(move |e, _, _, _, _| *e == a)
            .times(1)
            .returning(move |_, _, _, _, _| Ok(reservation_a.clone()));
    }
    ctx.reservation_repo
        .expect_reserve()
        .withf(move |e, _, _, _, _| *e == b)
        .times(1)
        .returning(move |e, t, _, _, _| Ok(make_reservation(e, t)));
    // First attempt by C: slot is full.
    ctx.reservation_repo
        .expect_reserve()
        .withf(move |e, _, _, _, _| *e == c)
        .times(1)
        .returning(|_, _, _, _, _| {
            Err(BookingError::CapacityExceeded(
                "Slot mon 20:00-21:00 is fully booked (2 of 2)".to_string(),
            ))
        });
    {
        let mut released = reservation_a.clone();
        released.released_at = Some(Utc::now());
        ctx.reservation_repo
            .expect_release()
            .withf(move |id| *id == reservation_a_id)
            .times(1)
            .returning(move |_| {
                Ok(ReleaseOutcome {
                    reservation: released.clone(),
                    was_already_released: false,
                })
            });
    }
    // Retry by C after A released.
    ctx.reservation_repo
        .expect_reserve()
        .withf(move |e, _, _, _, _| *e == c)
        .times(1)
        .returning(move |e, t, _, _, _| Ok(make_reservation(e, t)));

    let first = ctx.reservation_repo.reserve(a, teacher_id, DAY, START, END).await;
    assert_eq!(first.unwrap().id, reservation_a_id);

    let second = ctx.reservation_repo.reserve(b, teacher_id, DAY, START, END).await;
    assert!(second.is_ok());

    let rejected = ctx.reservation_repo.reserve(c, teacher_id, DAY, START, END).await;
    assert!(matches!(rejected, Err(BookingError::CapacityExceeded(_))));

    let released = ctx.reservation_repo.release(reservation_a_id).await.unwrap();
    assert!(!released.was_already_released);
    assert!(released.reservation.released_at.is_some());

    let retry = ctx.reservation_repo.reserve(c, teacher_id, DAY, START, END).await;
    assert_eq!(retry.unwrap().enrollment_id, c);
}

// Re-issuing an identical reservation request returns the existing
// reservation unchanged, never a second row.
#[tokio::test]
async fn test_reserve_is_idempotent() {
    let mut ctx = TestContext::new();
    let teacher_id = Uuid::new_v4();
    let enrollment_id = Uuid::new_v4();

    let reservation = make_reservation(enrollment_id, teacher_id);
    let reservation_id = reservation.id;

    ctx.reservation_repo
        .expect_reserve()
        .times(2)
        .returning(move |_, _, _, _, _| Ok(reservation.clone()));

    let first = ctx
        .reservation_repo
        .reserve(enrollment_id, teacher_id, DAY, START, END)
        .await
        .unwrap();
    let second = ctx
        .reservation_repo
        .reserve(enrollment_id, teacher_id, DAY, START, END)
        .await
        .unwrap();

    assert_eq!(first.id, reservation_id);
    assert_eq!(second.id, reservation_id);
}

#[tokio::test]
async fn test_release_of_released_reservation_is_noop() {
    let mut ctx = TestContext::new();
    let mut reservation = make_reservation(Uuid::new_v4(), Uuid::new_v4());
    reservation.released_at = Some(Utc::now());
    let reservation_id = reservation.id;

    ctx.reservation_repo
        .expect_release()
        .times(1)
        .returning(move |_| {
            Ok(ReleaseOutcome {
                reservation: reservation.clone(),
                was_already_released: true,
            })
        });

    let outcome = ctx.reservation_repo.release(reservation_id).await.unwrap();
    assert!(outcome.was_already_released);
}

#[tokio::test]
async fn test_release_unknown_reservation_is_not_found() {
    let mut ctx = TestContext::new();
    let id = Uuid::new_v4();

    ctx.reservation_repo
        .expect_release()
        .times(1)
        .returning(move |id| {
            Err(BookingError::NotFound(format!(
                "Reservation with ID {} not found",
                id
            )))
        });

    let outcome = ctx.reservation_repo.release(id).await;
    assert!(matches!(outcome, Err(BookingError::NotFound(_))));
}

#[tokio::test]
async fn test_recount_is_idempotent() {
    let mut ctx = TestContext::new();
    let slot_id = Uuid::new_v4();

    // First pass repairs drift, second finds nothing to do.
    ctx.reservation_repo
        .expect_recompute_reserved_count()
        .times(1)
        .returning(move |slot_id| {
            Ok(RecountOutcome {
                slot_id,
                previous: 3,
                recomputed: 2,
            })
        });
    ctx.reservation_repo
        .expect_recompute_reserved_count()
        .times(1)
        .returning(move |slot_id| {
            Ok(RecountOutcome {
                slot_id,
                previous: 2,
                recomputed: 2,
            })
        });

    let repaired = ctx
        .reservation_repo
        .recompute_reserved_count(slot_id)
        .await
        .unwrap();
    assert_eq!(repaired.previous, 3);
    assert_eq!(repaired.recomputed, 2);

    let stable = ctx
        .reservation_repo
        .recompute_reserved_count(slot_id)
        .await
        .unwrap();
    assert_eq!(stable.previous, stable.recomputed);
}
