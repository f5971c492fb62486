//! Reservation ledger: allocates holds against a slot's remaining capacity
//! with idempotency and without over-booking under concurrent requests.
//!
//! Every mutation runs in one transaction that locks the slot row with
//! `SELECT ... FOR UPDATE` before reading the counter, so two requests
//! racing for the last unit of capacity serialize and exactly one wins.
//! `SET LOCAL lock_timeout` bounds the wait; a timeout surfaces as
//! `Contention`, which the caller may retry.
//!
//! Idempotency is checked twice on the reserve path: once up front as a
//! fast path, and again after the slot lock is held, because an identical
//! concurrent request may commit between the two. The partial unique index
//! on active reservations backstops both probes.

use sqlx::{Pool, Postgres, Transaction};
use tracing::{debug, warn};
use tutorbook_core::errors::{BookingError, BookingResult};
use uuid::Uuid;

use crate::models::{DbSlotReservation, DbTeacherSlot};
use crate::{is_unique_violation, map_db_err, SET_LOCK_TIMEOUT};

const RESERVATION_COLUMNS: &str =
    "id, enrollment_id, teacher_id, day, start_at, end_at, created_at, released_at";

/// Outcome of a release: the reservation, and whether this call actually
/// changed it. Double-release is a no-op, not an error.
#[derive(Debug, Clone)]
pub struct ReleaseOutcome {
    pub reservation: DbSlotReservation,
    pub was_already_released: bool,
}

/// Result of a reconciliation pass over one slot's ledger.
#[derive(Debug, Clone, Copy)]
pub struct RecountOutcome {
    pub slot_id: Uuid,
    pub previous: i32,
    pub recomputed: i32,
}

async fn find_active_reservation<'e, E>(
    executor: E,
    enrollment_id: Uuid,
    teacher_id: Uuid,
    day: &str,
    start_at: &str,
    end_at: &str,
) -> BookingResult<Option<DbSlotReservation>>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, DbSlotReservation>(&format!(
        r#"
        SELECT {RESERVATION_COLUMNS}
        FROM slot_reservations
        WHERE enrollment_id = $1 AND teacher_id = $2
          AND day = $3 AND start_at = $4 AND end_at = $5
          AND released_at IS NULL
        "#,
    ))
    .bind(enrollment_id)
    .bind(teacher_id)
    .bind(day)
    .bind(start_at)
    .bind(end_at)
    .fetch_optional(executor)
    .await
    .map_err(map_db_err)
}

async fn lock_slot_by_key(
    tx: &mut Transaction<'_, Postgres>,
    teacher_id: Uuid,
    day: &str,
    start_at: &str,
    end_at: &str,
) -> BookingResult<Option<DbTeacherSlot>> {
    sqlx::query_as::<_, DbTeacherSlot>(
        r#"
        SELECT id, teacher_id, day, start_at, end_at, is_active, capacity, reserved_count, created_at, updated_at
        FROM teacher_slots
        WHERE teacher_id = $1 AND day = $2 AND start_at = $3 AND end_at = $4
        FOR UPDATE
        "#,
    )
    .bind(teacher_id)
    .bind(day)
    .bind(start_at)
    .bind(end_at)
    .fetch_optional(&mut **tx)
    .await
    .map_err(map_db_err)
}

/// Reserves one unit of a slot's capacity for an enrollment.
///
/// Idempotent on the (enrollment, teacher, day, start, end) key: an existing
/// active reservation is returned unchanged without touching the counter,
/// even when the identical request arrives concurrently. Otherwise the slot
/// row is locked, and the capacity check plus the insert-plus-increment
/// commit as one unit.
pub async fn reserve(
    pool: &Pool<Postgres>,
    enrollment_id: Uuid,
    teacher_id: Uuid,
    day: &str,
    start_at: &str,
    end_at: &str,
) -> BookingResult<DbSlotReservation> {
    let mut tx = pool.begin().await.map_err(map_db_err)?;
    sqlx::query(SET_LOCK_TIMEOUT)
        .execute(&mut *tx)
        .await
        .map_err(map_db_err)?;

    // Fast path: an identical reservation already committed.
    if let Some(reservation) =
        find_active_reservation(&mut *tx, enrollment_id, teacher_id, day, start_at, end_at).await?
    {
        debug!(
            "Reservation {} already held by enrollment {}, returning unchanged",
            reservation.id, enrollment_id
        );
        tx.commit().await.map_err(map_db_err)?;
        return Ok(reservation);
    }

    let slot = lock_slot_by_key(&mut tx, teacher_id, day, start_at, end_at)
        .await?
        .ok_or_else(|| {
            BookingError::SlotUnavailable(format!(
                "No slot published for teacher {} on {} {}-{}",
                teacher_id, day, start_at, end_at
            ))
        })?;

    // Second probe, now serialized behind whoever held the slot lock: an
    // identical request may have committed while we waited, and it must be
    // returned rather than rejected on capacity or the unique index.
    if let Some(reservation) =
        find_active_reservation(&mut *tx, enrollment_id, teacher_id, day, start_at, end_at).await?
    {
        debug!(
            "Reservation {} committed concurrently for enrollment {}, returning unchanged",
            reservation.id, enrollment_id
        );
        tx.commit().await.map_err(map_db_err)?;
        return Ok(reservation);
    }

    if !slot.is_active {
        return Err(BookingError::SlotUnavailable(format!(
            "Slot {} {}-{} is no longer offered",
            slot.day, slot.start_at, slot.end_at
        )));
    }

    if slot.reserved_count >= slot.capacity {
        return Err(BookingError::CapacityExceeded(format!(
            "Slot {} {}-{} is fully booked ({} of {})",
            slot.day, slot.start_at, slot.end_at, slot.reserved_count, slot.capacity
        )));
    }

    let inserted = sqlx::query_as::<_, DbSlotReservation>(&format!(
        r#"
        INSERT INTO slot_reservations (id, enrollment_id, teacher_id, day, start_at, end_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {RESERVATION_COLUMNS}
        "#,
    ))
    .bind(Uuid::new_v4())
    .bind(enrollment_id)
    .bind(teacher_id)
    .bind(day)
    .bind(start_at)
    .bind(end_at)
    .fetch_one(&mut *tx)
    .await;

    let reservation = match inserted {
        Ok(reservation) => reservation,
        Err(err) if is_unique_violation(&err) => {
            // The partial unique index caught a duplicate both probes
            // missed. The transaction is aborted at this point, so the
            // existing row has to be read outside it.
            tx.rollback().await.map_err(map_db_err)?;
            return find_active_reservation(
                pool,
                enrollment_id,
                teacher_id,
                day,
                start_at,
                end_at,
            )
            .await?
            .ok_or_else(|| {
                BookingError::Contention(
                    "Lost a duplicate-reservation race; retry".to_string(),
                )
            });
        }
        Err(err) => return Err(map_db_err(err)),
    };

    // The guard clause repeats the capacity check; under the row lock it can
    // only fail if the counter drifted, in which case nothing commits.
    let updated = sqlx::query(
        r#"
        UPDATE teacher_slots
        SET reserved_count = reserved_count + 1, updated_at = NOW()
        WHERE id = $1 AND reserved_count < capacity
        "#,
    )
    .bind(slot.id)
    .execute(&mut *tx)
    .await
    .map_err(map_db_err)?;

    if updated.rows_affected() != 1 {
        return Err(BookingError::CapacityExceeded(format!(
            "Slot {} {}-{} is fully booked",
            slot.day, slot.start_at, slot.end_at
        )));
    }

    tx.commit().await.map_err(map_db_err)?;

    debug!(
        "Reserved slot {} {}-{} for enrollment {} (reservation {})",
        day, start_at, end_at, enrollment_id, reservation.id
    );
    Ok(reservation)
}

pub async fn get_reservation_by_id(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> BookingResult<Option<DbSlotReservation>> {
    sqlx::query_as::<_, DbSlotReservation>(&format!(
        r#"
        SELECT {RESERVATION_COLUMNS}
        FROM slot_reservations
        WHERE id = $1
        "#,
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(map_db_err)
}

/// Releases a reservation and decrements the owning slot's counter, both
/// under the slot row lock. Releasing an already-released reservation
/// returns it unchanged.
pub async fn release(pool: &Pool<Postgres>, id: Uuid) -> BookingResult<ReleaseOutcome> {
    let mut tx = pool.begin().await.map_err(map_db_err)?;
    sqlx::query(SET_LOCK_TIMEOUT)
        .execute(&mut *tx)
        .await
        .map_err(map_db_err)?;

    let reservation = sqlx::query_as::<_, DbSlotReservation>(&format!(
        r#"
        SELECT {RESERVATION_COLUMNS}
        FROM slot_reservations
        WHERE id = $1
        FOR UPDATE
        "#,
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(map_db_err)?
    .ok_or_else(|| BookingError::NotFound(format!("Reservation with ID {} not found", id)))?;

    if !reservation.is_active() {
        tx.commit().await.map_err(map_db_err)?;
        return Ok(ReleaseOutcome {
            reservation,
            was_already_released: true,
        });
    }

    let slot = lock_slot_by_key(
        &mut tx,
        reservation.teacher_id,
        &reservation.day,
        &reservation.start_at,
        &reservation.end_at,
    )
    .await?;

    let released = sqlx::query_as::<_, DbSlotReservation>(&format!(
        r#"
        UPDATE slot_reservations
        SET released_at = NOW()
        WHERE id = $1 AND released_at IS NULL
        RETURNING {RESERVATION_COLUMNS}
        "#,
    ))
    .bind(id)
    .fetch_one(&mut *tx)
    .await
    .map_err(map_db_err)?;

    match slot {
        Some(slot) => {
            sqlx::query(
                r#"
                UPDATE teacher_slots
                SET reserved_count = GREATEST(reserved_count - 1, 0), updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(slot.id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?;
        }
        None => {
            // The owning slot row is gone; nothing to decrement.
            warn!(
                "Released reservation {} but slot {} {}-{} for teacher {} no longer exists",
                id, released.day, released.start_at, released.end_at, released.teacher_id
            );
        }
    }

    tx.commit().await.map_err(map_db_err)?;

    Ok(ReleaseOutcome {
        reservation: released,
        was_already_released: false,
    })
}

/// Recomputes a slot's `reserved_count` from its ledger of active
/// reservations, repairing any drift left by partial failures. Running it
/// twice in a row is a no-op.
pub async fn recompute_reserved_count(
    pool: &Pool<Postgres>,
    slot_id: Uuid,
) -> BookingResult<RecountOutcome> {
    let mut tx = pool.begin().await.map_err(map_db_err)?;
    sqlx::query(SET_LOCK_TIMEOUT)
        .execute(&mut *tx)
        .await
        .map_err(map_db_err)?;

    let slot = sqlx::query_as::<_, DbTeacherSlot>(
        r#"
        SELECT id, teacher_id, day, start_at, end_at, is_active, capacity, reserved_count, created_at, updated_at
        FROM teacher_slots
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(slot_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(map_db_err)?
    .ok_or_else(|| BookingError::NotFound(format!("Slot with ID {} not found", slot_id)))?;

    let active: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM slot_reservations
        WHERE teacher_id = $1 AND day = $2 AND start_at = $3 AND end_at = $4
          AND released_at IS NULL
        "#,
    )
    .bind(slot.teacher_id)
    .bind(&slot.day)
    .bind(&slot.start_at)
    .bind(&slot.end_at)
    .fetch_one(&mut *tx)
    .await
    .map_err(map_db_err)?;

    let recomputed = active as i32;
    if recomputed != slot.reserved_count {
        warn!(
            "Slot {} counter drift: reserved_count={} but {} active reservations; repairing",
            slot.id, slot.reserved_count, recomputed
        );
        sqlx::query(
            "UPDATE teacher_slots SET reserved_count = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(slot.id)
        .bind(recomputed)
        .execute(&mut *tx)
        .await
        .map_err(map_db_err)?;
    }

    tx.commit().await.map_err(map_db_err)?;

    Ok(RecountOutcome {
        slot_id: slot.id,
        previous: slot.reserved_count,
        recomputed,
    })
}
