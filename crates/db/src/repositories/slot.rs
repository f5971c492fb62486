//! Slot availability store: the source of truth for which
//! (teacher, weekday, time-range) combinations are offerable and how many
//! concurrent bookings each allows.
//!
//! `publish_availability` takes the same per-row locks as the reservation
//! protocol, so a capacity edit can never interleave with an in-flight
//! check-then-increment on the same slot.

use std::collections::HashMap;

use sqlx::{Pool, Postgres};
use tracing::warn;
use tutorbook_core::errors::{BookingError, BookingResult};
use tutorbook_core::time::Window;
use uuid::Uuid;

use crate::models::DbTeacherSlot;
use crate::{map_db_err, SET_LOCK_TIMEOUT};

const SLOT_COLUMNS: &str =
    "id, teacher_id, day, start_at, end_at, is_active, capacity, reserved_count, created_at, updated_at";

fn window_key(w: &Window) -> (String, String, String) {
    (w.day.to_string(), w.start.to_string(), w.end.to_string())
}

/// Replaces a teacher's published window set.
///
/// Windows matching an existing slot are reactivated with the new capacity;
/// new windows are inserted; slots absent from the new set are deleted when
/// idle or deactivated when they still hold active reservations, so no
/// reservation is ever orphaned. Lowering a capacity below the current
/// reserved count rejects the whole publish.
pub async fn publish_availability(
    pool: &Pool<Postgres>,
    teacher_id: Uuid,
    windows: &[Window],
) -> BookingResult<Vec<DbTeacherSlot>> {
    let mut tx = pool.begin().await.map_err(map_db_err)?;
    sqlx::query(SET_LOCK_TIMEOUT)
        .execute(&mut *tx)
        .await
        .map_err(map_db_err)?;

    // Lock every slot row for this teacher up front; reservations against
    // them serialize behind this transaction.
    let existing = sqlx::query_as::<_, DbTeacherSlot>(&format!(
        r#"
        SELECT {SLOT_COLUMNS}
        FROM teacher_slots
        WHERE teacher_id = $1
        ORDER BY id
        FOR UPDATE
        "#,
    ))
    .bind(teacher_id)
    .fetch_all(&mut *tx)
    .await
    .map_err(map_db_err)?;

    let mut existing_by_key: HashMap<(String, String, String), &DbTeacherSlot> = HashMap::new();
    for slot in &existing {
        existing_by_key.insert(
            (slot.day.clone(), slot.start_at.clone(), slot.end_at.clone()),
            slot,
        );
    }

    let published: Vec<(String, String, String)> = windows.iter().map(window_key).collect();

    // Retire slots that fell out of the published set.
    for slot in &existing {
        let key = (slot.day.clone(), slot.start_at.clone(), slot.end_at.clone());
        if published.contains(&key) {
            continue;
        }

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

        if active > 0 {
            warn!(
                "Deactivating slot {} ({} {}-{}) with {} active reservations",
                slot.id, slot.day, slot.start_at, slot.end_at, active
            );
            sqlx::query(
                "UPDATE teacher_slots SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
            )
            .bind(slot.id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?;
        } else {
            sqlx::query("DELETE FROM teacher_slots WHERE id = $1")
                .bind(slot.id)
                .execute(&mut *tx)
                .await
                .map_err(map_db_err)?;
        }
    }

    // Upsert the published windows.
    for window in windows {
        let key = window_key(window);
        match existing_by_key.get(&key) {
            Some(slot) => {
                if window.capacity < slot.reserved_count {
                    return Err(BookingError::Validation(format!(
                        "Cannot lower capacity of slot {} {}-{} to {} below its {} active reservations",
                        slot.day, slot.start_at, slot.end_at, window.capacity, slot.reserved_count
                    )));
                }
                sqlx::query(
                    r#"
                    UPDATE teacher_slots
                    SET is_active = TRUE, capacity = $2, updated_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(slot.id)
                .bind(window.capacity)
                .execute(&mut *tx)
                .await
                .map_err(map_db_err)?;
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO teacher_slots (id, teacher_id, day, start_at, end_at, capacity)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(teacher_id)
                .bind(&key.0)
                .bind(&key.1)
                .bind(&key.2)
                .bind(window.capacity)
                .execute(&mut *tx)
                .await
                .map_err(map_db_err)?;
            }
        }
    }

    let slots = fetch_slots(&mut tx, teacher_id).await?;
    tx.commit().await.map_err(map_db_err)?;

    Ok(slots)
}

async fn fetch_slots(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    teacher_id: Uuid,
) -> BookingResult<Vec<DbTeacherSlot>> {
    sqlx::query_as::<_, DbTeacherSlot>(&format!(
        r#"
        SELECT {SLOT_COLUMNS}
        FROM teacher_slots
        WHERE teacher_id = $1
        ORDER BY array_position(ARRAY['mon','tue','wed','thu','fri','sat','sun'], day), start_at
        "#,
    ))
    .bind(teacher_id)
    .fetch_all(&mut **tx)
    .await
    .map_err(map_db_err)
}

pub async fn get_slots_by_teacher_id(
    pool: &Pool<Postgres>,
    teacher_id: Uuid,
) -> BookingResult<Vec<DbTeacherSlot>> {
    sqlx::query_as::<_, DbTeacherSlot>(&format!(
        r#"
        SELECT {SLOT_COLUMNS}
        FROM teacher_slots
        WHERE teacher_id = $1
        ORDER BY array_position(ARRAY['mon','tue','wed','thu','fri','sat','sun'], day), start_at
        "#,
    ))
    .bind(teacher_id)
    .fetch_all(pool)
    .await
    .map_err(map_db_err)
}

/// Looks up the exact active slot for a key tuple. `None` covers both a
/// never-published window and a deactivated one.
pub async fn get_active_slot(
    pool: &Pool<Postgres>,
    teacher_id: Uuid,
    day: &str,
    start_at: &str,
    end_at: &str,
) -> BookingResult<Option<DbTeacherSlot>> {
    sqlx::query_as::<_, DbTeacherSlot>(&format!(
        r#"
        SELECT {SLOT_COLUMNS}
        FROM teacher_slots
        WHERE teacher_id = $1 AND day = $2 AND start_at = $3 AND end_at = $4
          AND is_active = TRUE
        "#,
    ))
    .bind(teacher_id)
    .bind(day)
    .bind(start_at)
    .bind(end_at)
    .fetch_optional(pool)
    .await
    .map_err(map_db_err)
}
