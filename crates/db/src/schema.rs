use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Create teacher_slots table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS teacher_slots (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            teacher_id UUID NOT NULL,
            day VARCHAR(3) NOT NULL,
            start_at VARCHAR(5) NOT NULL,
            end_at VARCHAR(5) NOT NULL,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            capacity INTEGER NOT NULL DEFAULT 1,
            reserved_count INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_day CHECK (day IN ('mon','tue','wed','thu','fri','sat','sun')),
            CONSTRAINT valid_time_range CHECK (end_at > start_at),
            CONSTRAINT valid_capacity CHECK (capacity >= 1),
            CONSTRAINT valid_reserved_count CHECK (reserved_count >= 0 AND reserved_count <= capacity),
            CONSTRAINT unique_slot_key UNIQUE (teacher_id, day, start_at, end_at)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create slot_reservations table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS slot_reservations (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            enrollment_id UUID NOT NULL,
            teacher_id UUID NOT NULL,
            day VARCHAR(3) NOT NULL,
            start_at VARCHAR(5) NOT NULL,
            end_at VARCHAR(5) NOT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            released_at TIMESTAMP WITH TIME ZONE NULL,
            CONSTRAINT valid_reservation_day CHECK (day IN ('mon','tue','wed','thu','fri','sat','sun')),
            CONSTRAINT valid_reservation_range CHECK (end_at > start_at)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // One active reservation per key tuple; released rows stay behind as
    // history and do not block re-booking the same slot.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_active_reservation_key
            ON slot_reservations (enrollment_id, teacher_id, day, start_at, end_at)
            WHERE released_at IS NULL;
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_teacher_slots_teacher_id ON teacher_slots(teacher_id)",
        "CREATE INDEX IF NOT EXISTS idx_slot_reservations_enrollment_id ON slot_reservations(enrollment_id)",
        "CREATE INDEX IF NOT EXISTS idx_slot_reservations_slot_key ON slot_reservations(teacher_id, day, start_at, end_at)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}
