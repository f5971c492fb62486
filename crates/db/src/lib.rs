pub mod models;
pub mod repositories;
pub mod schema;

pub mod mock;

use eyre::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tutorbook_core::errors::BookingError;

pub type DbPool = Pool<Postgres>;

/// Bound on how long any statement waits for a slot row lock before the
/// transaction aborts and the caller gets a retryable `Contention` error.
pub(crate) const SET_LOCK_TIMEOUT: &str = "SET LOCAL lock_timeout = '2s'";

pub async fn create_pool(database_url: &str) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Classifies a sqlx error into the domain taxonomy. Lock-wait timeouts
/// (SQLSTATE 55P03, produced by `lock_timeout`) become `Contention` so the
/// caller knows a retry with backoff is safe; everything else is a plain
/// database failure.
pub(crate) fn map_db_err(err: sqlx::Error) -> BookingError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.code().as_deref() == Some("55P03") {
            return BookingError::Contention(
                "Timed out waiting for slot lock".to_string(),
            );
        }
    }
    BookingError::Database(eyre::Report::new(err))
}

/// SQLSTATE 23505: a unique constraint rejected the insert, meaning an
/// identical active reservation already exists.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}
