//! `SQLite` schema bootstrap logic.
//!
//! Table definitions use `CREATE TABLE IF NOT EXISTS`, so this is safe to
//! re-run on every startup.

use sqlx::SqlitePool;

use crate::Result;

/// Apply the appointment table definition.
///
/// `seq` preserves insertion order for listings; `id` is the public key.
///
/// # Errors
///
/// Returns `AppError::Db` if any DDL statement fails.
pub async fn bootstrap_schema(pool: &SqlitePool) -> Result<()> {
    let ddl = r"
CREATE TABLE IF NOT EXISTS appointment (
    seq             INTEGER PRIMARY KEY AUTOINCREMENT,
    id              TEXT NOT NULL UNIQUE,
    requester_name  TEXT NOT NULL,
    requester_email TEXT NOT NULL,
    date            TEXT NOT NULL,
    time            TEXT NOT NULL,
    description     TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    confirmed       INTEGER NOT NULL DEFAULT 0 CHECK(confirmed IN (0, 1)),
    confirmed_at    TEXT,
    CHECK ((confirmed = 1) = (confirmed_at IS NOT NULL))
);
";

    sqlx::raw_sql(ddl).execute(pool).await?;
    Ok(())
}
