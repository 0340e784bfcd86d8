//! Schema for the `store_entries` table backing every named store.
//!
//! Applied versions are recorded in `store_schema`; opening a database only
//! runs the steps above the highest recorded version.

use crate::Error;
use tokio_rusqlite::{Connection, params};

/// Schema steps, oldest first.
const STEPS: &[(i64, &str)] = &[(1, include_str!("../../migrations/001_store_entries.sql"))];

/// Bring the store schema up to the latest step.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS store_schema (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let applied: i64 =
            conn.query_row("SELECT COALESCE(MAX(version), 0) FROM store_schema", [], |row| row.get(0))?;

        for (version, sql) in STEPS.iter().filter(|(version, _)| *version > applied) {
            conn.execute_batch(sql)
                .map_err(|e| Error::MigrationFailed(format!("store schema v{version}: {e}")))?;
            conn.execute(
                "INSERT INTO store_schema (version, applied_at) VALUES (?1, ?2)",
                params![version, chrono::Utc::now().to_rfc3339()],
            )?;
            tracing::debug!(version, "store schema upgraded");
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}
