//! Schema migrations.
//!
//! Versions are tracked in `PRAGMA user_version`. Migrations run in
//! order and are forward-only; opening a database newer than this
//! build supports is an error.

use crate::schema;
use crate::{DbError, Result, SCHEMA_VERSION};
use rusqlite::Connection;

/// Run all pending migrations.
pub fn run(conn: &Connection) -> Result<()> {
    let current: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if current == SCHEMA_VERSION {
        return Ok(());
    }

    if current > SCHEMA_VERSION {
        return Err(DbError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, SCHEMA_VERSION
        )));
    }

    tracing::info!(from = current, to = SCHEMA_VERSION, "running migrations");

    if current < 1 {
        conn.execute_batch(schema::SCHEMA_V1)?;
    }

    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}
