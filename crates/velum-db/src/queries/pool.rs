//! Commitment and nullifier set queries.
//!
//! Both sets are append-only. Insert conflicts surface as SQLite
//! constraint errors; the engine checks membership before inserting,
//! so a conflict here means the in-memory and on-disk sets diverged.

use crate::Result;
use crate::queries::blob32;
use rusqlite::{Connection, params};
use velum_types::{Commitment, LeafIndex, Nullifier};

/// Record a new commitment at the given leaf index.
pub fn insert_commitment(
    conn: &Connection,
    commitment: &Commitment,
    leaf_index: LeafIndex,
    created_at: u64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO commitments (commitment, leaf_index, created_at) VALUES (?1, ?2, ?3)",
        params![commitment.as_slice(), leaf_index as i64, created_at as i64],
    )?;
    Ok(())
}

/// Check whether a commitment is present.
pub fn has_commitment(conn: &Connection, commitment: &Commitment) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM commitments WHERE commitment = ?1",
        params![commitment.as_slice()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Load all commitments in leaf order.
pub fn all_commitments(conn: &Connection) -> Result<Vec<Commitment>> {
    let mut stmt = conn.prepare("SELECT commitment FROM commitments ORDER BY leaf_index ASC")?;
    let rows = stmt.query_map([], |row| row.get::<_, Vec<u8>>(0))?;

    let mut out = Vec::new();
    for row in rows {
        out.push(blob32(row?)?);
    }
    Ok(out)
}

/// Count recorded commitments.
pub fn commitment_count(conn: &Connection) -> Result<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM commitments", [], |row| row.get(0))?;
    Ok(count as u64)
}

/// Record a spent nullifier.
pub fn insert_nullifier(conn: &Connection, nullifier: &Nullifier, spent_at: u64) -> Result<()> {
    conn.execute(
        "INSERT INTO nullifiers (nullifier, spent_at) VALUES (?1, ?2)",
        params![nullifier.as_slice(), spent_at as i64],
    )?;
    Ok(())
}

/// Check whether a nullifier has been spent.
pub fn is_nullifier_spent(conn: &Connection, nullifier: &Nullifier) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM nullifiers WHERE nullifier = ?1",
        params![nullifier.as_slice()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Load all spent nullifiers.
pub fn all_nullifiers(conn: &Connection) -> Result<Vec<Nullifier>> {
    let mut stmt = conn.prepare("SELECT nullifier FROM nullifiers")?;
    let rows = stmt.query_map([], |row| row.get::<_, Vec<u8>>(0))?;

    let mut out = Vec::new();
    for row in rows {
        out.push(blob32(row?)?);
    }
    Ok(out)
}

/// Count spent nullifiers.
pub fn nullifier_count(conn: &Connection) -> Result<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM nullifiers", [], |row| row.get(0))?;
    Ok(count as u64)
}
