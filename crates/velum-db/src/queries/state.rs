//! Protocol state queries.

use crate::queries::blob32;
use crate::{DbError, Result};
use rusqlite::{Connection, OptionalExtension, params};
use velum_types::{AccountId, Amount};

/// Persisted protocol state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRow {
    pub authority: AccountId,
    pub vault: AccountId,
    pub total_shielded: Amount,
    pub total_public: Amount,
    pub created_at: u64,
}

/// Insert the singleton protocol state row.
///
/// Fails if the pool has already been initialized (the `CHECK (id = 1)`
/// constraint makes a second insert a primary-key conflict).
pub fn insert(
    conn: &Connection,
    authority: &AccountId,
    vault: &AccountId,
    created_at: u64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO protocol_state (id, authority, vault, total_shielded, total_public, created_at)
         VALUES (1, ?1, ?2, 0, 0, ?3)",
        params![authority.as_slice(), vault.as_slice(), created_at as i64],
    )?;
    Ok(())
}

/// Load the protocol state, if the pool has been initialized.
pub fn get(conn: &Connection) -> Result<Option<StateRow>> {
    let row = conn
        .query_row(
            "SELECT authority, vault, total_shielded, total_public, created_at
             FROM protocol_state WHERE id = 1",
            [],
            |row| {
                Ok((
                    row.get::<_, Vec<u8>>(0)?,
                    row.get::<_, Vec<u8>>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((authority, vault, total_shielded, total_public, created_at)) => Ok(Some(StateRow {
            authority: blob32(authority)?,
            vault: blob32(vault)?,
            total_shielded: total_shielded as u64,
            total_public: total_public as u64,
            created_at: created_at as u64,
        })),
        None => Ok(None),
    }
}

/// Update the running totals after an operation.
pub fn update_totals(conn: &Connection, total_shielded: Amount, total_public: Amount) -> Result<()> {
    let updated = conn.execute(
        "UPDATE protocol_state SET total_shielded = ?1, total_public = ?2 WHERE id = 1",
        params![total_shielded as i64, total_public as i64],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound("protocol state not initialized".into()));
    }
    Ok(())
}

/// Upsert one account's shielded deposit total.
pub fn set_shielded_balance(conn: &Connection, account: &AccountId, amount: Amount) -> Result<()> {
    conn.execute(
        "INSERT INTO shielded_balances (account, amount) VALUES (?1, ?2)
         ON CONFLICT(account) DO UPDATE SET amount = excluded.amount",
        params![account.as_slice(), amount as i64],
    )?;
    Ok(())
}

/// Load all per-account shielded deposit totals.
pub fn shielded_balances(conn: &Connection) -> Result<Vec<(AccountId, Amount)>> {
    let mut stmt = conn.prepare("SELECT account, amount FROM shielded_balances")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (account, amount) = row?;
        out.push((blob32(account)?, amount as u64));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTHORITY: AccountId = [0xAD; 32];
    const VAULT: AccountId = [0x7A; 32];

    #[test]
    fn test_insert_and_get() {
        let conn = crate::open_memory().expect("open");
        assert!(get(&conn).expect("get empty").is_none());

        insert(&conn, &AUTHORITY, &VAULT, 1_700_000_000).expect("insert");
        let row = get(&conn).expect("get").expect("state present");
        assert_eq!(row.authority, AUTHORITY);
        assert_eq!(row.vault, VAULT);
        assert_eq!(row.total_shielded, 0);
        assert_eq!(row.total_public, 0);
        assert_eq!(row.created_at, 1_700_000_000);
    }

    #[test]
    fn test_second_insert_rejected() {
        let conn = crate::open_memory().expect("open");
        insert(&conn, &AUTHORITY, &VAULT, 1).expect("first insert");
        insert(&conn, &AUTHORITY, &VAULT, 2).expect_err("second insert should fail");
    }

    #[test]
    fn test_update_totals() {
        let conn = crate::open_memory().expect("open");
        insert(&conn, &AUTHORITY, &VAULT, 1).expect("insert");
        update_totals(&conn, 500, 120).expect("update");

        let row = get(&conn).expect("get").expect("state present");
        assert_eq!(row.total_shielded, 500);
        assert_eq!(row.total_public, 120);
    }

    #[test]
    fn test_update_totals_requires_state() {
        let conn = crate::open_memory().expect("open");
        let err = update_totals(&conn, 1, 0).expect_err("no state row");
        assert!(matches!(err, DbError::NotFound(_)));
    }

    #[test]
    fn test_shielded_balances() {
        let conn = crate::open_memory().expect("open");
        let alice: AccountId = [0x01; 32];
        let bob: AccountId = [0x02; 32];

        set_shielded_balance(&conn, &alice, 100).expect("set alice");
        set_shielded_balance(&conn, &bob, 30).expect("set bob");
        set_shielded_balance(&conn, &alice, 70).expect("overwrite alice");

        let mut all = shielded_balances(&conn).expect("load");
        all.sort();
        assert_eq!(all, vec![(alice, 70), (bob, 30)]);
    }
}
