//! Custodial ledger account queries.

use crate::Result;
use crate::queries::blob32;
use rusqlite::{Connection, params};
use velum_types::{AccountId, Amount};

/// One ledger account row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRow {
    pub account: AccountId,
    pub owner: AccountId,
    pub balance: Amount,
}

/// Insert or update a ledger account.
pub fn upsert(
    conn: &Connection,
    account: &AccountId,
    owner: &AccountId,
    balance: Amount,
) -> Result<()> {
    conn.execute(
        "INSERT INTO accounts (account, owner, balance) VALUES (?1, ?2, ?3)
         ON CONFLICT(account) DO UPDATE SET owner = excluded.owner, balance = excluded.balance",
        params![account.as_slice(), owner.as_slice(), balance as i64],
    )?;
    Ok(())
}

/// Read one account's balance, zero if the account is unknown.
pub fn get_balance(conn: &Connection, account: &AccountId) -> Result<Amount> {
    let balance: i64 = conn.query_row(
        "SELECT COALESCE((SELECT balance FROM accounts WHERE account = ?1), 0)",
        params![account.as_slice()],
        |row| row.get(0),
    )?;
    Ok(balance as u64)
}

/// Load all ledger accounts.
pub fn all(conn: &Connection) -> Result<Vec<AccountRow>> {
    let mut stmt = conn.prepare("SELECT account, owner, balance FROM accounts")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, Vec<u8>>(0)?,
            row.get::<_, Vec<u8>>(1)?,
            row.get::<_, i64>(2)?,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (account, owner, balance) = row?;
        out.push(AccountRow {
            account: blob32(account)?,
            owner: blob32(owner)?,
            balance: balance as u64,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: AccountId = [0x01; 32];
    const BOB: AccountId = [0x02; 32];

    #[test]
    fn test_upsert_and_get_balance() {
        let conn = crate::open_memory().expect("open");
        assert_eq!(get_balance(&conn, &ALICE).expect("get unknown"), 0);

        upsert(&conn, &ALICE, &ALICE, 1_000).expect("insert");
        assert_eq!(get_balance(&conn, &ALICE).expect("get"), 1_000);

        upsert(&conn, &ALICE, &ALICE, 750).expect("update");
        assert_eq!(get_balance(&conn, &ALICE).expect("get updated"), 750);
    }

    #[test]
    fn test_all_accounts() {
        let conn = crate::open_memory().expect("open");
        upsert(&conn, &ALICE, &ALICE, 100).expect("insert alice");
        upsert(&conn, &BOB, &ALICE, 50).expect("insert bob owned by alice");

        let mut all_rows = all(&conn).expect("load");
        all_rows.sort_by_key(|row| row.account);
        assert_eq!(all_rows.len(), 2);
        assert_eq!(all_rows[0].account, ALICE);
        assert_eq!(all_rows[0].owner, ALICE);
        assert_eq!(all_rows[0].balance, 100);
        assert_eq!(all_rows[1].account, BOB);
        assert_eq!(all_rows[1].owner, ALICE);
        assert_eq!(all_rows[1].balance, 50);
    }
}
