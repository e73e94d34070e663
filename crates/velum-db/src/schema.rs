//! SQL schema definitions.
//!
//! Each constant is a complete `CREATE TABLE` batch for one schema
//! version. Migrations in [`crate::migrations`] apply the batches in
//! order; existing tables are never altered in place.

/// Schema version 1: initial schema.
pub const SCHEMA_V1: &str = "
-- Singleton protocol state. The CHECK keeps the table to one row.
CREATE TABLE protocol_state (
    id              INTEGER PRIMARY KEY CHECK (id = 1),
    authority       BLOB NOT NULL,
    vault           BLOB NOT NULL,
    total_shielded  INTEGER NOT NULL DEFAULT 0,
    total_public    INTEGER NOT NULL DEFAULT 0,
    created_at      INTEGER NOT NULL
);

-- Append-only commitment set. leaf_index is the insertion position.
CREATE TABLE commitments (
    commitment  BLOB PRIMARY KEY,
    leaf_index  INTEGER NOT NULL UNIQUE,
    created_at  INTEGER NOT NULL
);

-- Spent-nullifier set. A nullifier present here is spent forever.
CREATE TABLE nullifiers (
    nullifier  BLOB PRIMARY KEY,
    spent_at   INTEGER NOT NULL
);

-- Custodial ledger accounts, including the vault.
CREATE TABLE accounts (
    account  BLOB PRIMARY KEY,
    owner    BLOB NOT NULL,
    balance  INTEGER NOT NULL DEFAULT 0
);

-- Per-account shielded deposit totals (diagnostic).
CREATE TABLE shielded_balances (
    account  BLOB PRIMARY KEY,
    amount   INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX idx_commitments_leaf ON commitments(leaf_index);
";
