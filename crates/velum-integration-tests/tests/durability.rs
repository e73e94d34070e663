//! Restart durability integration test.
//!
//! Persists pool state to SQLite the way the daemon does, rebuilds the
//! engine from the database, and verifies the pool resumes exactly where
//! it stopped: balances intact, spent nullifiers still dead, and corrupt
//! snapshots refused.
//!
//! These tests use only the library crates (velum-crypto, velum-db,
//! velum-pool, velum-verifier) without requiring a running daemon process.

use rusqlite::{params, Connection};
use velum_crypto::note::NoteSecrets;
use velum_db::queries;
use velum_pool::{InMemoryLedger, Ledger, PoolEngine, PoolError, ProtocolState};
use velum_verifier::{StubVerifier, UnshieldStatement};

const TEST_TIMESTAMP: u64 = 1_700_000_000;
const AUTHORITY: [u8; 32] = [0xAD; 32];
const ALICE: [u8; 32] = [0x01; 32];
const SEED_BALANCE: u64 = 1_000;
const DEPOSIT: u64 = 400;

type Engine = PoolEngine<StubVerifier, InMemoryLedger>;

/// Write the engine's full state into the database, replacing nothing:
/// the tests run it once against a fresh connection, standing in for the
/// daemon's per-operation write-through.
fn checkpoint(conn: &Connection, engine: &Engine) {
    let state = engine
        .state()
        .expect("Only initialized engines are checkpointed");
    queries::state::insert(conn, &state.authority, &state.vault, TEST_TIMESTAMP)
        .expect("State insert should succeed");
    queries::state::update_totals(conn, state.total_shielded, state.total_public)
        .expect("Totals update should succeed");

    for (index, commitment) in engine.pool().commitment_log().iter().enumerate() {
        queries::pool::insert_commitment(conn, commitment, index as u64, TEST_TIMESTAMP)
            .expect("Commitment insert should succeed");
    }
    for nullifier in engine.pool().nullifiers() {
        queries::pool::insert_nullifier(conn, nullifier, TEST_TIMESTAMP)
            .expect("Nullifier insert should succeed");
    }
    for (account, owner, balance) in engine.ledger().snapshot() {
        queries::accounts::upsert(conn, &account, &owner, balance)
            .expect("Account upsert should succeed");
    }
    for (account, amount) in engine.shielded_balances() {
        queries::state::set_shielded_balance(conn, account, amount)
            .expect("Shielded balance upsert should succeed");
    }
}

/// Rebuild an engine from the database, the way the daemon does on boot.
fn restore(conn: &Connection) -> Engine {
    let row = queries::state::get(conn)
        .expect("State query should succeed")
        .expect("A checkpointed database should hold a state row");

    let mut ledger = InMemoryLedger::new();
    for account in queries::accounts::all(conn).expect("Account query should succeed") {
        ledger
            .register(&account.account, &account.owner)
            .expect("Account registration should succeed");
        ledger
            .credit(&account.account, account.balance)
            .expect("Account credit should succeed");
    }

    PoolEngine::restore(
        StubVerifier,
        ledger,
        ProtocolState {
            authority: row.authority,
            vault: row.vault,
            total_shielded: row.total_shielded,
            total_public: row.total_public,
        },
        queries::pool::all_commitments(conn).expect("Commitment query should succeed"),
        queries::pool::all_nullifiers(conn).expect("Nullifier query should succeed"),
        queries::state::shielded_balances(conn).expect("Shielded balance query should succeed"),
    )
}

#[tokio::test]
#[ignore]
async fn test_pool_survives_restart() {
    // =========================================================
    // Step 1: Run a shield on a live engine
    // =========================================================
    let mut engine = PoolEngine::new(StubVerifier, InMemoryLedger::new());
    engine
        .initialize(&AUTHORITY)
        .expect("Initialize should succeed on a fresh engine");
    engine
        .ledger_mut()
        .credit(&ALICE, SEED_BALANCE)
        .expect("Crediting the depositor should succeed");

    let note = NoteSecrets::random();
    let commitment = note.commitment(DEPOSIT);
    engine
        .shield(&ALICE, DEPOSIT, commitment)
        .expect("Shield should succeed with sufficient funds");
    let vault = engine
        .state()
        .expect("An initialized engine should have state")
        .vault;

    // =========================================================
    // Step 2: Persist and "restart"
    // =========================================================
    let conn = velum_db::open_memory().expect("Opening an in-memory database should succeed");
    checkpoint(&conn, &engine);
    drop(engine);

    let mut restored = restore(&conn);
    assert!(
        restored.halted().is_none(),
        "A consistent snapshot should restore a live engine"
    );

    // =========================================================
    // Step 3: The restored engine matches the persisted one
    // =========================================================
    let state = restored
        .state()
        .expect("The restored engine should be initialized");
    assert_eq!(state.authority, AUTHORITY);
    assert_eq!(state.vault, vault);
    assert_eq!(state.total_shielded, DEPOSIT);
    assert_eq!(restored.ledger().balance(&ALICE), SEED_BALANCE - DEPOSIT);
    assert_eq!(restored.ledger().balance(&vault), DEPOSIT);
    assert_eq!(restored.shielded_balance(&ALICE), DEPOSIT);
    assert!(restored.pool().has_commitment(&commitment));

    // =========================================================
    // Step 4: Operations continue on the restored engine
    // =========================================================
    let nullifier = note.nullifier(&commitment);
    let statement = UnshieldStatement {
        nullifier,
        recipient: ALICE,
        amount: DEPOSIT,
    }
    .encode();
    let proof = StubVerifier::prove(&statement);
    restored
        .unshield(&ALICE, DEPOSIT, nullifier, &proof, &statement)
        .expect("Unshielding a pre-restart note should succeed");
    assert_eq!(restored.ledger().balance(&ALICE), SEED_BALANCE);
}

#[tokio::test]
#[ignore]
async fn test_spent_nullifier_stays_dead_across_restart() {
    // =========================================================
    // Step 1: Shield and unshield on a live engine
    // =========================================================
    let mut engine = PoolEngine::new(StubVerifier, InMemoryLedger::new());
    engine
        .initialize(&AUTHORITY)
        .expect("Initialize should succeed on a fresh engine");
    engine
        .ledger_mut()
        .credit(&ALICE, SEED_BALANCE)
        .expect("Crediting the depositor should succeed");

    let note = NoteSecrets::random();
    let commitment = note.commitment(DEPOSIT);
    engine
        .shield(&ALICE, DEPOSIT, commitment)
        .expect("Shield should succeed with sufficient funds");

    let nullifier = note.nullifier(&commitment);
    let statement = UnshieldStatement {
        nullifier,
        recipient: ALICE,
        amount: DEPOSIT,
    }
    .encode();
    let proof = StubVerifier::prove(&statement);
    engine
        .unshield(&ALICE, DEPOSIT, nullifier, &proof, &statement)
        .expect("Unshield should succeed with a valid stub proof");

    // =========================================================
    // Step 2: Persist and "restart"
    // =========================================================
    let conn = velum_db::open_memory().expect("Opening an in-memory database should succeed");
    checkpoint(&conn, &engine);
    drop(engine);
    let mut restored = restore(&conn);

    // =========================================================
    // Step 3: Replays are still rejected
    // =========================================================
    let err = restored
        .unshield(&ALICE, DEPOSIT, nullifier, &proof, &statement)
        .expect_err("A pre-restart nullifier must stay spent after restart");
    assert!(matches!(err, PoolError::DoubleSpend));

    let err = restored
        .shield(&ALICE, DEPOSIT, commitment)
        .expect_err("A pre-restart commitment must stay a member after restart");
    assert!(matches!(err, PoolError::CommitmentAlreadyExists));
}

#[tokio::test]
#[ignore]
async fn test_tampered_vault_balance_refuses_service() {
    // =========================================================
    // Step 1: Persist a consistent pool
    // =========================================================
    let mut engine = PoolEngine::new(StubVerifier, InMemoryLedger::new());
    engine
        .initialize(&AUTHORITY)
        .expect("Initialize should succeed on a fresh engine");
    engine
        .ledger_mut()
        .credit(&ALICE, SEED_BALANCE)
        .expect("Crediting the depositor should succeed");

    let note = NoteSecrets::random();
    let commitment = note.commitment(DEPOSIT);
    engine
        .shield(&ALICE, DEPOSIT, commitment)
        .expect("Shield should succeed with sufficient funds");
    let vault = engine
        .state()
        .expect("An initialized engine should have state")
        .vault;

    let conn = velum_db::open_memory().expect("Opening an in-memory database should succeed");
    checkpoint(&conn, &engine);
    drop(engine);

    // =========================================================
    // Step 2: Corrupt the vault row behind the pool's back
    // =========================================================
    conn.execute(
        "UPDATE accounts SET balance = ?1 WHERE account = ?2",
        params![1_i64, vault.as_slice()],
    )
    .expect("Tampering with the vault row should succeed");

    // =========================================================
    // Step 3: The restored engine is halted and refuses work
    // =========================================================
    let mut restored = restore(&conn);
    let reason = restored
        .halted()
        .expect("A vault/total mismatch must restore a halted engine")
        .to_string();
    assert!(
        reason.contains("does not match"),
        "The halt reason should name the mismatch, got: {reason}"
    );

    let err = restored
        .shield(&ALICE, DEPOSIT, NoteSecrets::random().commitment(DEPOSIT))
        .expect_err("A halted pool must reject deposits");
    assert!(matches!(err, PoolError::Halted { .. }));

    let nullifier = note.nullifier(&commitment);
    let statement = UnshieldStatement {
        nullifier,
        recipient: ALICE,
        amount: DEPOSIT,
    }
    .encode();
    let proof = StubVerifier::prove(&statement);
    let err = restored
        .unshield(&ALICE, DEPOSIT, nullifier, &proof, &statement)
        .expect_err("A halted pool must reject withdrawals");
    assert!(matches!(err, PoolError::Halted { .. }));
}
