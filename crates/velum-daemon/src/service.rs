//! Pool service: the engine plus its durability.
//!
//! Wraps a [`PoolEngine`] and the SQLite connection behind one seam. Each
//! operation runs on the engine first; on success its receipt is applied
//! to the database inside a single transaction, then the matching
//! [`PoolEvent`] is broadcast. A failed durability write halts the pool:
//! serving operations whose outcomes would not survive a restart is worse
//! than stopping.

use rusqlite::Connection;
use velum_db::queries;
use velum_pool::{
    InMemoryLedger, InitializeReceipt, Ledger, LedgerError, PoolEngine, PoolError, ProtocolState,
    ShieldReceipt, TransferReceipt, UnshieldReceipt,
};
use velum_types::events::PoolEvent;
use velum_types::{AccountId, Amount, Commitment, Nullifier};
use velum_verifier::{AcceptAllVerifier, Groth16Verifier, ProofVerifier, StubVerifier};

use crate::config::PoolConfig;
use crate::events::EventBus;

/// Service error types.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("persistence error: {0}")]
    Db(#[from] velum_db::DbError),

    #[error("corrupt snapshot: {0}")]
    Snapshot(String),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Construct the configured verifier backend.
pub fn build_verifier(pool: &PoolConfig) -> anyhow::Result<Box<dyn ProofVerifier>> {
    match pool.verifier.as_str() {
        "stub" => Ok(Box::new(StubVerifier)),
        "accept-all" => {
            tracing::warn!("accept-all verifier configured; every proof will pass");
            Ok(Box::new(AcceptAllVerifier))
        }
        "groth16" => {
            if pool.verifying_key_file.is_empty() {
                anyhow::bail!("verifier \"groth16\" requires pool.verifying_key_file");
            }
            let bytes = std::fs::read(&pool.verifying_key_file)?;
            Ok(Box::new(Groth16Verifier::new(bytes)))
        }
        other => anyhow::bail!("unknown verifier backend: {other}"),
    }
}

/// Snapshot of the pool for status reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStatus {
    pub initialized: bool,
    pub halted: Option<String>,
    pub authority: Option<AccountId>,
    pub vault: Option<AccountId>,
    pub total_shielded: Amount,
    pub total_public: Amount,
    pub commitment_count: u64,
    pub nullifier_count: u64,
    pub vault_balance: Amount,
}

/// The engine, its database, and the event bus.
pub struct PoolService {
    engine: PoolEngine<Box<dyn ProofVerifier>, InMemoryLedger>,
    db: Connection,
    event_bus: EventBus,
}

impl PoolService {
    /// Rebuild the service from the database.
    ///
    /// A database without a protocol state row starts an uninitialized
    /// engine; persisted custodial balances survive either way.
    pub fn restore(
        verifier: Box<dyn ProofVerifier>,
        db: Connection,
        event_bus: EventBus,
    ) -> Result<Self> {
        let mut ledger = InMemoryLedger::default();
        for row in queries::accounts::all(&db)? {
            ledger
                .register(&row.account, &row.owner)
                .map_err(snapshot_err)?;
            ledger.credit(&row.account, row.balance).map_err(snapshot_err)?;
        }

        let shielded = queries::state::shielded_balances(&db)?;
        let engine = match queries::state::get(&db)? {
            Some(row) => {
                let state = ProtocolState {
                    authority: row.authority,
                    vault: row.vault,
                    total_shielded: row.total_shielded,
                    total_public: row.total_public,
                };
                let commitments = queries::pool::all_commitments(&db)?;
                let nullifiers = queries::pool::all_nullifiers(&db)?;
                PoolEngine::restore(verifier, ledger, state, commitments, nullifiers, shielded)
            }
            None => {
                if !shielded.is_empty() {
                    tracing::warn!("shielded balances present without protocol state; ignored");
                }
                PoolEngine::new(verifier, ledger)
            }
        };

        let service = Self {
            engine,
            db,
            event_bus,
        };
        if let Some(reason) = service.engine.halted() {
            tracing::error!(%reason, "pool restored in halted state");
        }
        Ok(service)
    }

    /// Initialize the pool under an authority.
    pub fn initialize(&mut self, authority: &AccountId) -> Result<InitializeReceipt> {
        let halted_before = self.engine.halted().is_some();
        let result = self.engine.initialize(authority);
        let receipt = self.note_halt(halted_before, result)?;

        let stamp = unix_now();
        let vault_row = self.account_row(&receipt.vault);
        let r = receipt.clone();
        self.persist(move |conn| {
            queries::state::insert(conn, &r.authority, &r.vault, stamp)?;
            queries::accounts::upsert(conn, &vault_row.0, &vault_row.1, vault_row.2)?;
            Ok(())
        })?;

        self.event_bus.emit(PoolEvent::Initialized {
            authority: receipt.authority,
            timestamp: stamp,
        });
        Ok(receipt)
    }

    /// Shield a deposit into the pool.
    pub fn shield(
        &mut self,
        caller: &AccountId,
        amount: Amount,
        commitment: Commitment,
    ) -> Result<ShieldReceipt> {
        let halted_before = self.engine.halted().is_some();
        let result = self.engine.shield(caller, amount, commitment);
        let receipt = self.note_halt(halted_before, result)?;

        let stamp = unix_now();
        let (total_shielded, total_public) = self.totals()?;
        let caller_row = self.account_row(caller);
        let vault_row = self.vault_row()?;
        let caller_id = *caller;
        let r = receipt.clone();
        self.persist(move |conn| {
            queries::pool::insert_commitment(conn, &r.commitment, r.leaf_index, stamp)?;
            queries::state::update_totals(conn, total_shielded, total_public)?;
            queries::state::set_shielded_balance(conn, &caller_id, r.caller_shielded)?;
            queries::accounts::upsert(conn, &caller_row.0, &caller_row.1, caller_row.2)?;
            queries::accounts::upsert(conn, &vault_row.0, &vault_row.1, vault_row.2)?;
            Ok(())
        })?;

        self.event_bus.emit(PoolEvent::Shielded {
            commitment: receipt.commitment,
            amount: receipt.amount,
            leaf_index: receipt.leaf_index,
            total_shielded: receipt.total_shielded,
            timestamp: stamp,
        });
        Ok(receipt)
    }

    /// Unshield a note back to the caller's public balance.
    pub fn unshield(
        &mut self,
        caller: &AccountId,
        amount: Amount,
        nullifier: Nullifier,
        proof: &[u8],
        public_inputs: &[u8],
    ) -> Result<UnshieldReceipt> {
        let halted_before = self.engine.halted().is_some();
        let result = self
            .engine
            .unshield(caller, amount, nullifier, proof, public_inputs);
        let receipt = self.note_halt(halted_before, result)?;

        let stamp = unix_now();
        let caller_row = self.account_row(caller);
        let vault_row = self.vault_row()?;
        let caller_id = *caller;
        let r = receipt.clone();
        self.persist(move |conn| {
            queries::pool::insert_nullifier(conn, &r.nullifier, stamp)?;
            queries::state::update_totals(conn, r.total_shielded, r.total_public)?;
            queries::state::set_shielded_balance(conn, &caller_id, r.caller_shielded)?;
            queries::accounts::upsert(conn, &caller_row.0, &caller_row.1, caller_row.2)?;
            queries::accounts::upsert(conn, &vault_row.0, &vault_row.1, vault_row.2)?;
            Ok(())
        })?;

        self.event_bus.emit(PoolEvent::Unshielded {
            nullifier: receipt.nullifier,
            amount: receipt.amount,
            recipient: receipt.caller,
            total_shielded: receipt.total_shielded,
            timestamp: stamp,
        });
        Ok(receipt)
    }

    /// Spend a note into a fresh commitment without leaving the pool.
    pub fn private_transfer(
        &mut self,
        old_nullifier: Nullifier,
        new_commitment: Commitment,
        proof: &[u8],
        public_inputs: &[u8],
    ) -> Result<TransferReceipt> {
        let halted_before = self.engine.halted().is_some();
        let result = self
            .engine
            .private_transfer(old_nullifier, new_commitment, proof, public_inputs);
        let receipt = self.note_halt(halted_before, result)?;

        let stamp = unix_now();
        let (total_shielded, total_public) = self.totals()?;
        let r = receipt.clone();
        self.persist(move |conn| {
            queries::pool::insert_nullifier(conn, &r.old_nullifier, stamp)?;
            queries::pool::insert_commitment(conn, &r.new_commitment, r.leaf_index, stamp)?;
            queries::state::update_totals(conn, total_shielded, total_public)?;
            Ok(())
        })?;

        self.event_bus.emit(PoolEvent::Transferred {
            old_nullifier: receipt.old_nullifier,
            new_commitment: receipt.new_commitment,
            total_shielded: receipt.total_shielded,
            timestamp: stamp,
        });
        Ok(receipt)
    }

    /// Credit a public account (faucet). Returns the new balance.
    pub fn credit(&mut self, account: &AccountId, amount: Amount) -> Result<Amount> {
        self.engine.ledger_mut().credit(account, amount)?;
        let row = self.account_row(account);
        self.persist(move |conn| queries::accounts::upsert(conn, &row.0, &row.1, row.2))?;
        Ok(row.2)
    }

    /// One account's public custodial balance.
    pub fn balance(&self, account: &AccountId) -> Amount {
        self.engine.ledger().balance(account)
    }

    /// One account's shielded bookkeeping balance.
    pub fn shielded_balance(&self, account: &AccountId) -> Amount {
        self.engine.shielded_balance(account)
    }

    /// Why the pool halted, if it did.
    pub fn halted(&self) -> Option<&str> {
        self.engine.halted()
    }

    /// Status snapshot for operators.
    pub fn status(&self) -> PoolStatus {
        let state = self.engine.state();
        PoolStatus {
            initialized: state.is_some(),
            halted: self.engine.halted().map(str::to_string),
            authority: state.map(|s| s.authority),
            vault: state.map(|s| s.vault),
            total_shielded: state.map(|s| s.total_shielded).unwrap_or(0),
            total_public: state.map(|s| s.total_public).unwrap_or(0),
            commitment_count: self.engine.pool().commitment_count(),
            nullifier_count: self.engine.pool().nullifier_count(),
            vault_balance: state
                .map(|s| self.engine.ledger().balance(&s.vault))
                .unwrap_or(0),
        }
    }

    /// Apply one receipt's rows inside a single transaction.
    ///
    /// A write failure leaves memory and disk divergent, so the pool halts
    /// before the error is returned.
    fn persist<F>(&mut self, write: F) -> Result<()>
    where
        F: FnOnce(&Connection) -> velum_db::Result<()>,
    {
        let result = (|| -> velum_db::Result<()> {
            let tx = self.db.transaction()?;
            write(&tx)?;
            tx.commit()?;
            Ok(())
        })();

        if let Err(e) = result {
            tracing::error!(error = %e, "durability write failed after an applied operation");
            let reason = format!("durability write failed: {e}");
            self.engine.halt_with(reason.clone());
            self.event_bus.emit(PoolEvent::Halted {
                reason,
                timestamp: unix_now(),
            });
            return Err(e.into());
        }
        Ok(())
    }

    /// Emit a `Halted` event when an operation just halted the engine.
    fn note_halt<T>(&self, halted_before: bool, result: velum_pool::Result<T>) -> Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                if !halted_before {
                    if let Some(reason) = self.engine.halted() {
                        self.event_bus.emit(PoolEvent::Halted {
                            reason: reason.to_string(),
                            timestamp: unix_now(),
                        });
                    }
                }
                Err(e.into())
            }
        }
    }

    fn totals(&self) -> Result<(Amount, Amount)> {
        let state = self.engine.state().ok_or(PoolError::NotInitialized)?;
        Ok((state.total_shielded, state.total_public))
    }

    fn vault_row(&self) -> Result<(AccountId, AccountId, Amount)> {
        let state = self.engine.state().ok_or(PoolError::NotInitialized)?;
        Ok(self.account_row(&state.vault))
    }

    fn account_row(&self, account: &AccountId) -> (AccountId, AccountId, Amount) {
        let ledger = self.engine.ledger();
        let owner = ledger.owner(account).copied().unwrap_or(*account);
        (*account, owner, ledger.balance(account))
    }
}

fn snapshot_err(err: LedgerError) -> ServiceError {
    ServiceError::Snapshot(format!("rebuilding custodian: {err}"))
}
