//! The four pool operations.
//!
//! Every operation is a single atomic state transition on an exclusively
//! borrowed engine: all fallible checks run before the first mutation, so
//! any error path leaves state untouched. Exclusive access (`&mut self`)
//! is the single-writer serialization boundary; operations never suspend,
//! and callers sharing an engine across tasks wrap it in a mutex.
//!
//! After every mutating operation the engine re-checks that the custodial
//! vault balance equals the recorded shielded total. A mismatch is not a
//! recoverable error: the pool halts, and every subsequent call fails with
//! [`PoolError::Halted`].

use std::collections::HashMap;

use velum_types::{AccountId, Amount, Commitment, LeafIndex, Nullifier};
use velum_verifier::{ProofVerifier, Statement};

use crate::ledger::{Ledger, LedgerError};
use crate::pool::PrivacyPool;
use crate::state::ProtocolState;
use crate::{PoolError, Result};

/// Outcome of a successful initialize.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitializeReceipt {
    /// Authority that owns the deployment.
    pub authority: AccountId,
    /// Derived custodial vault account.
    pub vault: AccountId,
}

/// Outcome of a successful shield.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShieldReceipt {
    /// Account that deposited the funds.
    pub caller: AccountId,
    /// Commitment appended to the pool.
    pub commitment: Commitment,
    /// Amount moved into the vault.
    pub amount: Amount,
    /// Leaf index assigned to the commitment.
    pub leaf_index: LeafIndex,
    /// Shielded total after the operation.
    pub total_shielded: Amount,
    /// Caller's shielded bookkeeping balance after the operation.
    pub caller_shielded: Amount,
}

/// Outcome of a successful unshield.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnshieldReceipt {
    /// Account that received the funds.
    pub caller: AccountId,
    /// Nullifier recorded as spent.
    pub nullifier: Nullifier,
    /// Amount released from the vault.
    pub amount: Amount,
    /// Shielded total after the operation.
    pub total_shielded: Amount,
    /// Cumulative unshielded counter after the operation.
    pub total_public: Amount,
    /// Caller's shielded bookkeeping balance after the operation.
    pub caller_shielded: Amount,
}

/// Outcome of a successful private transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferReceipt {
    /// Nullifier of the consumed note.
    pub old_nullifier: Nullifier,
    /// Commitment of the produced note.
    pub new_commitment: Commitment,
    /// Leaf index assigned to the new commitment.
    pub leaf_index: LeafIndex,
    /// Shielded total after the operation (unchanged by construction,
    /// verified explicitly).
    pub total_shielded: Amount,
}

/// The pool engine: protocol state, membership sets, and the injected
/// verifier and custodian collaborators.
///
/// Created uninitialized by [`PoolEngine::new`]; the first operation must
/// be [`PoolEngine::initialize`]. Restarted deployments rebuild the engine
/// from persisted state with [`PoolEngine::restore`].
pub struct PoolEngine<V, L> {
    verifier: V,
    ledger: L,
    state: Option<ProtocolState>,
    pool: PrivacyPool,
    shielded_by_account: HashMap<AccountId, Amount>,
    halted: Option<String>,
}

impl<V: ProofVerifier, L: Ledger> PoolEngine<V, L> {
    /// Create an uninitialized engine around a verifier and a custodian.
    pub fn new(verifier: V, ledger: L) -> Self {
        Self {
            verifier,
            ledger,
            state: None,
            pool: PrivacyPool::new(),
            shielded_by_account: HashMap::new(),
            halted: None,
        }
    }

    /// Rebuild an engine from persisted state.
    ///
    /// The snapshot is cross-checked: the vault id must re-derive from the
    /// authority, the membership sets must be duplicate-free, and the
    /// custodian's vault balance must equal the recorded shielded total.
    /// Any anomaly starts the engine halted rather than silently serving
    /// operations on corrupt state.
    pub fn restore(
        verifier: V,
        ledger: L,
        state: ProtocolState,
        commitments: Vec<Commitment>,
        nullifiers: Vec<Nullifier>,
        shielded_balances: Vec<(AccountId, Amount)>,
    ) -> Self {
        let mut engine = Self::new(verifier, ledger);

        if velum_crypto::note::derive_vault_account(&state.authority) != state.vault {
            tracing::error!("restore: persisted vault id does not re-derive from the authority");
            engine.halted = Some("persisted vault id does not match the authority".to_string());
        }

        match PrivacyPool::restore(commitments, nullifiers) {
            Ok(pool) => engine.pool = pool,
            Err(e) => {
                tracing::error!(error = %e, "restore: corrupt persisted membership sets");
                engine
                    .halted
                    .get_or_insert_with(|| format!("corrupt persisted membership sets: {e}"));
            }
        }

        // The vault row may already exist in the restored custodian.
        match engine.ledger.register(&state.vault, &state.authority) {
            Ok(()) | Err(LedgerError::AccountExists) => {}
            Err(e) => {
                tracing::error!(error = %e, "restore: vault registration failed");
                engine
                    .halted
                    .get_or_insert_with(|| format!("vault registration failed: {e}"));
            }
        }

        let vault_balance = engine.ledger.balance(&state.vault);
        if engine.halted.is_none() && vault_balance != state.total_shielded {
            tracing::error!(
                vault_balance,
                total_shielded = state.total_shielded,
                "restore: vault balance does not match the shielded total"
            );
            engine.halted = Some(format!(
                "vault balance {vault_balance} does not match shielded total {}",
                state.total_shielded
            ));
        }

        engine.shielded_by_account = shielded_balances.into_iter().collect();
        engine.state = Some(state);
        engine
    }

    /// Create protocol state, an empty pool, and a zero-balance vault.
    ///
    /// # Errors
    ///
    /// - [`PoolError::AlreadyInitialized`] if state already exists
    pub fn initialize(&mut self, authority: &AccountId) -> Result<InitializeReceipt> {
        self.check_halted()?;
        if self.state.is_some() {
            return Err(PoolError::AlreadyInitialized);
        }

        let state = ProtocolState::new(*authority);
        let vault = state.vault;
        match self.ledger.register(&vault, authority) {
            Ok(()) => {}
            Err(LedgerError::AccountExists) => return Err(PoolError::AlreadyInitialized),
            Err(e) => return Err(map_ledger(e)),
        }
        self.state = Some(state);

        tracing::debug!(
            authority = %hex::encode(authority),
            vault = %hex::encode(vault),
            "pool initialized"
        );

        Ok(InitializeReceipt {
            authority: *authority,
            vault,
        })
    }

    /// Shield: move `amount` of the caller's public balance into the vault
    /// and append `commitment` to the pool.
    ///
    /// The collision check precedes any fund movement, and the custodian
    /// transfer precedes the set insert, so a rejected deposit leaves both
    /// sides untouched.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidAmount`] if `amount` is zero
    /// - [`PoolError::CommitmentAlreadyExists`] if `commitment` is a member
    /// - [`PoolError::ArithmeticOverflow`] if a total would overflow
    /// - [`PoolError::InsufficientFunds`] if the caller cannot fund it
    pub fn shield(
        &mut self,
        caller: &AccountId,
        amount: Amount,
        commitment: Commitment,
    ) -> Result<ShieldReceipt> {
        self.check_halted()?;
        let state = self.state.as_mut().ok_or(PoolError::NotInitialized)?;

        if amount == 0 {
            return Err(PoolError::InvalidAmount);
        }
        if self.pool.has_commitment(&commitment) {
            return Err(PoolError::CommitmentAlreadyExists);
        }
        let new_total = state
            .total_shielded
            .checked_add(amount)
            .ok_or(PoolError::ArithmeticOverflow)?;
        let caller_shielded = self
            .shielded_by_account
            .get(caller)
            .copied()
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or(PoolError::ArithmeticOverflow)?;
        let vault = state.vault;

        self.ledger
            .transfer(caller, caller, &vault, amount)
            .map_err(map_ledger)?;

        // Commit. The insert cannot collide: membership was checked above
        // and the engine is exclusively borrowed.
        let leaf_index = self.pool.insert_commitment(commitment)?;
        state.total_shielded = new_total;
        self.shielded_by_account.insert(*caller, caller_shielded);

        let vault_balance = self.ledger.balance(&vault);
        if vault_balance != new_total {
            return Err(self.halt(format!(
                "conservation violated after shield: vault {vault_balance}, shielded total {new_total}"
            )));
        }

        tracing::debug!(
            amount,
            leaf_index,
            total_shielded = new_total,
            commitment = %hex::encode(commitment),
            "shielded"
        );

        Ok(ShieldReceipt {
            caller: *caller,
            commitment,
            amount,
            leaf_index,
            total_shielded: new_total,
            caller_shielded,
        })
    }

    /// Unshield: record `nullifier` as spent and release `amount` from the
    /// vault to the caller.
    ///
    /// The proof's public statement must bind this exact call: nullifier,
    /// amount, and the caller as recipient. Verifier acceptance alone is
    /// never sufficient. The nullifier insert is ordered before the fund
    /// release, so funds can never leave the vault with the spend
    /// unrecorded.
    ///
    /// # Errors
    ///
    /// - [`PoolError::DoubleSpend`] if `nullifier` was already revealed
    /// - [`PoolError::InvalidProof`] on statement mismatch or rejection
    /// - [`PoolError::ArithmeticOverflow`] if `amount` exceeds the total
    /// - [`PoolError::VaultInsufficientBalance`] if the backing is broken;
    ///   fatal, the pool halts
    pub fn unshield(
        &mut self,
        caller: &AccountId,
        amount: Amount,
        nullifier: Nullifier,
        proof: &[u8],
        public_inputs: &[u8],
    ) -> Result<UnshieldReceipt> {
        self.check_halted()?;
        let (total_shielded, total_public, vault, authority) = {
            let state = self.state.as_ref().ok_or(PoolError::NotInitialized)?;
            (
                state.total_shielded,
                state.total_public,
                state.vault,
                state.authority,
            )
        };

        if self.pool.is_spent(&nullifier) {
            return Err(PoolError::DoubleSpend);
        }

        let statement = match Statement::decode(public_inputs) {
            Ok(Statement::Unshield(s)) => s,
            Ok(Statement::Transfer(_)) => {
                return Err(PoolError::InvalidProof(
                    "statement is not an unshield statement".to_string(),
                ))
            }
            Err(e) => {
                return Err(PoolError::InvalidProof(format!(
                    "malformed public inputs: {e}"
                )))
            }
        };
        if statement.nullifier != nullifier {
            return Err(PoolError::InvalidProof(
                "statement nullifier does not match the call".to_string(),
            ));
        }
        if statement.amount != amount {
            return Err(PoolError::InvalidProof(
                "statement amount does not match the call".to_string(),
            ));
        }
        if statement.recipient != *caller {
            return Err(PoolError::InvalidProof(
                "statement recipient does not match the caller".to_string(),
            ));
        }
        if !self.verifier.verify(proof, public_inputs) {
            return Err(PoolError::InvalidProof(
                "verifier rejected the proof".to_string(),
            ));
        }

        let new_total = total_shielded
            .checked_sub(amount)
            .ok_or(PoolError::ArithmeticOverflow)?;
        let new_public = total_public
            .checked_add(amount)
            .ok_or(PoolError::ArithmeticOverflow)?;

        // The accounting says the vault can cover this. If it cannot, the
        // 1:1 backing is already broken somewhere else.
        let vault_balance = self.ledger.balance(&vault);
        if vault_balance < amount {
            let err = PoolError::VaultInsufficientBalance {
                vault_balance,
                required: amount,
            };
            tracing::error!(
                vault_balance,
                required = amount,
                total_shielded,
                "vault cannot cover unshield; pool halted"
            );
            self.halted = Some(err.to_string());
            return Err(err);
        }

        self.pool.insert_nullifier(nullifier)?;
        if let Err(e) = self.ledger.transfer(&authority, &vault, caller, amount) {
            // The nullifier is recorded but no funds moved. Nothing can be
            // unwound from here.
            return Err(self.halt(format!(
                "vault release failed after nullifier insert: {e}"
            )));
        }
        if let Some(state) = self.state.as_mut() {
            state.total_shielded = new_total;
            state.total_public = new_public;
        }
        let caller_shielded = match self.shielded_by_account.get_mut(caller) {
            Some(balance) => {
                *balance = balance.saturating_sub(amount);
                *balance
            }
            None => 0,
        };

        let vault_balance = self.ledger.balance(&vault);
        if vault_balance != new_total {
            return Err(self.halt(format!(
                "conservation violated after unshield: vault {vault_balance}, shielded total {new_total}"
            )));
        }

        tracing::debug!(
            amount,
            total_shielded = new_total,
            total_public = new_public,
            nullifier = %hex::encode(nullifier),
            "unshielded"
        );

        Ok(UnshieldReceipt {
            caller: *caller,
            nullifier,
            amount,
            total_shielded: new_total,
            total_public: new_public,
            caller_shielded,
        })
    }

    /// Private transfer: consume the note behind `old_nullifier` and
    /// create `new_commitment`, value-preserving and without custodian
    /// interaction.
    ///
    /// The shielded total is captured before and compared after the
    /// inserts; a change halts the pool.
    ///
    /// # Errors
    ///
    /// - [`PoolError::DoubleSpend`] if `old_nullifier` was already revealed
    /// - [`PoolError::CommitmentAlreadyExists`] if `new_commitment` exists
    /// - [`PoolError::InvalidProof`] on statement mismatch or rejection
    pub fn private_transfer(
        &mut self,
        old_nullifier: Nullifier,
        new_commitment: Commitment,
        proof: &[u8],
        public_inputs: &[u8],
    ) -> Result<TransferReceipt> {
        self.check_halted()?;
        let (total_before, vault) = {
            let state = self.state.as_ref().ok_or(PoolError::NotInitialized)?;
            (state.total_shielded, state.vault)
        };

        if self.pool.is_spent(&old_nullifier) {
            return Err(PoolError::DoubleSpend);
        }
        if self.pool.has_commitment(&new_commitment) {
            return Err(PoolError::CommitmentAlreadyExists);
        }

        let statement = match Statement::decode(public_inputs) {
            Ok(Statement::Transfer(s)) => s,
            Ok(Statement::Unshield(_)) => {
                return Err(PoolError::InvalidProof(
                    "statement is not a transfer statement".to_string(),
                ))
            }
            Err(e) => {
                return Err(PoolError::InvalidProof(format!(
                    "malformed public inputs: {e}"
                )))
            }
        };
        if statement.old_nullifier != old_nullifier {
            return Err(PoolError::InvalidProof(
                "statement nullifier does not match the call".to_string(),
            ));
        }
        if statement.new_commitment != new_commitment {
            return Err(PoolError::InvalidProof(
                "statement commitment does not match the call".to_string(),
            ));
        }
        if !self.verifier.verify(proof, public_inputs) {
            return Err(PoolError::InvalidProof(
                "verifier rejected the proof".to_string(),
            ));
        }

        // Both inserts were pre-checked; the consumed note is now Spent
        // and the produced note Created.
        self.pool.insert_nullifier(old_nullifier)?;
        let leaf_index = self.pool.insert_commitment(new_commitment)?;

        // The shielded total must not have moved. Checked, not assumed.
        let total_after = {
            let state = self.state.as_ref().ok_or(PoolError::NotInitialized)?;
            state.total_shielded
        };
        if total_after != total_before {
            return Err(self.halt(format!(
                "shielded total moved during private transfer: {total_before} to {total_after}"
            )));
        }
        let vault_balance = self.ledger.balance(&vault);
        if vault_balance != total_after {
            return Err(self.halt(format!(
                "conservation violated after private transfer: vault {vault_balance}, shielded total {total_after}"
            )));
        }

        tracing::debug!(
            leaf_index,
            old_nullifier = %hex::encode(old_nullifier),
            new_commitment = %hex::encode(new_commitment),
            "privately transferred"
        );

        Ok(TransferReceipt {
            old_nullifier,
            new_commitment,
            leaf_index,
            total_shielded: total_after,
        })
    }

    /// Protocol state, if initialized.
    pub fn state(&self) -> Option<&ProtocolState> {
        self.state.as_ref()
    }

    /// Whether initialize has run.
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// The membership sets.
    pub fn pool(&self) -> &PrivacyPool {
        &self.pool
    }

    /// The custodian.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Mutable custodian access, for faucet-style seeding.
    ///
    /// Mutating custodial balances directly can break the backing
    /// invariant; the engine detects that on the next operation and halts.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    /// Why the pool halted, if it did.
    pub fn halted(&self) -> Option<&str> {
        self.halted.as_deref()
    }

    /// Halt the pool from outside the engine.
    ///
    /// For supervising callers that detect a failure the engine cannot
    /// see, such as a failed durability write after an applied operation.
    pub fn halt_with(&mut self, reason: impl Into<String>) {
        let _ = self.halt(reason.into());
    }

    /// Per-account shielded bookkeeping balance.
    pub fn shielded_balance(&self, account: &AccountId) -> Amount {
        self.shielded_by_account.get(account).copied().unwrap_or(0)
    }

    /// Iterate the per-account shielded bookkeeping map.
    pub fn shielded_balances(&self) -> impl Iterator<Item = (&AccountId, Amount)> {
        self.shielded_by_account
            .iter()
            .map(|(account, amount)| (account, *amount))
    }

    fn check_halted(&self) -> Result<()> {
        match &self.halted {
            Some(reason) => Err(PoolError::Halted {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn halt(&mut self, reason: String) -> PoolError {
        tracing::error!(%reason, "pool halted on invariant violation");
        self.halted = Some(reason.clone());
        PoolError::Halted { reason }
    }
}

fn map_ledger(err: LedgerError) -> PoolError {
    match err {
        LedgerError::InsufficientFunds {
            available,
            required,
        } => PoolError::InsufficientFunds {
            available,
            required,
        },
        LedgerError::Unauthorized => PoolError::Unauthorized,
        LedgerError::Overflow => PoolError::ArithmeticOverflow,
        // Only reachable when the vault id is already registered.
        LedgerError::AccountExists => PoolError::AlreadyInitialized,
    }
}
