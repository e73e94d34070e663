//! # velum-pool
//!
//! Core accounting of the Velum shielded pool.
//!
//! Value deposited publicly is represented inside the pool as cryptographic
//! commitments; spending a commitment reveals a nullifier plus a proof of
//! ownership without disclosing which commitment was spent. This crate owns
//! the commitment/nullifier state machine: double-spend prevention,
//! collision rejection, and the conservation invariant tying the custodial
//! vault balance to the reported shielded total.
//!
//! ## Modules
//!
//! - [`state`] — Singleton protocol state (authority, vault id, totals)
//! - [`pool`] — Append-only commitment log and nullifier set
//! - [`ledger`] — Custodian contract for public token balances
//! - [`engine`] — The four operations and their receipts

pub mod engine;
pub mod ledger;
pub mod pool;
pub mod state;

pub use engine::{
    InitializeReceipt, PoolEngine, ShieldReceipt, TransferReceipt, UnshieldReceipt,
};
pub use ledger::{InMemoryLedger, Ledger, LedgerError};
pub use pool::PrivacyPool;
pub use state::ProtocolState;

use velum_types::Amount;

/// Error types for pool operations.
///
/// Every variant except [`PoolError::Halted`] aborts the operation with
/// zero observable state change. `Halted` is returned once an invariant
/// violation has poisoned the pool; no further operations are accepted.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PoolError {
    /// Protocol state already exists for this deployment.
    #[error("protocol state already initialized")]
    AlreadyInitialized,

    /// Operation arrived before the pool was initialized.
    #[error("pool is not initialized")]
    NotInitialized,

    /// Shield amount must be strictly positive.
    #[error("amount must be greater than zero")]
    InvalidAmount,

    /// Caller's public balance cannot cover the shield amount.
    #[error("insufficient funds: account holds {available}, operation needs {required}")]
    InsufficientFunds {
        /// Balance available in the debited account.
        available: Amount,
        /// Amount the operation required.
        required: Amount,
    },

    /// Vault cannot cover an unshield the accounting says it must cover.
    /// Unreachable under correct accounting; observing it halts the pool.
    #[error("vault holds {vault_balance}, cannot release {required}")]
    VaultInsufficientBalance {
        /// Custodial balance actually held by the vault.
        vault_balance: Amount,
        /// Amount the unshield required.
        required: Amount,
    },

    /// The commitment is already a pool member.
    #[error("commitment already exists in the pool")]
    CommitmentAlreadyExists,

    /// The nullifier has already been revealed (double-spend attempt).
    #[error("nullifier already spent (double-spend rejected)")]
    DoubleSpend,

    /// Proof rejected, or its public statement disagrees with the call.
    #[error("invalid proof: {0}")]
    InvalidProof(String),

    /// Checked arithmetic on totals or balances overflowed.
    #[error("arithmetic overflow in pool accounting")]
    ArithmeticOverflow,

    /// The transfer authority does not own the debited account.
    #[error("authority does not own the debited account")]
    Unauthorized,

    /// The pool halted after an invariant violation and accepts no
    /// further operations.
    #[error("pool halted: {reason}")]
    Halted {
        /// Why the pool halted.
        reason: String,
    },
}

/// Convenience result type for pool operations.
pub type Result<T> = std::result::Result<T, PoolError>;
