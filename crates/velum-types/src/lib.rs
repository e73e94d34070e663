//! # velum-types
//!
//! Shared domain types used across the Velum workspace.
//!
//! Velum is the accounting core of a shielded token pool: public value is
//! held in a custodial vault and represented inside the pool as opaque
//! 32-byte commitments; spending reveals a nullifier plus a proof. The
//! aliases here name the handful of fixed-width values every crate passes
//! around.

pub mod events;

/// Common type aliases.
pub type Hash = [u8; 32];

/// A note commitment: an opaque 32-byte hash computed off-pool by the
/// client from (amount, owner secret, blinding factor).
pub type Commitment = [u8; 32];

/// A nullifier: a 32-byte hash derived off-pool from a spent commitment
/// and the owner's spending key. Unlinkable to its source commitment.
pub type Nullifier = [u8; 32];

/// An account identity on the public ledger side.
pub type AccountId = [u8; 32];

/// A token amount in base units.
pub type Amount = u64;

/// Index of a commitment in the append-only leaf log.
pub type LeafIndex = u64;

/// Base units per whole token (1 token = 10^9 base units).
pub const UNITS_PER_TOKEN: u64 = 1_000_000_000;

/// Fixed byte length of commitments, nullifiers, and account ids.
pub const HASH_LEN: usize = 32;
