//! Append-only commitment log and nullifier set.
//!
//! Both sets grow monotonically for the lifetime of a deployment and
//! neither exposes any removal operation. Membership tests and inserts are
//! amortized O(1): commitments are indexed by a hash set and recorded in an
//! insertion-ordered leaf log (the log position is the note's stable leaf
//! index); nullifiers live in a hash set only.
//!
//! Note lifecycle: a note is Created when its commitment is appended,
//! Active while no matching nullifier exists, and irreversibly Spent once
//! its nullifier is inserted.

use std::collections::HashSet;

use velum_types::{Commitment, LeafIndex, Nullifier};

use crate::{PoolError, Result};

/// The pool's membership state: every commitment ever created and every
/// nullifier ever revealed.
#[derive(Clone, Debug, Default)]
pub struct PrivacyPool {
    commitment_index: HashSet<Commitment>,
    commitment_log: Vec<Commitment>,
    nullifiers: HashSet<Nullifier>,
}

impl PrivacyPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a pool from persisted data. `commitments` must be in leaf
    /// order. Duplicates mean the persisted state is corrupt.
    pub fn restore(commitments: Vec<Commitment>, nullifiers: Vec<Nullifier>) -> Result<Self> {
        let mut pool = Self::new();
        for commitment in commitments {
            pool.insert_commitment(commitment)?;
        }
        for nullifier in nullifiers {
            pool.insert_nullifier(nullifier)?;
        }
        Ok(pool)
    }

    /// Whether the commitment is a pool member.
    pub fn has_commitment(&self, commitment: &Commitment) -> bool {
        self.commitment_index.contains(commitment)
    }

    /// Whether the nullifier has been revealed.
    pub fn is_spent(&self, nullifier: &Nullifier) -> bool {
        self.nullifiers.contains(nullifier)
    }

    /// Append a commitment and return its leaf index.
    ///
    /// # Errors
    ///
    /// - [`PoolError::CommitmentAlreadyExists`] if already a member
    pub fn insert_commitment(&mut self, commitment: Commitment) -> Result<LeafIndex> {
        if !self.commitment_index.insert(commitment) {
            return Err(PoolError::CommitmentAlreadyExists);
        }
        let leaf_index = self.commitment_log.len() as LeafIndex;
        self.commitment_log.push(commitment);
        Ok(leaf_index)
    }

    /// Record a revealed nullifier.
    ///
    /// # Errors
    ///
    /// - [`PoolError::DoubleSpend`] if already present
    pub fn insert_nullifier(&mut self, nullifier: Nullifier) -> Result<()> {
        if !self.nullifiers.insert(nullifier) {
            return Err(PoolError::DoubleSpend);
        }
        Ok(())
    }

    /// Number of commitments ever created.
    pub fn commitment_count(&self) -> u64 {
        self.commitment_log.len() as u64
    }

    /// Number of nullifiers ever revealed.
    pub fn nullifier_count(&self) -> u64 {
        self.nullifiers.len() as u64
    }

    /// The full commitment log in leaf order.
    pub fn commitment_log(&self) -> &[Commitment] {
        &self.commitment_log
    }

    /// Iterate over revealed nullifiers (unspecified order).
    pub fn nullifiers(&self) -> impl Iterator<Item = &Nullifier> {
        self.nullifiers.iter()
    }
}
