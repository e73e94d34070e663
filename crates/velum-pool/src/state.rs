//! Singleton protocol state.
//!
//! One record per deployment, created exactly once by initialize and never
//! destroyed. The vault account id is derived deterministically from the
//! authority at creation time and fixed thereafter.

use velum_types::{AccountId, Amount};

/// Aggregate totals and identity for one pool deployment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtocolState {
    /// Identity that created the pool.
    pub authority: AccountId,
    /// Derived custodial vault account backing the pool.
    pub vault: AccountId,
    /// Sum of value currently held shielded. Must equal the vault balance
    /// after every successful operation.
    pub total_shielded: Amount,
    /// Cumulative value returned to public circulation via unshield.
    /// Monotone bookkeeping counter; not a current-supply figure.
    pub total_public: Amount,
}

impl ProtocolState {
    /// Create fresh state for an authority: totals zeroed, vault derived.
    pub fn new(authority: AccountId) -> Self {
        Self {
            authority,
            vault: velum_crypto::note::derive_vault_account(&authority),
            total_shielded: 0,
            total_public: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_zeroed() {
        let state = ProtocolState::new([0xAA; 32]);
        assert_eq!(state.total_shielded, 0);
        assert_eq!(state.total_public, 0);
        assert_eq!(state.authority, [0xAA; 32]);
    }

    #[test]
    fn test_vault_derived_from_authority() {
        let a = ProtocolState::new([0x01; 32]);
        let b = ProtocolState::new([0x02; 32]);
        assert_ne!(a.vault, b.vault);
        assert_eq!(a.vault, ProtocolState::new([0x01; 32]).vault);
        assert_ne!(a.vault, a.authority);
    }
}
