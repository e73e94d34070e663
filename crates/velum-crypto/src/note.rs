//! Client-side note secrets and hash derivation.
//!
//! A note is never stored by the pool; only its commitment is. The client
//! keeps the secrets and derives:
//!
//! ```text
//! commitment = BLAKE3::derive_key("Velum v1 note-commitment",
//!                                 LE32-framed(amount || owner_secret || blinding))
//! nullifier  = BLAKE3::derive_key("Velum v1 nullifier",
//!                                 LE32-framed(commitment || spend_key))
//! ```
//!
//! The commitment is unpredictable without the blinding factor; the
//! nullifier is deterministic per note but unlinkable to the commitment
//! without the spend key. Lost secrets mean a permanently locked note.

use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::blake3::{contexts, derive_key, encode_multi_field};

/// Secrets a client holds for one note. Wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct NoteSecrets {
    /// Owner secret bound into the commitment.
    pub owner_secret: [u8; 32],
    /// Blinding factor making the commitment unpredictable.
    pub blinding: [u8; 32],
    /// Spending key bound into the nullifier.
    pub spend_key: [u8; 32],
}

impl NoteSecrets {
    /// Generate fresh random secrets from the OS RNG.
    pub fn random() -> Self {
        let mut rng = rand::rngs::OsRng;
        let mut owner_secret = [0u8; 32];
        let mut blinding = [0u8; 32];
        let mut spend_key = [0u8; 32];
        rng.fill_bytes(&mut owner_secret);
        rng.fill_bytes(&mut blinding);
        rng.fill_bytes(&mut spend_key);
        Self {
            owner_secret,
            blinding,
            spend_key,
        }
    }

    /// Derive the commitment for this note at the given amount.
    pub fn commitment(&self, amount: u64) -> [u8; 32] {
        let amount_bytes = amount.to_le_bytes();
        let material = encode_multi_field(&[&amount_bytes, &self.owner_secret, &self.blinding]);
        derive_key(contexts::NOTE_COMMITMENT, &material)
    }

    /// Derive the nullifier that spends the given commitment.
    pub fn nullifier(&self, commitment: &[u8; 32]) -> [u8; 32] {
        let material = encode_multi_field(&[commitment, &self.spend_key]);
        derive_key(contexts::NULLIFIER, &material)
    }
}

/// Derive the vault account id for a pool authority.
///
/// Account derivation is deterministic and collision-free: each authority
/// maps to exactly one vault id.
pub fn derive_vault_account(authority: &[u8; 32]) -> [u8; 32] {
    derive_key(contexts::VAULT_ACCOUNT, authority)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_secrets() -> NoteSecrets {
        NoteSecrets {
            owner_secret: [0x11; 32],
            blinding: [0x22; 32],
            spend_key: [0x33; 32],
        }
    }

    #[test]
    fn test_commitment_deterministic() {
        let secrets = fixed_secrets();
        assert_eq!(secrets.commitment(100), secrets.commitment(100));
    }

    #[test]
    fn test_commitment_binds_amount() {
        let secrets = fixed_secrets();
        assert_ne!(secrets.commitment(100), secrets.commitment(101));
    }

    #[test]
    fn test_commitment_hidden_by_blinding() {
        // Same amount, different blinding: different commitments.
        let a = fixed_secrets();
        let mut b = fixed_secrets();
        b.blinding = [0x44; 32];
        assert_ne!(a.commitment(100), b.commitment(100));
    }

    #[test]
    fn test_nullifier_deterministic() {
        let secrets = fixed_secrets();
        let c = secrets.commitment(100);
        assert_eq!(secrets.nullifier(&c), secrets.nullifier(&c));
    }

    #[test]
    fn test_nullifier_differs_from_commitment() {
        let secrets = fixed_secrets();
        let c = secrets.commitment(100);
        assert_ne!(secrets.nullifier(&c), c);
    }

    #[test]
    fn test_nullifier_binds_spend_key() {
        let a = fixed_secrets();
        let mut b = fixed_secrets();
        b.spend_key = [0x55; 32];
        let c = a.commitment(100);
        assert_ne!(a.nullifier(&c), b.nullifier(&c));
    }

    #[test]
    fn test_random_secrets_produce_distinct_commitments() {
        let a = NoteSecrets::random();
        let b = NoteSecrets::random();
        assert_ne!(a.commitment(100), b.commitment(100));
    }

    #[test]
    fn test_vault_account_deterministic() {
        let authority = [0xAA; 32];
        assert_eq!(
            derive_vault_account(&authority),
            derive_vault_account(&authority)
        );
        assert_ne!(derive_vault_account(&authority), authority);
    }
}
