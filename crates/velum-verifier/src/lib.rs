//! # velum-verifier
//!
//! Spend-authorization proof verification for the Velum shielded pool.
//!
//! The pool engine never interprets proof bytes itself. It constructs the
//! statement being attested (nullifier, recipient, amount for an unshield;
//! old nullifier and new commitment for a transfer), encodes it into a
//! canonical byte layout, and hands proof plus statement to a
//! [`ProofVerifier`]. Swapping the verifier never changes pool accounting.
//!
//! ## Modules
//!
//! - [`statement`] — Canonical statement encoding (versioned, fixed layout)
//! - [`stub`] — Deterministic stub verifier for development and tests
//! - [`groth16`] — Groth16/BLS12-381 verifier over the statement digest

pub mod groth16;
pub mod statement;
pub mod stub;

pub use groth16::Groth16Verifier;
pub use statement::{Statement, TransferStatement, UnshieldStatement};
pub use stub::StubVerifier;

use thiserror::Error;

/// Errors from statement encoding and decoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifierError {
    /// Statement shorter than the version/tag prefix.
    #[error("statement truncated: {0} bytes")]
    TruncatedStatement(usize),

    /// Statement carries a version this build does not speak.
    #[error("unsupported statement version: {0}")]
    UnsupportedVersion(u8),

    /// Statement tag does not name a known operation.
    #[error("unknown statement tag: {0:#04x}")]
    UnknownTag(u8),

    /// Statement length does not match its tag's fixed layout.
    #[error("statement length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, VerifierError>;

/// Verifies a spend-authorization proof against explicit public inputs.
///
/// `public_inputs` is a canonical [`Statement`] encoding produced by the
/// caller, never by the prover. Implementations must return `true` only
/// when `proof` is valid for exactly those bytes, and must be
/// deterministic: the same inputs always produce the same answer.
pub trait ProofVerifier: Send + Sync {
    fn verify(&self, proof: &[u8], public_inputs: &[u8]) -> bool;
}

// Forwarding impl for runtime-selected boxed backends.
impl<T: ProofVerifier + ?Sized> ProofVerifier for Box<T> {
    fn verify(&self, proof: &[u8], public_inputs: &[u8]) -> bool {
        (**self).verify(proof, public_inputs)
    }
}

// Boxed backends appear in `Result`s whose combinators require `Debug`.
impl std::fmt::Debug for dyn ProofVerifier + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn ProofVerifier")
    }
}

/// Test double that accepts every proof unconditionally.
pub struct AcceptAllVerifier;

impl ProofVerifier for AcceptAllVerifier {
    fn verify(&self, _proof: &[u8], _public_inputs: &[u8]) -> bool {
        true
    }
}

/// Test double that rejects every proof unconditionally.
pub struct RejectAllVerifier;

impl ProofVerifier for RejectAllVerifier {
    fn verify(&self, _proof: &[u8], _public_inputs: &[u8]) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_all_accepts_anything() {
        assert!(AcceptAllVerifier.verify(b"", b""));
        assert!(AcceptAllVerifier.verify(&[0xFF; 192], &[0u8; 74]));
    }

    #[test]
    fn test_reject_all_rejects_anything() {
        let statement = UnshieldStatement {
            nullifier: [1u8; 32],
            recipient: [2u8; 32],
            amount: 100,
        };
        let bytes = statement.encode();
        let proof = StubVerifier::prove(&bytes);
        assert!(!RejectAllVerifier.verify(&proof, &bytes));
    }
}
