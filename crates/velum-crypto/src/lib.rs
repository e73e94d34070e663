//! # velum-crypto
//!
//! Cryptographic primitives for the Velum shielded pool.
//!
//! The pool core treats commitments and nullifiers as opaque 32-byte
//! hashes; this crate defines how clients derive them and provides the
//! Groth16 verification infrastructure backing the real proof verifier.
//!
//! ## Modules
//!
//! - [`blake3`] — Domain-separated BLAKE3 hashing (registered context strings)
//! - [`note`] — Client-side note secrets and commitment/nullifier derivation
//! - [`groth16`] — Groth16/BLS12-381 proving and verification infrastructure

pub mod blake3;
pub mod groth16;
pub mod note;

/// Error types for cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Groth16 proof generation or verification failed.
    #[error("proof error: {0}")]
    Proof(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid input data.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
