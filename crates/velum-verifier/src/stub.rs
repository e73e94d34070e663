//! Deterministic stub verifier.
//!
//! Produces and checks placeholder proofs bound to the exact statement
//! bytes: `proof = BLAKE3::derive_key("Velum v1 stub-proof", statement)`.
//! The proof format is compatible with the [`ProofVerifier`] interface so
//! that the transition to real Groth16 proofs is seamless, and the binding
//! behaves like the real thing: altering any statement field invalidates
//! the proof.

use velum_crypto::blake3::{contexts, derive_key};

use crate::{ProofVerifier, Statement};

/// Verifier (and prover) for deterministic stub proofs.
pub struct StubVerifier;

impl StubVerifier {
    /// Produce the stub proof for a statement.
    pub fn prove(public_inputs: &[u8]) -> [u8; 32] {
        derive_key(contexts::STUB_PROOF, public_inputs)
    }
}

impl ProofVerifier for StubVerifier {
    fn verify(&self, proof: &[u8], public_inputs: &[u8]) -> bool {
        // Only well-formed statements can verify.
        if Statement::decode(public_inputs).is_err() {
            return false;
        }
        let expected = Self::prove(public_inputs);
        proof == expected.as_slice()
    }
}
