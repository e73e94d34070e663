//! Groth16 proof verification over the statement digest.
//!
//! The production circuit exposes a single public input: the BLAKE3
//! statement digest, reduced onto the BLS12-381 scalar field. Hashing the
//! statement down to one field element keeps the verification key stable
//! across statement kinds while still binding the proof to every field of
//! the statement.

use velum_crypto::blake3::{contexts, derive_key};
use velum_crypto::groth16::{self, Fr, SerializedProof, SerializedVerifyingKey, PROOF_SIZE};

use crate::{ProofVerifier, Statement};

/// Verifier backed by a Groth16/BLS12-381 verification key.
pub struct Groth16Verifier {
    verifying_key: SerializedVerifyingKey,
}

impl Groth16Verifier {
    /// Build a verifier from compressed verification key bytes.
    pub fn new(vk_bytes: Vec<u8>) -> Self {
        Self {
            verifying_key: SerializedVerifyingKey { bytes: vk_bytes },
        }
    }

    /// The public input a proof must satisfy for the given statement bytes.
    pub fn statement_digest(public_inputs: &[u8]) -> Fr {
        let digest = derive_key(contexts::PROOF_STATEMENT, public_inputs);
        groth16::fr_from_bytes(&digest)
    }
}

impl ProofVerifier for Groth16Verifier {
    fn verify(&self, proof: &[u8], public_inputs: &[u8]) -> bool {
        // Only well-formed statements can verify.
        if Statement::decode(public_inputs).is_err() {
            return false;
        }
        if proof.len() != PROOF_SIZE {
            return false;
        }

        let serialized = SerializedProof {
            bytes: proof.to_vec(),
        };
        let digest = Self::statement_digest(public_inputs);

        match groth16::verify(&serialized, &self.verifying_key, &[digest]) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::debug!(error = %e, "groth16 proof rejected as malformed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::UnshieldStatement;
    use velum_crypto::groth16::{prove, setup, MultiplyCircuit};

    fn statement_bytes() -> Vec<u8> {
        UnshieldStatement {
            nullifier: [0x5A; 32],
            recipient: [0xA5; 32],
            amount: 750,
        }
        .encode()
    }

    /// Prove `digest * 1 = digest` so the statement digest becomes the
    /// circuit's public input, standing in for the production circuit.
    fn prove_for_statement(bytes: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let digest = Groth16Verifier::statement_digest(bytes);
        let circuit = MultiplyCircuit {
            a: Some(digest),
            b: Some(Fr::from(1u64)),
        };
        let (pk, vk) = setup(circuit.clone()).expect("setup");
        let proof = prove(circuit, &pk).expect("prove");
        (proof.bytes, vk.bytes)
    }

    #[test]
    fn test_valid_proof_accepted() {
        let bytes = statement_bytes();
        let (proof, vk) = prove_for_statement(&bytes);
        let verifier = Groth16Verifier::new(vk);
        assert!(verifier.verify(&proof, &bytes));
    }

    #[test]
    fn test_proof_bound_to_statement() {
        let bytes = statement_bytes();
        let (proof, vk) = prove_for_statement(&bytes);
        let verifier = Groth16Verifier::new(vk);

        // Any altered statement field changes the digest.
        let other = UnshieldStatement {
            nullifier: [0x5A; 32],
            recipient: [0xA5; 32],
            amount: 751,
        }
        .encode();
        assert!(!verifier.verify(&proof, &other));
    }

    #[test]
    fn test_wrong_size_proof_rejected() {
        let bytes = statement_bytes();
        let (proof, vk) = prove_for_statement(&bytes);
        let verifier = Groth16Verifier::new(vk);
        assert!(!verifier.verify(&proof[..proof.len() - 1], &bytes));
    }

    #[test]
    fn test_garbage_proof_rejected() {
        let bytes = statement_bytes();
        let (_, vk) = prove_for_statement(&bytes);
        let verifier = Groth16Verifier::new(vk);
        assert!(!verifier.verify(&[0x42; PROOF_SIZE], &bytes));
    }

    #[test]
    fn test_malformed_statement_rejected() {
        let bytes = statement_bytes();
        let (proof, vk) = prove_for_statement(&bytes);
        let verifier = Groth16Verifier::new(vk);
        assert!(!verifier.verify(&proof, &bytes[..bytes.len() - 1]));
    }
}
