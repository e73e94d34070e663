//! Canonical statement encoding for spend-authorization proofs.
//!
//! A statement is the exact set of public values a proof attests to. The
//! pool engine builds it from the operation's arguments, so a proof can
//! never be replayed against a different nullifier, recipient, or amount.
//!
//! ## Layout
//!
//! All statements share a two-byte prefix, then a fixed field layout:
//!
//! ```text
//! unshield: version(1) || 0x01 || nullifier(32) || recipient(32) || amount LE(8)
//! transfer: version(1) || 0x02 || old_nullifier(32) || new_commitment(32)
//! ```
//!
//! Decoding is strict: wrong version, unknown tag, or any length deviation
//! is an error, and verifiers treat undecodable statements as invalid.

use velum_types::{AccountId, Amount, Commitment, Nullifier};

use crate::{Result, VerifierError};

/// Version byte carried by every encoded statement.
pub const STATEMENT_VERSION: u8 = 1;

/// Tag byte for unshield statements.
const UNSHIELD_TAG: u8 = 0x01;
/// Tag byte for private transfer statements.
const TRANSFER_TAG: u8 = 0x02;

/// Encoded length of an unshield statement.
pub const UNSHIELD_STATEMENT_LEN: usize = 2 + 32 + 32 + 8;
/// Encoded length of a transfer statement.
pub const TRANSFER_STATEMENT_LEN: usize = 2 + 32 + 32;

/// Public values attested by an unshield proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnshieldStatement {
    /// Nullifier of the note being spent.
    pub nullifier: Nullifier,
    /// Account receiving the public funds.
    pub recipient: AccountId,
    /// Amount leaving the pool.
    pub amount: Amount,
}

impl UnshieldStatement {
    /// Encode into the canonical byte layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(UNSHIELD_STATEMENT_LEN);
        bytes.push(STATEMENT_VERSION);
        bytes.push(UNSHIELD_TAG);
        bytes.extend_from_slice(&self.nullifier);
        bytes.extend_from_slice(&self.recipient);
        bytes.extend_from_slice(&self.amount.to_le_bytes());
        bytes
    }
}

/// Public values attested by a private transfer proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferStatement {
    /// Nullifier of the note being consumed.
    pub old_nullifier: Nullifier,
    /// Commitment of the note replacing it.
    pub new_commitment: Commitment,
}

impl TransferStatement {
    /// Encode into the canonical byte layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(TRANSFER_STATEMENT_LEN);
        bytes.push(STATEMENT_VERSION);
        bytes.push(TRANSFER_TAG);
        bytes.extend_from_slice(&self.old_nullifier);
        bytes.extend_from_slice(&self.new_commitment);
        bytes
    }
}

/// A decoded statement of either kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Statement {
    Unshield(UnshieldStatement),
    Transfer(TransferStatement),
}

impl Statement {
    /// Encode into the canonical byte layout.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Statement::Unshield(s) => s.encode(),
            Statement::Transfer(s) => s.encode(),
        }
    }

    /// Decode a statement, enforcing version, tag, and exact length.
    pub fn decode(bytes: &[u8]) -> Result<Statement> {
        if bytes.len() < 2 {
            return Err(VerifierError::TruncatedStatement(bytes.len()));
        }
        if bytes[0] != STATEMENT_VERSION {
            return Err(VerifierError::UnsupportedVersion(bytes[0]));
        }

        match bytes[1] {
            UNSHIELD_TAG => {
                if bytes.len() != UNSHIELD_STATEMENT_LEN {
                    return Err(VerifierError::LengthMismatch {
                        expected: UNSHIELD_STATEMENT_LEN,
                        actual: bytes.len(),
                    });
                }
                let mut amount_bytes = [0u8; 8];
                amount_bytes.copy_from_slice(&bytes[66..74]);
                Ok(Statement::Unshield(UnshieldStatement {
                    nullifier: read_hash(&bytes[2..34]),
                    recipient: read_hash(&bytes[34..66]),
                    amount: Amount::from_le_bytes(amount_bytes),
                }))
            }
            TRANSFER_TAG => {
                if bytes.len() != TRANSFER_STATEMENT_LEN {
                    return Err(VerifierError::LengthMismatch {
                        expected: TRANSFER_STATEMENT_LEN,
                        actual: bytes.len(),
                    });
                }
                Ok(Statement::Transfer(TransferStatement {
                    old_nullifier: read_hash(&bytes[2..34]),
                    new_commitment: read_hash(&bytes[34..66]),
                }))
            }
            tag => Err(VerifierError::UnknownTag(tag)),
        }
    }
}

/// Copy a length-checked 32-byte slice into an array.
fn read_hash(bytes: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(bytes);
    out
}
