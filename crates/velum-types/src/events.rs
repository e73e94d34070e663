//! Pool event types emitted to operator subscribers.
//!
//! Every successful operation produces one event; a halted pool produces a
//! final `Halted` event. 32-byte values are hex-encoded when the events
//! cross the JSON-RPC boundary.

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::{AccountId, Amount, Commitment, LeafIndex, Nullifier};

/// An event emitted by the pool daemon.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PoolEvent {
    /// Protocol state and pool were created.
    Initialized {
        #[serde_as(as = "serde_with::hex::Hex")]
        authority: AccountId,
        timestamp: u64,
    },

    /// Public value entered the pool as a new commitment.
    Shielded {
        #[serde_as(as = "serde_with::hex::Hex")]
        commitment: Commitment,
        amount: Amount,
        leaf_index: LeafIndex,
        total_shielded: Amount,
        timestamp: u64,
    },

    /// A note was spent and its value returned to a public account.
    Unshielded {
        #[serde_as(as = "serde_with::hex::Hex")]
        nullifier: Nullifier,
        amount: Amount,
        #[serde_as(as = "serde_with::hex::Hex")]
        recipient: AccountId,
        total_shielded: Amount,
        timestamp: u64,
    },

    /// A note was spent into a fresh commitment without leaving the pool.
    Transferred {
        #[serde_as(as = "serde_with::hex::Hex")]
        old_nullifier: Nullifier,
        #[serde_as(as = "serde_with::hex::Hex")]
        new_commitment: Commitment,
        total_shielded: Amount,
        timestamp: u64,
    },

    /// The pool detected an invariant violation and stopped processing.
    Halted { reason: String, timestamp: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_hex_encoding() {
        let event = PoolEvent::Shielded {
            commitment: [0xAB; 32],
            amount: 100,
            leaf_index: 0,
            total_shielded: 100,
            timestamp: 1_700_000_000,
        };

        let json = serde_json::to_string(&event).expect("serialize event");
        assert!(json.contains("\"shielded\""));
        assert!(json.contains(&"ab".repeat(32)));
    }

    #[test]
    fn test_event_roundtrip() {
        let event = PoolEvent::Unshielded {
            nullifier: [0x01; 32],
            amount: 50,
            recipient: [0x02; 32],
            total_shielded: 50,
            timestamp: 1_700_000_000,
        };

        let json = serde_json::to_string(&event).expect("serialize");
        let back: PoolEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, event);
    }
}
