//! Domain-separated BLAKE3 hashing for the Velum protocol.
//!
//! BLAKE3 serves several distinct purposes here: note commitments,
//! nullifier derivation, account-id derivation, and stub proof binding.
//! Cross-domain collisions are prevented by mandatory domain separation
//! through BLAKE3's key-derivation mode.
//!
//! ## Context Strings
//!
//! All registered context strings are available as constants. Hashing
//! with an unregistered context string is a protocol violation.

/// Registered BLAKE3 context strings for the Velum protocol.
/// Using an unregistered context string is a protocol violation.
pub mod contexts {
    /// Note commitment derivation from (amount, owner secret, blinding).
    pub const NOTE_COMMITMENT: &str = "Velum v1 note-commitment";
    /// Nullifier derivation from (commitment, spend key).
    pub const NULLIFIER: &str = "Velum v1 nullifier";
    /// Vault account id derivation from the pool authority.
    pub const VAULT_ACCOUNT: &str = "Velum v1 vault-account";
    /// Stub proof binding over statement bytes.
    pub const STUB_PROOF: &str = "Velum v1 stub-proof";
    /// Statement digest used as the Groth16 public input.
    pub const PROOF_STATEMENT: &str = "Velum v1 proof-statement";

    /// All registered context strings. Used for validation.
    pub const ALL_CONTEXTS: &[&str] = &[
        NOTE_COMMITMENT,
        NULLIFIER,
        VAULT_ACCOUNT,
        STUB_PROOF,
        PROOF_STATEMENT,
    ];
}

/// Compute BLAKE3 hash of the input data.
pub fn hash(data: &[u8]) -> [u8; 32] {
    *::blake3::hash(data).as_bytes()
}

/// Derive a 32-byte value using BLAKE3's built-in key derivation mode.
///
/// The context string must be one of the registered constants in
/// [`contexts`]. The key material can be any byte slice.
///
/// # Arguments
///
/// * `context` - A registered context string (must start with "Velum v1 ")
/// * `key_material` - The input key material
pub fn derive_key(context: &str, key_material: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut hasher = ::blake3::Hasher::new_derive_key(context);
    hasher.update(key_material);
    let digest = hasher.finalize();
    out.copy_from_slice(digest.as_bytes());
    out
}

/// Verify that a context string is registered in the Velum protocol.
pub fn is_registered_context(context: &str) -> bool {
    contexts::ALL_CONTEXTS.contains(&context)
}

/// Encode multiple dynamic fields using length-prefixed encoding.
///
/// When deriving hashes from multiple dynamic fields, inputs use
/// `LE32(len(field1)) || field1 || LE32(len(field2)) || field2 || ...`
pub fn encode_multi_field(fields: &[&[u8]]) -> Vec<u8> {
    let total_len: usize = fields.iter().map(|f| 4 + f.len()).sum();
    let mut output = Vec::with_capacity(total_len);
    for field in fields {
        output.extend_from_slice(&(field.len() as u32).to_le_bytes());
        output.extend_from_slice(field);
    }
    output
}
