//! Query functions, grouped by domain.
//!
//! Every function takes a `&Connection` so callers can run them inside
//! a `rusqlite::Transaction` (which derefs to `Connection`) when a
//! receipt touches several tables at once.

pub mod accounts;
pub mod pool;
pub mod state;

use crate::{DbError, Result};

/// Convert a BLOB column into a fixed 32-byte array.
pub(crate) fn blob32(bytes: Vec<u8>) -> Result<[u8; 32]> {
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| DbError::Serialization(format!("expected 32-byte blob, got {} bytes", len)))
}
