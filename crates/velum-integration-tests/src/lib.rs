//! # velum-integration-tests
//!
//! Cross-crate integration tests for the Velum workspace. This crate has
//! no library code; all tests live under `tests/`.
//!
//! The tests drive the pool engine, verifier backends and SQLite layer
//! together, without requiring a running daemon process.
//!
//! Run with:
//!
//! ```text
//! cargo test -p velum-integration-tests -- --ignored
//! ```
