//! Integration test suite for the Tessera wallet core.
//!
//! Exercises address discovery and coin selection end to end with real
//! BLAKE3 address derivation, a mnemonic-backed key manager and the
//! in-memory provider. Shared fixtures live in [`helpers`].

pub mod helpers;
