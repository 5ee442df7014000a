//! # tessera-wallet — HD wallet core with gap-limited discovery.
//!
//! Finds the next unused receiving and change address of an account by
//! scanning derived addresses in gap-limit windows against a blockchain data
//! provider, and picks transaction inputs with the FirstMatchFirst coin
//! selection algorithm.
//!
//! # Modules
//!
//! - [`error`] — `WalletError` enum
//! - [`config`] — Discovery and selection tunables
//! - [`mnemonic`] — BIP-39 phrase generation and seed derivation
//! - [`keys`] — Seed, in-memory key manager, BLAKE3 address derivation
//! - [`discovery`] — Range derivation and next-unused-address search
//! - [`coin_selection`] — FirstMatchFirst UTXO selection
//! - [`provider`] — In-memory blockchain data provider
//! - [`wallet`] — High-level wallet composition

pub mod coin_selection;
pub mod config;
pub mod discovery;
pub mod error;
pub mod keys;
pub mod mnemonic;
pub mod provider;
pub mod wallet;

// Re-exports for convenient access
pub use coin_selection::{CoinSelector, select_inputs_and_change_output};
pub use config::{DiscoveryConfig, SelectionConfig, WalletConfig, ZeroChangePolicy};
pub use discovery::{derive_range, discover_used, find_next_unused};
pub use error::WalletError;
pub use keys::{Blake3Derivation, InMemoryKeyManager, Seed};
pub use mnemonic::{generate_mnemonic, mnemonic_to_seed, parse_mnemonic};
pub use provider::InMemoryProvider;
pub use wallet::{Connection, Wallet, connect};
