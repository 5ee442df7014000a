//! Wallet error types.

use tessera_core::error::{AmountError, ProviderError};
use tessera_core::types::{Amount, ChainType};
use thiserror::Error;

/// Errors that can occur in discovery, selection and key management.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Range derivation was given `lower > upper`.
    #[error("invalid range: lower bound {lower} exceeds upper bound {upper}")]
    InvalidRange {
        /// Requested first index.
        lower: u32,
        /// Requested last index.
        upper: u32,
    },

    /// The provider failed to answer a history or UTXO query.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Discovery scanned past its safety ceiling without finding a free address.
    #[error("discovery exhausted on {chain} chain after {scanned} addresses")]
    DiscoveryExhausted {
        /// Chain being scanned.
        chain: ChainType,
        /// Number of addresses checked before giving up.
        scanned: u64,
    },

    /// The candidate UTXOs cannot cover the requested outputs.
    #[error("NotEnoughInput: have {available}, need {required}")]
    NotEnoughInput {
        /// Total value of every candidate UTXO.
        available: Amount,
        /// Total value of the requested outputs.
        required: Amount,
    },

    /// Coin selection was called without any payment outputs.
    #[error("no payment outputs")]
    NoOutputs,

    /// Invalid monetary amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Amount arithmetic overflowed or underflowed.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// Invalid BIP-39 mnemonic phrase.
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Invalid configuration value.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
