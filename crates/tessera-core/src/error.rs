//! Error types for the Tessera data model and its collaborators.
use thiserror::Error;

/// Failure reported by a blockchain data [`Provider`](crate::traits::Provider).
///
/// The core never retries; retry policy belongs to the provider itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")] Unavailable(String),
    #[error("invalid provider response: {0}")] InvalidResponse(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount overflow")] Overflow,
    #[error("amount underflow")] Underflow,
    #[error("invalid amount: {0}")] Parse(String),
}

/// Malformed textual or numeric encodings of data-model values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid chain type: {0}")] InvalidChainType(String),
    #[error("invalid tx id: {0}")] InvalidTxId(String),
    #[error("invalid account: {0}")] InvalidAccount(String),
}
