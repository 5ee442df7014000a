//! # tessera-core
//! Foundation types and collaborator traits for the Tessera wallet core.
//!
//! The data model shared by address discovery and coin selection lives in
//! [`types`]; the contracts for the key manager and the blockchain data
//! provider live in [`traits`].

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{AmountError, ParseError, ProviderError};
pub use traits::{AddressDerivation, KeyManager, Provider};
pub use types::{
    Account, Addressing, Amount, ChainType, ChangeOutput, DerivedAddress, OutPoint,
    PaymentOutput, SelectionResult, Transaction, TransactionInput, TransactionOutput, TxId,
    UnspentOutput, Utxo,
};
