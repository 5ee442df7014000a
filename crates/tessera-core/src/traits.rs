//! Collaborator interfaces consumed by the wallet core.
//!
//! - [`AddressDerivation`] — pure `(account, chain, index) -> address` mapping
//! - [`KeyManager`] — owner of key material, hands out the public [`Account`]
//! - [`Provider`] — read-only view of chain history and unspent outputs

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{Account, ChainType, Transaction, UnspentOutput};

/// Deterministic address derivation from a public account context.
///
/// Implementations must be pure: the same `(account, chain, index)` always
/// yields the same address, and distinct indices of one chain yield
/// distinct addresses.
pub trait AddressDerivation: Send + Sync {
    /// Encoded address at `index` of `chain`.
    fn derive_address(&self, account: &Account, chain: ChainType, index: u32) -> String;
}

impl<T: AddressDerivation + ?Sized> AddressDerivation for &T {
    fn derive_address(&self, account: &Account, chain: ChainType, index: u32) -> String {
        (**self).derive_address(account, chain, index)
    }
}

impl<T: AddressDerivation + ?Sized> AddressDerivation for Arc<T> {
    fn derive_address(&self, account: &Account, chain: ChainType, index: u32) -> String {
        (**self).derive_address(account, chain, index)
    }
}

/// Holder of account key material.
pub trait KeyManager: Send + Sync {
    /// The public account context passed into discovery and selection.
    fn public_account(&self) -> Account;
}

/// Read-only access to blockchain history.
///
/// Queries may suspend on network I/O. Failures are reported as
/// [`ProviderError`] and are never retried by the caller.
#[async_trait]
pub trait Provider: Send + Sync {
    /// All known transactions touching any of `addresses`, each at most once.
    async fn transactions_by_address(
        &self,
        addresses: &[String],
    ) -> Result<Vec<Transaction>, ProviderError>;

    /// Unspent outputs locked to any of `addresses`, in provider order.
    async fn utxos_by_address(
        &self,
        addresses: &[String],
    ) -> Result<Vec<UnspentOutput>, ProviderError>;

    /// Whether `address` appears on an input or output of any known transaction.
    ///
    /// Default implementation delegates to
    /// [`transactions_by_address`](Self::transactions_by_address).
    async fn has_history(&self, address: &str) -> Result<bool, ProviderError> {
        let txs = self
            .transactions_by_address(&[address.to_string()])
            .await?;
        Ok(txs.iter().any(|tx| tx.touches(address)))
    }
}

#[async_trait]
impl<P: Provider + ?Sized> Provider for Arc<P> {
    async fn transactions_by_address(
        &self,
        addresses: &[String],
    ) -> Result<Vec<Transaction>, ProviderError> {
        (**self).transactions_by_address(addresses).await
    }

    async fn utxos_by_address(
        &self,
        addresses: &[String],
    ) -> Result<Vec<UnspentOutput>, ProviderError> {
        (**self).utxos_by_address(addresses).await
    }

    async fn has_history(&self, address: &str) -> Result<bool, ProviderError> {
        (**self).has_history(address).await
    }
}
