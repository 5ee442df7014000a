//! Wallet composition: an account bound to a provider.
//!
//! [`connect`] wraps a provider; [`Connection::wallet`] binds it to a public
//! [`Account`]. The resulting [`Wallet`] answers "what is my next address",
//! "which UTXOs do I own" and "which inputs fund this payment" by combining
//! address discovery with coin selection.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use tessera_core::traits::{AddressDerivation, Provider};
use tessera_core::types::{
    Account, Addressing, Amount, ChainType, DerivedAddress, PaymentOutput, SelectionResult,
    Transaction, Utxo,
};

use crate::coin_selection::CoinSelector;
use crate::config::WalletConfig;
use crate::discovery::{derive_range, discover_used, find_next_unused};
use crate::error::WalletError;
use crate::keys::Blake3Derivation;

/// Start building wallets against `provider`.
pub fn connect<P: Provider + ?Sized>(provider: Arc<P>) -> Connection<P> {
    Connection { provider }
}

/// A provider shared by any number of wallets.
pub struct Connection<P: ?Sized> {
    provider: Arc<P>,
}

impl<P: Provider + ?Sized> Connection<P> {
    /// Wallet for `account` with default derivation and configuration.
    pub fn wallet(&self, account: Account) -> Wallet<P> {
        Wallet {
            provider: Arc::clone(&self.provider),
            derivation: Blake3Derivation,
            account,
            config: WalletConfig::default(),
        }
    }
}

/// A read-only wallet view over one account.
pub struct Wallet<P: ?Sized, D = Blake3Derivation> {
    provider: Arc<P>,
    derivation: D,
    account: Account,
    config: WalletConfig,
}

impl<P, D> Wallet<P, D>
where
    P: Provider + ?Sized,
    D: AddressDerivation,
{
    pub fn with_config(mut self, config: WalletConfig) -> Self {
        self.config = config;
        self
    }

    /// Swap the address derivation scheme.
    pub fn with_derivation<D2: AddressDerivation>(self, derivation: D2) -> Wallet<P, D2> {
        Wallet {
            provider: self.provider,
            derivation,
            account: self.account,
            config: self.config,
        }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    /// Addresses `lower..=upper` of `chain`; no provider access.
    pub fn derive_range(
        &self,
        chain: ChainType,
        lower: u32,
        upper: u32,
    ) -> Result<Vec<DerivedAddress>, WalletError> {
        derive_range(&self.derivation, &self.account, chain, lower, upper)
    }

    /// Lowest-index address of `chain` with no history.
    pub async fn next_address(&self, chain: ChainType) -> Result<DerivedAddress, WalletError> {
        find_next_unused(
            self.provider.as_ref(),
            &self.derivation,
            &self.account,
            chain,
            &self.config.discovery,
        )
        .await
    }

    pub async fn next_receiving_address(&self) -> Result<DerivedAddress, WalletError> {
        self.next_address(ChainType::External).await
    }

    pub async fn next_change_address(&self) -> Result<DerivedAddress, WalletError> {
        self.next_address(ChainType::Internal).await
    }

    /// Every address up to the last used one, external chain first.
    pub async fn addresses(&self) -> Result<Vec<DerivedAddress>, WalletError> {
        let mut all = Vec::new();
        for chain in ChainType::ALL {
            let used = discover_used(
                self.provider.as_ref(),
                &self.derivation,
                &self.account,
                chain,
                &self.config.discovery,
            )
            .await?;
            all.extend(used);
        }
        debug!(count = all.len(), "wallet: discovered addresses");
        Ok(all)
    }

    /// Transactions touching any wallet address, each once, in provider order.
    pub async fn transactions(&self) -> Result<Vec<Transaction>, WalletError> {
        let addresses: Vec<String> = self
            .addresses()
            .await?
            .into_iter()
            .map(|d| d.address)
            .collect();
        if addresses.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        Ok(self
            .provider
            .transactions_by_address(&addresses)
            .await?
            .into_iter()
            .filter(|tx| seen.insert(tx.id))
            .collect())
    }

    /// Unspent outputs on wallet addresses, annotated with their derivation path.
    pub async fn utxos(&self) -> Result<Vec<Utxo>, WalletError> {
        let derived = self.addresses().await?;
        if derived.is_empty() {
            return Ok(Vec::new());
        }

        // Discovery order: external first, ascending index.
        let addresses: Vec<String> = derived.iter().map(|d| d.address.clone()).collect();
        let addressing: HashMap<String, Addressing> = derived
            .into_iter()
            .map(|d| {
                let path = d.addressing();
                (d.address, path)
            })
            .collect();
        let unspent = self.provider.utxos_by_address(&addresses).await?;

        let mut utxos = Vec::with_capacity(unspent.len());
        for output in unspent {
            match addressing.get(&output.address) {
                Some(path) => utxos.push(output.with_addressing(*path)),
                None => {
                    warn!(address = %output.address, "wallet: provider returned foreign UTXO");
                }
            }
        }
        Ok(utxos)
    }

    /// Total value of [`utxos`](Self::utxos).
    pub async fn balance(&self) -> Result<Amount, WalletError> {
        let utxos = self.utxos().await?;
        Ok(Amount::checked_sum(utxos.iter().map(|u| u.value))?)
    }

    /// Choose inputs for `outputs` from the wallet's UTXOs, sending change
    /// to the next unused change address.
    pub async fn select_inputs(
        &self,
        outputs: &[PaymentOutput],
    ) -> Result<SelectionResult, WalletError> {
        let utxos = self.utxos().await?;
        let change = self.next_change_address().await?;
        let result =
            CoinSelector::new(self.config.selection).select(outputs, &utxos, &change.address)?;
        info!(
            inputs = result.inputs.len(),
            change_index = change.index,
            "wallet: selected inputs for payment"
        );
        Ok(result)
    }
}
