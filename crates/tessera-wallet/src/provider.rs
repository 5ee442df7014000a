//! In-memory blockchain data provider.
//!
//! Holds a fixed transaction set and UTXO set behind a read-write lock.
//! Answers queries in insertion order. Useful as a test double and for
//! embedding a pre-fetched snapshot of chain state.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::RwLock;

use tessera_core::error::ProviderError;
use tessera_core::traits::Provider;
use tessera_core::types::{Transaction, UnspentOutput};

#[derive(Debug, Default)]
struct ProviderState {
    transactions: Vec<Transaction>,
    utxos: Vec<UnspentOutput>,
}

/// Provider backed by in-memory transaction and UTXO sets.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    state: RwLock<ProviderState>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider pre-seeded with `utxos` and `transactions`.
    pub fn with_state(utxos: Vec<UnspentOutput>, transactions: Vec<Transaction>) -> Self {
        let provider = Self::new();
        provider.seed(utxos, transactions);
        provider
    }

    /// Replace both the UTXO set and the transaction set.
    pub fn seed(&self, utxos: Vec<UnspentOutput>, transactions: Vec<Transaction>) {
        let mut state = self.state.write();
        state.utxos = utxos;
        state.transactions = transactions;
    }

    /// Replace the transaction set, keeping the UTXO set.
    pub fn seed_transactions(&self, transactions: Vec<Transaction>) {
        self.state.write().transactions = transactions;
    }

    pub fn push_transaction(&self, transaction: Transaction) {
        self.state.write().transactions.push(transaction);
    }

    pub fn push_utxo(&self, utxo: UnspentOutput) {
        self.state.write().utxos.push(utxo);
    }

    pub fn transaction_count(&self) -> usize {
        self.state.read().transactions.len()
    }

    pub fn utxo_count(&self) -> usize {
        self.state.read().utxos.len()
    }
}

#[async_trait]
impl Provider for InMemoryProvider {
    async fn transactions_by_address(
        &self,
        addresses: &[String],
    ) -> Result<Vec<Transaction>, ProviderError> {
        let wanted: HashSet<&str> = addresses.iter().map(String::as_str).collect();
        let state = self.state.read();
        Ok(state
            .transactions
            .iter()
            .filter(|tx| tx.addresses().any(|a| wanted.contains(a)))
            .cloned()
            .collect())
    }

    async fn utxos_by_address(
        &self,
        addresses: &[String],
    ) -> Result<Vec<UnspentOutput>, ProviderError> {
        let wanted: HashSet<&str> = addresses.iter().map(String::as_str).collect();
        let state = self.state.read();
        Ok(state
            .utxos
            .iter()
            .filter(|u| wanted.contains(u.address.as_str()))
            .cloned()
            .collect())
    }
}
