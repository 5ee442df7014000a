//! Gap-limited address discovery.
//!
//! Addresses are derived in windows of `gap_limit` consecutive indices.
//! Each window costs one batched provider query; addresses inside it are
//! then checked in ascending index order. Windows themselves are visited in
//! ascending order, so the first address found without history is the
//! lowest-index unused address of the chain, however far past the first
//! window it lies.
//!
//! Discovery is read-only. Dropping a discovery future between provider
//! queries leaves nothing to clean up.

use std::collections::HashSet;

use tracing::{debug, trace, warn};

use tessera_core::traits::{AddressDerivation, Provider};
use tessera_core::types::{Account, ChainType, DerivedAddress};

use crate::config::DiscoveryConfig;
use crate::error::WalletError;

/// Derive the addresses at indices `lower..=upper` of `chain`, ascending.
///
/// Pure; performs no I/O. Fails with `InvalidRange` when `lower > upper`.
pub fn derive_range<D>(
    derivation: &D,
    account: &Account,
    chain: ChainType,
    lower: u32,
    upper: u32,
) -> Result<Vec<DerivedAddress>, WalletError>
where
    D: AddressDerivation + ?Sized,
{
    if lower > upper {
        return Err(WalletError::InvalidRange { lower, upper });
    }
    Ok((lower..=upper)
        .map(|index| DerivedAddress {
            index,
            address: derivation.derive_address(account, chain, index),
            chain,
        })
        .collect())
}

/// Find the lowest-index address of `chain` with no transaction history.
///
/// Provider failures abort the scan and surface as `WalletError::Provider`.
/// A scan that visits `config.max_windows` windows, or runs out of `u32`
/// indices, fails with `DiscoveryExhausted`.
pub async fn find_next_unused<P, D>(
    provider: &P,
    derivation: &D,
    account: &Account,
    chain: ChainType,
    config: &DiscoveryConfig,
) -> Result<DerivedAddress, WalletError>
where
    P: Provider + ?Sized,
    D: AddressDerivation + ?Sized,
{
    config.validate()?;

    let mut scanned: u64 = 0;
    let mut windows = Windows::new(config.gap_limit);

    for round in 0..config.max_windows {
        let Some((lower, upper)) = windows.next() else {
            break;
        };
        let window = derive_range(derivation, account, chain, lower, upper)?;
        let used = used_in_window(provider, &window).await?;
        scanned += window.len() as u64;

        debug!(%chain, lower, upper, used = used.len(), "discovery: scanned window");

        if let Some(free) = window.into_iter().find(|d| !used.contains(&d.address)) {
            debug!(
                %chain,
                index = free.index,
                windows = round + 1,
                "discovery: found next unused address"
            );
            return Ok(free);
        }
    }

    warn!(%chain, scanned, "discovery: exhausted without finding an unused address");
    Err(WalletError::DiscoveryExhausted { chain, scanned })
}

/// Recover every address of `chain` up to the highest used index.
///
/// Scanning stops once `gap_limit` consecutive addresses after the last
/// used one have no history. Returns an empty vector when no address of the
/// chain has ever been used.
pub async fn discover_used<P, D>(
    provider: &P,
    derivation: &D,
    account: &Account,
    chain: ChainType,
    config: &DiscoveryConfig,
) -> Result<Vec<DerivedAddress>, WalletError>
where
    P: Provider + ?Sized,
    D: AddressDerivation + ?Sized,
{
    config.validate()?;

    let mut derived: Vec<DerivedAddress> = Vec::new();
    let mut last_used: Option<u32> = None;
    let mut unused_run: u32 = 0;
    let mut windows = Windows::new(config.gap_limit);

    for _ in 0..config.max_windows {
        let Some((lower, upper)) = windows.next() else {
            break;
        };
        let window = derive_range(derivation, account, chain, lower, upper)?;
        let used = used_in_window(provider, &window).await?;
        trace!(%chain, lower, upper, used = used.len(), "discovery: recovery window");

        for address in window {
            if used.contains(&address.address) {
                last_used = Some(address.index);
                unused_run = 0;
            } else {
                unused_run += 1;
            }
            derived.push(address);

            if unused_run >= config.gap_limit {
                let keep = last_used.map(|i| i as usize + 1).unwrap_or(0);
                derived.truncate(keep);
                debug!(%chain, used_addresses = keep, "discovery: recovered used addresses");
                return Ok(derived);
            }
        }
    }

    let scanned = derived.len() as u64;
    warn!(%chain, scanned, "discovery: recovery exhausted before reaching the gap limit");
    Err(WalletError::DiscoveryExhausted { chain, scanned })
}

/// Addresses from `window` that appear on any transaction.
async fn used_in_window<P>(
    provider: &P,
    window: &[DerivedAddress],
) -> Result<HashSet<String>, WalletError>
where
    P: Provider + ?Sized,
{
    let addresses: Vec<String> = window.iter().map(|d| d.address.clone()).collect();
    let transactions = provider.transactions_by_address(&addresses).await?;

    let wanted: HashSet<&str> = addresses.iter().map(String::as_str).collect();
    Ok(transactions
        .iter()
        .flat_map(|tx| tx.addresses())
        .filter(|a| wanted.contains(a))
        .map(str::to_string)
        .collect())
}

/// Consecutive `[lower, upper]` index windows starting at 0.
///
/// The final window is clipped at `u32::MAX`; iteration ends after it.
struct Windows {
    next_lower: Option<u32>,
    gap_limit: u32,
}

impl Windows {
    fn new(gap_limit: u32) -> Self {
        Self {
            next_lower: Some(0),
            gap_limit,
        }
    }
}

impl Iterator for Windows {
    type Item = (u32, u32);

    fn next(&mut self) -> Option<Self::Item> {
        let lower = self.next_lower?;
        let upper = lower.saturating_add(self.gap_limit - 1);
        self.next_lower = upper.checked_add(1);
        Some((lower, upper))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tessera_core::error::ProviderError;
    use tessera_core::types::{
        Amount, OutPoint, Transaction, TransactionInput, TransactionOutput, TxId, UnspentOutput,
    };

    // ------------------------------------------------------------------
    // Mock: AddressDerivation
    // ------------------------------------------------------------------

    struct LabelDerivation;

    impl AddressDerivation for LabelDerivation {
        fn derive_address(&self, _account: &Account, chain: ChainType, index: u32) -> String {
            format!("{chain}-{index}")
        }
    }

    // ------------------------------------------------------------------
    // Mock: Provider
    // ------------------------------------------------------------------

    /// Provider with one synthetic transaction per used address.
    struct MockProvider {
        used: HashSet<String>,
        queries: Mutex<Vec<Vec<String>>>,
    }

    impl MockProvider {
        fn new(used: impl IntoIterator<Item = String>) -> Self {
            Self {
                used: used.into_iter().collect(),
                queries: Mutex::new(Vec::new()),
            }
        }

        fn with_used(chain: ChainType, indices: impl IntoIterator<Item = u32>) -> Self {
            Self::new(indices.into_iter().map(|i| format!("{chain}-{i}")))
        }

        fn query_count(&self) -> usize {
            self.queries.lock().len()
        }
    }

    #[async_trait]
    impl Provider for MockProvider {
        async fn transactions_by_address(
            &self,
            addresses: &[String],
        ) -> Result<Vec<Transaction>, ProviderError> {
            self.queries.lock().push(addresses.to_vec());
            Ok(addresses
                .iter()
                .filter(|a| self.used.contains(*a))
                .enumerate()
                .map(|(n, a)| Transaction {
                    id: TxId([n as u8; 32]),
                    inputs: vec![TransactionInput {
                        pointer: OutPoint {
                            id: TxId([0xff; 32]),
                            index: 0,
                        },
                        value: TransactionOutput::new(a.clone(), Amount::new(1_000_000)),
                    }],
                    outputs: vec![TransactionOutput::new("payee", Amount::new(900_000))],
                })
                .collect())
        }

        async fn utxos_by_address(
            &self,
            _addresses: &[String],
        ) -> Result<Vec<UnspentOutput>, ProviderError> {
            Ok(Vec::new())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl Provider for FailingProvider {
        async fn transactions_by_address(
            &self,
            _addresses: &[String],
        ) -> Result<Vec<Transaction>, ProviderError> {
            Err(ProviderError::Unavailable("connection reset".into()))
        }

        async fn utxos_by_address(
            &self,
            _addresses: &[String],
        ) -> Result<Vec<UnspentOutput>, ProviderError> {
            Err(ProviderError::Unavailable("connection reset".into()))
        }
    }

    fn account() -> Account {
        Account::from_parts([7; 32], [8; 32])
    }

    fn gap(n: u32) -> DiscoveryConfig {
        DiscoveryConfig::with_gap_limit(n)
    }

    // --- derive_range ---

    #[test]
    fn derive_range_is_inclusive_and_ascending() {
        let range = derive_range(&LabelDerivation, &account(), ChainType::External, 3, 7).unwrap();
        assert_eq!(range.len(), 5);
        let indices: Vec<u32> = range.iter().map(|d| d.index).collect();
        assert_eq!(indices, vec![3, 4, 5, 6, 7]);
        assert!(range.iter().all(|d| d.chain == ChainType::External));
        assert_eq!(range[0].address, "external-3");
    }

    #[test]
    fn derive_range_single_index() {
        let range = derive_range(&LabelDerivation, &account(), ChainType::Internal, 16, 16).unwrap();
        assert_eq!(range.len(), 1);
        assert_eq!(range[0].index, 16);
        assert_eq!(range[0].address, "internal-16");
    }

    #[test]
    fn derive_range_rejects_inverted_bounds() {
        let err = derive_range(&LabelDerivation, &account(), ChainType::External, 5, 4).unwrap_err();
        assert_eq!(err, WalletError::InvalidRange { lower: 5, upper: 4 });
    }

    #[test]
    fn derive_range_matches_single_derivations() {
        let acct = account();
        let range = derive_range(&LabelDerivation, &acct, ChainType::Internal, 0, 9).unwrap();
        for d in range {
            assert_eq!(
                d.address,
                LabelDerivation.derive_address(&acct, ChainType::Internal, d.index)
            );
        }
    }

    #[test]
    fn derive_range_at_top_of_index_space() {
        let range =
            derive_range(&LabelDerivation, &account(), ChainType::External, u32::MAX - 1, u32::MAX)
                .unwrap();
        assert_eq!(range.len(), 2);
        assert_eq!(range[1].index, u32::MAX);
    }

    // --- windows ---

    #[test]
    fn windows_are_contiguous() {
        let w: Vec<_> = Windows::new(20).take(3).collect();
        assert_eq!(w, vec![(0, 19), (20, 39), (40, 59)]);
    }

    #[test]
    fn windows_clip_at_index_space_end() {
        let mut w = Windows {
            next_lower: Some(u32::MAX - 2),
            gap_limit: 10,
        };
        assert_eq!(w.next(), Some((u32::MAX - 2, u32::MAX)));
        assert_eq!(w.next(), None);
    }

    // --- find_next_unused ---

    #[tokio::test]
    async fn empty_history_returns_index_zero() {
        let provider = MockProvider::new([]);
        for chain in ChainType::ALL {
            let next = find_next_unused(&provider, &LabelDerivation, &account(), chain, &gap(20))
                .await
                .unwrap();
            assert_eq!(next.index, 0);
            assert_eq!(next.chain, chain);
        }
    }

    #[tokio::test]
    async fn finds_gap_within_first_window() {
        let provider = MockProvider::with_used(ChainType::External, 0..15);
        let next = find_next_unused(
            &provider,
            &LabelDerivation,
            &account(),
            ChainType::External,
            &gap(20),
        )
        .await
        .unwrap();
        assert_eq!(next.index, 15);
        assert_eq!(next.address, "external-15");
        assert_eq!(provider.query_count(), 1);
    }

    #[tokio::test]
    async fn advances_across_windows() {
        let provider = MockProvider::with_used(ChainType::Internal, 0..55);
        let next = find_next_unused(
            &provider,
            &LabelDerivation,
            &account(),
            ChainType::Internal,
            &gap(20),
        )
        .await
        .unwrap();
        assert_eq!(next.index, 55);
        assert_eq!(provider.query_count(), 3);
    }

    #[tokio::test]
    async fn returns_lowest_hole_not_first_after_last_used() {
        let used = (0..10).chain(11..30);
        let provider = MockProvider::with_used(ChainType::External, used);
        let next = find_next_unused(
            &provider,
            &LabelDerivation,
            &account(),
            ChainType::External,
            &gap(20),
        )
        .await
        .unwrap();
        assert_eq!(next.index, 10);
    }

    #[tokio::test]
    async fn history_on_other_chain_is_ignored() {
        let provider = MockProvider::with_used(ChainType::External, 0..40);
        let next = find_next_unused(
            &provider,
            &LabelDerivation,
            &account(),
            ChainType::Internal,
            &gap(20),
        )
        .await
        .unwrap();
        assert_eq!(next.index, 0);
    }

    #[tokio::test]
    async fn window_boundary_exactly_full() {
        let provider = MockProvider::with_used(ChainType::External, 0..20);
        let next = find_next_unused(
            &provider,
            &LabelDerivation,
            &account(),
            ChainType::External,
            &gap(20),
        )
        .await
        .unwrap();
        assert_eq!(next.index, 20);
        assert_eq!(provider.query_count(), 2);
    }

    #[tokio::test]
    async fn queries_cover_one_window_each_in_order() {
        let provider = MockProvider::with_used(ChainType::External, 0..7);
        find_next_unused(
            &provider,
            &LabelDerivation,
            &account(),
            ChainType::External,
            &gap(3),
        )
        .await
        .unwrap();
        let queries = provider.queries.lock();
        assert_eq!(queries.len(), 3);
        assert_eq!(queries[0], vec!["external-0", "external-1", "external-2"]);
        assert_eq!(queries[2], vec!["external-6", "external-7", "external-8"]);
    }

    #[tokio::test]
    async fn exhausts_after_max_windows() {
        let provider = MockProvider::with_used(ChainType::External, 0..100);
        let config = DiscoveryConfig {
            gap_limit: 10,
            max_windows: 4,
        };
        let err = find_next_unused(
            &provider,
            &LabelDerivation,
            &account(),
            ChainType::External,
            &config,
        )
        .await
        .unwrap_err();
        assert_eq!(
            err,
            WalletError::DiscoveryExhausted {
                chain: ChainType::External,
                scanned: 40,
            }
        );
        assert_eq!(provider.query_count(), 4);
    }

    #[tokio::test]
    async fn provider_error_aborts_scan() {
        let err = find_next_unused(
            &FailingProvider,
            &LabelDerivation,
            &account(),
            ChainType::External,
            &gap(20),
        )
        .await
        .unwrap_err();
        assert_eq!(
            err,
            WalletError::Provider(ProviderError::Unavailable("connection reset".into()))
        );
    }

    #[tokio::test]
    async fn zero_gap_limit_rejected() {
        let provider = MockProvider::new([]);
        let err = find_next_unused(
            &provider,
            &LabelDerivation,
            &account(),
            ChainType::External,
            &gap(0),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WalletError::InvalidConfig(_)));
        assert_eq!(provider.query_count(), 0);
    }

    // --- discover_used ---

    #[tokio::test]
    async fn discover_used_empty_history() {
        let provider = MockProvider::new([]);
        let used = discover_used(
            &provider,
            &LabelDerivation,
            &account(),
            ChainType::External,
            &gap(20),
        )
        .await
        .unwrap();
        assert!(used.is_empty());
        assert_eq!(provider.query_count(), 1);
    }

    #[tokio::test]
    async fn discover_used_returns_prefix_through_last_used() {
        let provider = MockProvider::with_used(ChainType::Internal, [0, 1, 4]);
        let used = discover_used(
            &provider,
            &LabelDerivation,
            &account(),
            ChainType::Internal,
            &gap(20),
        )
        .await
        .unwrap();
        let indices: Vec<u32> = used.iter().map(|d| d.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn discover_used_follows_activity_into_later_windows() {
        // 19 unused addresses between 5 and 25 stay within the gap limit.
        let provider = MockProvider::with_used(ChainType::External, [5, 25, 44]);
        let used = discover_used(
            &provider,
            &LabelDerivation,
            &account(),
            ChainType::External,
            &gap(20),
        )
        .await
        .unwrap();
        assert_eq!(used.last().map(|d| d.index), Some(44));
        assert_eq!(used.len(), 45);
    }

    #[tokio::test]
    async fn discover_used_stops_at_gap_limit() {
        // Index 30 lies 25 unused addresses past index 4: beyond a gap of 20.
        let provider = MockProvider::with_used(ChainType::External, [4, 30]);
        let used = discover_used(
            &provider,
            &LabelDerivation,
            &account(),
            ChainType::External,
            &gap(20),
        )
        .await
        .unwrap();
        assert_eq!(used.len(), 5);
    }

    #[tokio::test]
    async fn discover_used_exhausts_after_max_windows() {
        let provider = MockProvider::with_used(ChainType::External, 0..50);
        let config = DiscoveryConfig {
            gap_limit: 5,
            max_windows: 2,
        };
        let err = discover_used(
            &provider,
            &LabelDerivation,
            &account(),
            ChainType::External,
            &config,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WalletError::DiscoveryExhausted { scanned: 10, .. }));
    }
}
