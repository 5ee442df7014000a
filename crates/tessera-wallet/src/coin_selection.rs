//! FirstMatchFirst coin selection.
//!
//! Candidate UTXOs are consumed strictly in the order the caller supplies
//! them until their running total covers the payment outputs. There is no
//! reordering, fee heuristic or randomness: identical inputs always yield
//! the identical selection. Selection is advisory and read-only; nothing is
//! marked as spent.

use std::collections::HashSet;

use tracing::debug;

use tessera_core::types::{Amount, ChangeOutput, PaymentOutput, SelectionResult, Utxo};

use crate::config::{SelectionConfig, ZeroChangePolicy};
use crate::error::WalletError;

/// Select inputs for `outputs` from `available_utxos` using the default
/// configuration (exact matches produce no change output).
pub fn select_inputs_and_change_output(
    outputs: &[PaymentOutput],
    available_utxos: &[Utxo],
    change_address: &str,
) -> Result<SelectionResult, WalletError> {
    CoinSelector::default().select(outputs, available_utxos, change_address)
}

/// FirstMatchFirst coin selector.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoinSelector {
    config: SelectionConfig,
}

impl CoinSelector {
    pub fn new(config: SelectionConfig) -> Self {
        Self { config }
    }

    /// Select UTXOs to cover `outputs`.
    ///
    /// # Arguments
    /// - `outputs`: payment targets; non-empty, every value positive
    /// - `available_utxos`: candidate pool, consumed in this order
    /// - `change_address`: destination of any change
    ///
    /// A candidate whose outpoint already appeared earlier in the pool is
    /// skipped. Fails with `NotEnoughInput` when the whole pool cannot cover
    /// the target.
    pub fn select(
        &self,
        outputs: &[PaymentOutput],
        available_utxos: &[Utxo],
        change_address: &str,
    ) -> Result<SelectionResult, WalletError> {
        let target = payment_target(outputs)?;

        let mut seen = HashSet::with_capacity(available_utxos.len());
        let mut inputs = Vec::new();
        let mut total = Amount::ZERO;

        for utxo in available_utxos {
            if !seen.insert(utxo.outpoint()) {
                debug!(outpoint = %utxo.outpoint(), "selection: skipping duplicate candidate");
                continue;
            }
            // total < target here, so the shortfall never underflows.
            let shortfall = target.checked_sub(total)?;
            inputs.push(utxo.clone());

            if utxo.value >= shortfall {
                let change = utxo.value.checked_sub(shortfall)?;
                return Ok(self.finish(inputs, target, change, change_address));
            }
            total = total.checked_add(utxo.value)?;
        }

        debug!(%total, %target, candidates = available_utxos.len(), "selection: not enough input");
        Err(WalletError::NotEnoughInput {
            available: total,
            required: target,
        })
    }

    fn finish(
        &self,
        inputs: Vec<Utxo>,
        target: Amount,
        change: Amount,
        change_address: &str,
    ) -> SelectionResult {
        let change_output = if !change.is_zero() || self.config.zero_change == ZeroChangePolicy::Emit
        {
            Some(ChangeOutput::new(change_address, change))
        } else {
            None
        };

        debug!(
            inputs = inputs.len(),
            %target,
            %change,
            "selection: covered payment"
        );

        SelectionResult {
            inputs,
            change_output,
        }
    }
}

/// Total value of the payment outputs, validating them on the way.
fn payment_target(outputs: &[PaymentOutput]) -> Result<Amount, WalletError> {
    if outputs.is_empty() {
        return Err(WalletError::NoOutputs);
    }
    if let Some((i, output)) = outputs.iter().enumerate().find(|(_, o)| o.value.is_zero()) {
        return Err(WalletError::InvalidAmount(format!(
            "output {i} to {} has zero value",
            output.address
        )));
    }
    Ok(Amount::checked_sum(outputs.iter().map(|o| o.value))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::error::AmountError;
    use tessera_core::types::{Addressing, ChainType, TxId};

    fn make_utxo(tag: u8, value: u64) -> Utxo {
        Utxo {
            id: TxId([tag; 32]),
            output_index: 0,
            address: format!("addr-{tag}"),
            value: Amount::from(value),
            addressing: Addressing::new(ChainType::External, tag as u32),
        }
    }

    fn pay(value: u64) -> PaymentOutput {
        PaymentOutput::new("payee", value)
    }

    fn values(result: &SelectionResult) -> Vec<u128> {
        result.inputs.iter().map(|u| u.value.value()).collect()
    }

    #[test]
    fn first_utxo_covers_payment() {
        let utxos = vec![
            make_utxo(1, 600_000),
            make_utxo(2, 500_000),
            make_utxo(3, 330_000),
            make_utxo(4, 410_000),
        ];
        let result = select_inputs_and_change_output(&[pay(10_000)], &utxos, "change").unwrap();

        assert_eq!(values(&result), vec![600_000]);
        let change = result.change_output.unwrap();
        assert_eq!(change.address, "change");
        assert_eq!(change.value, Amount::new(590_000));
    }

    #[test]
    fn accumulates_in_supplied_order() {
        let utxos = vec![make_utxo(1, 300), make_utxo(2, 300), make_utxo(3, 5_000)];
        let result = select_inputs_and_change_output(&[pay(500)], &utxos, "change").unwrap();

        assert_eq!(values(&result), vec![300, 300]);
        assert_eq!(result.change_value(), Amount::new(100));
    }

    #[test]
    fn sums_multiple_outputs() {
        let utxos = vec![make_utxo(1, 700), make_utxo(2, 700)];
        let outputs = vec![pay(400), PaymentOutput::new("other", 600u64)];
        let result = select_inputs_and_change_output(&outputs, &utxos, "change").unwrap();

        assert_eq!(result.inputs.len(), 2);
        assert_eq!(result.change_value(), Amount::new(400));
    }

    #[test]
    fn insufficient_input_fails() {
        let utxos = vec![make_utxo(1, 1_000), make_utxo(2, 1_000)];
        let err = select_inputs_and_change_output(&[pay(1_000_000)], &utxos, "change").unwrap_err();
        assert_eq!(
            err,
            WalletError::NotEnoughInput {
                available: Amount::new(2_000),
                required: Amount::new(1_000_000),
            }
        );
        assert!(err.to_string().contains("NotEnoughInput"));
    }

    #[test]
    fn empty_pool_fails_with_not_enough_input() {
        let err = select_inputs_and_change_output(&[pay(1)], &[], "change").unwrap_err();
        assert!(matches!(err, WalletError::NotEnoughInput { available, .. } if available.is_zero()));
    }

    #[test]
    fn exact_match_omits_change_by_default() {
        let utxos = vec![make_utxo(1, 400), make_utxo(2, 600)];
        let result = select_inputs_and_change_output(&[pay(1_000)], &utxos, "change").unwrap();
        assert_eq!(result.inputs.len(), 2);
        assert!(result.change_output.is_none());
    }

    #[test]
    fn exact_match_emits_zero_change_when_configured() {
        let selector = CoinSelector::new(SelectionConfig {
            zero_change: ZeroChangePolicy::Emit,
        });
        let utxos = vec![make_utxo(1, 1_000)];
        let result = selector.select(&[pay(1_000)], &utxos, "change").unwrap();
        let change = result.change_output.unwrap();
        assert_eq!(change.address, "change");
        assert!(change.value.is_zero());
    }

    #[test]
    fn duplicate_candidates_selected_once() {
        let dup = make_utxo(1, 500);
        let utxos = vec![dup.clone(), dup, make_utxo(2, 500)];
        let result = select_inputs_and_change_output(&[pay(800)], &utxos, "change").unwrap();

        let outpoints: Vec<_> = result.inputs.iter().map(Utxo::outpoint).collect();
        assert_eq!(outpoints.len(), 2);
        assert_ne!(outpoints[0], outpoints[1]);
        assert_eq!(result.change_value(), Amount::new(200));
    }

    #[test]
    fn duplicates_do_not_count_towards_available() {
        let dup = make_utxo(1, 500);
        let err = select_inputs_and_change_output(&[pay(900)], &[dup.clone(), dup], "change")
            .unwrap_err();
        assert!(matches!(err, WalletError::NotEnoughInput { available, .. } if available == Amount::new(500)));
    }

    #[test]
    fn same_tx_different_output_index_is_distinct() {
        let a = make_utxo(1, 500);
        let mut b = a.clone();
        b.output_index = 1;
        let result = select_inputs_and_change_output(&[pay(900)], &[a, b], "change").unwrap();
        assert_eq!(result.inputs.len(), 2);
    }

    #[test]
    fn no_outputs_rejected() {
        let err = select_inputs_and_change_output(&[], &[make_utxo(1, 10)], "change").unwrap_err();
        assert_eq!(err, WalletError::NoOutputs);
    }

    #[test]
    fn zero_value_output_rejected() {
        let outputs = vec![pay(10), PaymentOutput::new("nothing", 0u64)];
        let err = select_inputs_and_change_output(&outputs, &[make_utxo(1, 10)], "change")
            .unwrap_err();
        assert!(matches!(err, WalletError::InvalidAmount(msg) if msg.contains("output 1")));
    }

    #[test]
    fn overflowing_target_rejected() {
        let outputs = vec![
            PaymentOutput::new("a", Amount::new(u128::MAX)),
            PaymentOutput::new("b", Amount::new(1)),
        ];
        let err = select_inputs_and_change_output(&outputs, &[], "change").unwrap_err();
        assert_eq!(err, WalletError::Amount(AmountError::Overflow));
    }

    #[test]
    fn covering_input_near_max_does_not_overflow() {
        let big = Utxo {
            value: Amount::new(u128::MAX),
            ..make_utxo(2, 0)
        };
        let utxos = vec![make_utxo(1, 10), big];
        let result = select_inputs_and_change_output(&[pay(100)], &utxos, "change").unwrap();

        assert_eq!(result.inputs.len(), 2);
        assert_eq!(result.change_value(), Amount::new(u128::MAX - 90));
    }

    #[test]
    fn order_changes_selection_not_outcome() {
        let forward = vec![make_utxo(1, 100), make_utxo(2, 900)];
        let reverse: Vec<Utxo> = forward.iter().rev().cloned().collect();

        let a = select_inputs_and_change_output(&[pay(150)], &forward, "change").unwrap();
        let b = select_inputs_and_change_output(&[pay(150)], &reverse, "change").unwrap();

        assert_eq!(values(&a), vec![100, 900]);
        assert_eq!(values(&b), vec![900]);
        assert_eq!(a.change_value(), Amount::new(850));
        assert_eq!(b.change_value(), Amount::new(750));
    }

    #[test]
    fn deterministic_for_identical_input() {
        let utxos = vec![make_utxo(1, 250), make_utxo(2, 250), make_utxo(3, 250)];
        let a = select_inputs_and_change_output(&[pay(600)], &utxos, "change").unwrap();
        let b = select_inputs_and_change_output(&[pay(600)], &utxos, "change").unwrap();
        assert_eq!(a, b);
    }
}
