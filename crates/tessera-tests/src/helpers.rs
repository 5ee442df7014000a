//! Shared fixtures for the integration tests.

use rand::RngCore;

use tessera_core::traits::{AddressDerivation, KeyManager};
use tessera_core::types::*;
use tessera_wallet::keys::{Blake3Derivation, InMemoryKeyManager};

/// BIP-39 test vector used by most fixtures.
pub const MNEMONIC_1: &str =
    "legal winner thank year wave sausage worth useful legal winner thank yellow";

/// Second account used as unrelated chain activity.
pub const MNEMONIC_2: &str =
    "letter advice cage absurd amount doctor acoustic avoid letter advice cage above";

/// External chain indices `0..SEED_USED_EXTERNAL` of account 1 have history in [`seed`].
pub const SEED_USED_EXTERNAL: u32 = 16;

/// Far-away address that belongs to nobody in the fixtures.
pub const FOREIGN_ADDRESS: &str = "foreign-merchant";

/// Public account for a mnemonic with an empty password.
pub fn account_for(mnemonic: &str) -> Account {
    InMemoryKeyManager::from_mnemonic(mnemonic, "")
        .unwrap()
        .public_account()
}

/// Derived address of `account` at `chain`/`index` under the default scheme.
pub fn address_at(account: &Account, chain: ChainType, index: u32) -> String {
    Blake3Derivation.derive_address(account, chain, index)
}

/// `bytes` random bytes, hex encoded.
pub fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Random transaction id.
pub fn random_tx_id() -> TxId {
    random_hex(32).parse().unwrap()
}

/// One input of [`generate_test_transaction`].
#[derive(Debug, Clone, Copy)]
pub struct TestInput {
    pub value: u64,
    pub chain: ChainType,
}

impl TestInput {
    pub fn new(value: u64, chain: ChainType) -> Self {
        Self { value, chain }
    }
}

/// Build a transaction spending from consecutive addresses of `account`.
///
/// Input `i` spends from `test_inputs[i].chain` at index `lower_bound + i`,
/// pointing at a random previous transaction.
pub fn generate_test_transaction(
    account: &Account,
    lower_bound: u32,
    test_inputs: &[TestInput],
    outputs: Vec<TransactionOutput>,
) -> Transaction {
    let inputs = test_inputs
        .iter()
        .zip(lower_bound..)
        .map(|(input, index)| TransactionInput {
            pointer: OutPoint {
                id: random_tx_id(),
                index: 0,
            },
            value: TransactionOutput::new(address_at(account, input.chain, index), input.value),
        })
        .collect();

    Transaction {
        id: random_tx_id(),
        inputs,
        outputs,
    }
}

/// Transaction spending `count` addresses `0..count` of one chain to a foreign address.
pub fn spend_from_first(account: &Account, chain: ChainType, count: u32) -> Transaction {
    let inputs: Vec<TestInput> = (0..count).map(|_| TestInput::new(1_000_000, chain)).collect();
    generate_test_transaction(
        account,
        0,
        &inputs,
        vec![TransactionOutput::new(FOREIGN_ADDRESS, 6_000_000u64)],
    )
}

/// Transaction paying `value` to `account` at `chain`/`index`.
pub fn receive_at(account: &Account, chain: ChainType, index: u32, value: u64) -> Transaction {
    Transaction {
        id: random_tx_id(),
        inputs: vec![TransactionInput {
            pointer: OutPoint {
                id: random_tx_id(),
                index: 0,
            },
            value: TransactionOutput::new(FOREIGN_ADDRESS, value),
        }],
        outputs: vec![TransactionOutput::new(address_at(account, chain, index), value)],
    }
}

/// The unspent output created by a [`receive_at`] transaction.
pub fn unspent_from(tx: &Transaction) -> UnspentOutput {
    let output = &tx.outputs[0];
    UnspentOutput {
        id: tx.id,
        index: 0,
        address: output.address.clone(),
        value: output.value,
    }
}

/// Plain UTXO for selection tests, tagged so each outpoint is distinct.
pub fn make_utxo(tag: u32, value: u64) -> Utxo {
    let mut id = [0u8; 32];
    id[..4].copy_from_slice(&tag.to_be_bytes());
    Utxo {
        id: TxId(id),
        output_index: tag % 3,
        address: format!("addr-{tag}"),
        value: Amount::from(value),
        addressing: Addressing::new(ChainType::External, tag),
    }
}

/// Chain snapshot shared by the wallet flow tests.
#[derive(Debug, Clone)]
pub struct SeedData {
    pub utxos: Vec<UnspentOutput>,
    pub transactions: Vec<Transaction>,
}

/// Snapshot where account 1 has received on external indices
/// `0..SEED_USED_EXTERNAL` and never on its internal chain, and account 2
/// has unrelated activity on both chains.
pub fn seed() -> SeedData {
    let account1 = account_for(MNEMONIC_1);
    let account2 = account_for(MNEMONIC_2);

    let mut transactions = Vec::new();
    let mut utxos = Vec::new();

    for index in 0..SEED_USED_EXTERNAL {
        let tx = receive_at(&account1, ChainType::External, index, 1_000_000 + index as u64);
        utxos.push(unspent_from(&tx));
        transactions.push(tx);
    }
    for index in 0..5 {
        let tx = receive_at(&account2, ChainType::Internal, index, 250_000);
        utxos.push(unspent_from(&tx));
        transactions.push(tx);
    }
    transactions.push(spend_from_first(&account2, ChainType::External, 3));

    SeedData {
        utxos,
        transactions,
    }
}
