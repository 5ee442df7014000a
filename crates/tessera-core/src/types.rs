//! Core data model: accounts, derived addresses, UTXOs and payment outputs.
//!
//! All monetary values are exact integers ([`Amount`]); floating point is
//! never used for value arithmetic. Amounts are serialized as decimal strings
//! so that values wider than a JSON number survive a round trip.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::{EXTERNAL_CHAIN, INTERNAL_CHAIN, TX_ID_LEN};
use crate::error::{AmountError, ParseError};

/// An exact, non-negative monetary amount in the chain's smallest unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(u128);

impl Amount {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    /// The raw integer value.
    pub const fn value(self) -> u128 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Amount) -> Result<Amount, AmountError> {
        self.0.checked_add(rhs.0).map(Self).ok_or(AmountError::Overflow)
    }

    pub fn checked_sub(self, rhs: Amount) -> Result<Amount, AmountError> {
        self.0.checked_sub(rhs.0).map(Self).ok_or(AmountError::Underflow)
    }

    /// Sum a sequence of amounts, failing on overflow instead of wrapping.
    pub fn checked_sum<I>(amounts: I) -> Result<Amount, AmountError>
    where
        I: IntoIterator<Item = Amount>,
    {
        amounts
            .into_iter()
            .try_fold(Amount::ZERO, |acc, a| acc.checked_add(a))
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(value as u128)
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parse a plain decimal string. Signs, separators and fractions are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::Parse(s.to_string()));
        }
        s.parse::<u128>()
            .map(Self)
            .map_err(|_| AmountError::Parse(s.to_string()))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(u64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(s) => s.parse().map_err(serde::de::Error::custom),
            Repr::Number(n) => Ok(Amount::from(n)),
        }
    }
}

/// Which derivation chain an address belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainType {
    /// Receiving addresses handed out to counterparties.
    External,
    /// Change addresses used by the wallet itself.
    Internal,
}

impl ChainType {
    /// Both chains, external first.
    pub const ALL: [ChainType; 2] = [ChainType::External, ChainType::Internal];

    /// The `change` component of a derivation path (0 external, 1 internal).
    pub fn change_index(self) -> u8 {
        match self {
            ChainType::External => EXTERNAL_CHAIN,
            ChainType::Internal => INTERNAL_CHAIN,
        }
    }

    pub fn from_change_index(change: u8) -> Result<Self, ParseError> {
        match change {
            EXTERNAL_CHAIN => Ok(ChainType::External),
            INTERNAL_CHAIN => Ok(ChainType::Internal),
            other => Err(ParseError::InvalidChainType(other.to_string())),
        }
    }
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainType::External => f.write_str("external"),
            ChainType::Internal => f.write_str("internal"),
        }
    }
}

impl FromStr for ChainType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "external" => Ok(ChainType::External),
            "internal" => Ok(ChainType::Internal),
            other => Err(ParseError::InvalidChainType(other.to_string())),
        }
    }
}

/// Public key context of an account, from which addresses are derived.
///
/// Holds no secret material. Two accounts are equal exactly when their key
/// material is equal.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Account {
    public_key: [u8; 32],
    chain_code: [u8; 32],
}

impl Account {
    pub fn from_parts(public_key: [u8; 32], chain_code: [u8; 32]) -> Self {
        Self {
            public_key,
            chain_code,
        }
    }

    pub fn public_key(&self) -> &[u8; 32] {
        &self.public_key
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    /// Hex encoding of `public_key || chain_code`.
    pub fn to_hex(&self) -> String {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&self.public_key);
        bytes[32..].copy_from_slice(&self.chain_code);
        hex::encode(bytes)
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("public_key", &hex::encode(&self.public_key[..8]))
            .finish_non_exhaustive()
    }
}

impl FromStr for Account {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| ParseError::InvalidAccount(e.to_string()))?;
        if bytes.len() != 64 {
            return Err(ParseError::InvalidAccount(format!(
                "expected 64 bytes, got {}",
                bytes.len()
            )));
        }
        let mut public_key = [0u8; 32];
        let mut chain_code = [0u8; 32];
        public_key.copy_from_slice(&bytes[..32]);
        chain_code.copy_from_slice(&bytes[32..]);
        Ok(Self::from_parts(public_key, chain_code))
    }
}

impl Serialize for Account {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Account {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An address derived at a specific index of a chain.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DerivedAddress {
    pub index: u32,
    pub address: String,
    #[serde(rename = "type")]
    pub chain: ChainType,
}

impl DerivedAddress {
    /// The derivation path that produced this address.
    pub fn addressing(&self) -> Addressing {
        Addressing::new(self.chain, self.index)
    }
}

/// Derivation path recorded against a UTXO's address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Addressing {
    pub index: u32,
    /// 0 for external, 1 for internal.
    pub change: u8,
}

impl Addressing {
    pub fn new(chain: ChainType, index: u32) -> Self {
        Self {
            index,
            change: chain.change_index(),
        }
    }

    pub fn chain(&self) -> Result<ChainType, ParseError> {
        ChainType::from_change_index(self.change)
    }
}

/// A 32-byte transaction identifier, displayed as lowercase hex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TxId(pub [u8; TX_ID_LEN]);

impl TxId {
    pub fn from_bytes(bytes: [u8; TX_ID_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; TX_ID_LEN] {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for TxId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| ParseError::InvalidTxId(e.to_string()))?;
        let bytes: [u8; TX_ID_LEN] = bytes.try_into().map_err(|v: Vec<u8>| {
            ParseError::InvalidTxId(format!("expected {TX_ID_LEN} bytes, got {}", v.len()))
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for TxId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TxId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Reference to a specific output of a previous transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub id: TxId,
    pub index: u32,
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.index)
    }
}

/// An address/value pair, as found on transaction outputs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub address: String,
    pub value: Amount,
}

impl TransactionOutput {
    pub fn new(address: impl Into<String>, value: impl Into<Amount>) -> Self {
        Self {
            address: address.into(),
            value: value.into(),
        }
    }
}

/// A payment target supplied by the caller. Value must be positive.
pub type PaymentOutput = TransactionOutput;

/// The change output produced by coin selection.
pub type ChangeOutput = TransactionOutput;

/// A transaction input: the outpoint it spends and the output it consumed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub pointer: OutPoint,
    pub value: TransactionOutput,
}

/// A transaction as indexed by a provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxId,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
}

impl Transaction {
    /// Every address on an input or output, inputs first, with repeats.
    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.inputs
            .iter()
            .map(|input| input.value.address.as_str())
            .chain(self.outputs.iter().map(|output| output.address.as_str()))
    }

    /// Whether `address` appears on any input or output.
    pub fn touches(&self, address: &str) -> bool {
        self.addresses().any(|a| a == address)
    }
}

/// An unspent output as reported by a provider, before the wallet attaches
/// its derivation path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentOutput {
    pub id: TxId,
    pub index: u32,
    pub address: String,
    pub value: Amount,
}

impl UnspentOutput {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint {
            id: self.id,
            index: self.index,
        }
    }

    pub fn with_addressing(self, addressing: Addressing) -> Utxo {
        Utxo {
            id: self.id,
            output_index: self.index,
            address: self.address,
            value: self.value,
            addressing,
        }
    }
}

/// A spendable output together with the derivation path of its address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub id: TxId,
    #[serde(rename = "index")]
    pub output_index: u32,
    pub address: String,
    pub value: Amount,
    pub addressing: Addressing,
}

impl Utxo {
    pub fn outpoint(&self) -> OutPoint {
        OutPoint {
            id: self.id,
            index: self.output_index,
        }
    }
}

/// Inputs chosen by coin selection and the resulting change, if any.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionResult {
    /// Selected UTXOs in the order they were accumulated.
    pub inputs: Vec<Utxo>,
    pub change_output: Option<ChangeOutput>,
}

impl SelectionResult {
    pub fn total_input(&self) -> Result<Amount, AmountError> {
        Amount::checked_sum(self.inputs.iter().map(|u| u.value))
    }

    /// Value of the change output, zero when none was emitted.
    pub fn change_value(&self) -> Amount {
        self.change_output
            .as_ref()
            .map(|c| c.value)
            .unwrap_or(Amount::ZERO)
    }
}
