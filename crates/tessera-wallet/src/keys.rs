//! Seed handling, account keys and deterministic address derivation.
//!
//! Account keys are derived from the BIP-39 seed with BLAKE3's key
//! derivation function. Addresses are derived from the *public* account
//! alone (public key plus chain code), so discovery never touches secret
//! material. Encoded addresses are Base58 strings of
//! `version || blake3 hash || 4-byte checksum`.

use ed25519_dalek::SigningKey;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use tessera_core::traits::{AddressDerivation, KeyManager};
use tessera_core::types::{Account, ChainType};

use crate::error::WalletError;
use crate::mnemonic::mnemonic_to_seed;

/// BLAKE3 KDF context for the account signing key.
const ACCOUNT_KEY_CONTEXT: &str = "tessera-wallet account key v1";

/// BLAKE3 KDF context for the account chain code.
const CHAIN_CODE_CONTEXT: &str = "tessera-wallet chain code v1";

/// Version byte prefixed to every encoded address.
pub const ADDRESS_VERSION: u8 = 0x82;

/// Length of the trailing address checksum.
const CHECKSUM_LEN: usize = 4;

/// A 64-byte BIP-39 seed.
///
/// Secret material is zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Seed {
    bytes: [u8; 64],
}

impl Seed {
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self { bytes }
    }

    /// Get the raw seed bytes. Handle with care.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.bytes
    }
}

impl Clone for Seed {
    fn clone(&self) -> Self {
        Self { bytes: self.bytes }
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seed")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Key manager holding a seed in memory.
///
/// Hands out the public [`Account`] for index `account_index`; the seed
/// itself never leaves this struct.
pub struct InMemoryKeyManager {
    seed: Seed,
    account_index: u32,
    account: Account,
}

impl InMemoryKeyManager {
    /// Key manager for account 0 of a mnemonic/password pair.
    pub fn from_mnemonic(phrase: &str, password: &str) -> Result<Self, WalletError> {
        Self::from_mnemonic_at(phrase, password, 0)
    }

    /// Key manager for an explicit account index.
    pub fn from_mnemonic_at(
        phrase: &str,
        password: &str,
        account_index: u32,
    ) -> Result<Self, WalletError> {
        let seed = mnemonic_to_seed(phrase, password)?;
        Ok(Self::from_seed(seed, account_index))
    }

    pub fn from_seed(seed: Seed, account_index: u32) -> Self {
        let account = derive_account(&seed, account_index);
        Self {
            seed,
            account_index,
            account,
        }
    }

    pub fn account_index(&self) -> u32 {
        self.account_index
    }

    /// Key manager for another account of the same seed.
    pub fn account_at(&self, account_index: u32) -> Self {
        Self::from_seed(self.seed.clone(), account_index)
    }
}

impl KeyManager for InMemoryKeyManager {
    fn public_account(&self) -> Account {
        self.account.clone()
    }
}

impl fmt::Debug for InMemoryKeyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryKeyManager")
            .field("seed", &self.seed)
            .field("account_index", &self.account_index)
            .field("account", &self.account)
            .finish()
    }
}

/// Derive the public account context for `account_index` of `seed`.
fn derive_account(seed: &Seed, account_index: u32) -> Account {
    let mut ikm = Vec::with_capacity(68);
    ikm.extend_from_slice(seed.as_bytes());
    ikm.extend_from_slice(&account_index.to_le_bytes());

    let mut secret = blake3::derive_key(ACCOUNT_KEY_CONTEXT, &ikm);
    let signing_key = SigningKey::from_bytes(&secret);
    secret.zeroize();

    let public_key = signing_key.verifying_key().to_bytes();
    let chain_code = blake3::derive_key(CHAIN_CODE_CONTEXT, &ikm);
    ikm.zeroize();

    Account::from_parts(public_key, chain_code)
}

/// Address derivation keyed by the account chain code.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Derivation;

impl AddressDerivation for Blake3Derivation {
    fn derive_address(&self, account: &Account, chain: ChainType, index: u32) -> String {
        let mut hasher = blake3::Hasher::new_keyed(account.chain_code());
        hasher.update(account.public_key());
        hasher.update(&[chain.change_index()]);
        hasher.update(&index.to_le_bytes());
        encode_address(hasher.finalize().as_bytes())
    }
}

fn encode_address(hash: &[u8; 32]) -> String {
    let mut payload = Vec::with_capacity(1 + hash.len() + CHECKSUM_LEN);
    payload.push(ADDRESS_VERSION);
    payload.extend_from_slice(hash);
    let checksum = blake3::hash(&payload);
    payload.extend_from_slice(&checksum.as_bytes()[..CHECKSUM_LEN]);
    bs58::encode(payload).into_string()
}
