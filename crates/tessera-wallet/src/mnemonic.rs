//! BIP-39 mnemonic generation and seed recovery.

use bip39::{Language, Mnemonic};
use rand::RngCore;
use zeroize::Zeroize;

use crate::error::WalletError;
use crate::keys::Seed;

/// Generate a fresh 24-word English mnemonic from the OS RNG.
pub fn generate_mnemonic() -> String {
    let mut entropy = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut entropy);
    let phrase = Mnemonic::from_entropy_in(Language::English, &entropy)
        .expect("32 bytes always produces valid mnemonic")
        .to_string();
    entropy.zeroize();
    phrase
}

/// Parse a mnemonic phrase, normalizing whitespace and case first.
pub fn parse_mnemonic(phrase: &str) -> Result<Mnemonic, WalletError> {
    let normalized = phrase
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    Mnemonic::parse_in(Language::English, &normalized)
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))
}

/// Stretch a mnemonic and password into the 64-byte BIP-39 seed.
pub fn mnemonic_to_seed(phrase: &str, password: &str) -> Result<Seed, WalletError> {
    let mnemonic = parse_mnemonic(phrase)?;
    Ok(Seed::from_bytes(mnemonic.to_seed(password)))
}
