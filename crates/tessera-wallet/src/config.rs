//! Tunables for discovery and coin selection.
//!
//! [`WalletConfig`] is threaded explicitly into every discovery and
//! selection call; there is no global state. Defaults match common HD
//! wallet practice and can be overridden programmatically or from the
//! environment with [`WalletConfig::from_env`].

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use tessera_core::constants::{DEFAULT_GAP_LIMIT, DEFAULT_MAX_DISCOVERY_WINDOWS};

use crate::error::WalletError;

/// Environment variable overriding [`DiscoveryConfig::gap_limit`].
pub const ENV_GAP_LIMIT: &str = "TESSERA_GAP_LIMIT";
/// Environment variable overriding [`DiscoveryConfig::max_windows`].
pub const ENV_MAX_DISCOVERY_WINDOWS: &str = "TESSERA_MAX_DISCOVERY_WINDOWS";
/// Environment variable overriding [`SelectionConfig::zero_change`].
pub const ENV_ZERO_CHANGE: &str = "TESSERA_ZERO_CHANGE";

/// Address discovery settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Addresses derived and checked per window.
    pub gap_limit: u32,
    /// Windows a single scan may visit before failing with `DiscoveryExhausted`.
    pub max_windows: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            gap_limit: DEFAULT_GAP_LIMIT,
            max_windows: DEFAULT_MAX_DISCOVERY_WINDOWS,
        }
    }
}

impl DiscoveryConfig {
    pub fn with_gap_limit(gap_limit: u32) -> Self {
        Self {
            gap_limit,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), WalletError> {
        if self.gap_limit == 0 {
            return Err(WalletError::InvalidConfig("gap limit must be positive".into()));
        }
        if self.max_windows == 0 {
            return Err(WalletError::InvalidConfig(
                "max discovery windows must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// What to do when selected inputs cover the outputs exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroChangePolicy {
    /// Return no change output.
    #[default]
    Omit,
    /// Return a zero-value change output to the change address.
    Emit,
}

impl FromStr for ZeroChangePolicy {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "omit" => Ok(ZeroChangePolicy::Omit),
            "emit" => Ok(ZeroChangePolicy::Emit),
            other => Err(WalletError::InvalidConfig(format!(
                "zero change policy must be `omit` or `emit`, got `{other}`"
            ))),
        }
    }
}

/// Coin selection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionConfig {
    pub zero_change: ZeroChangePolicy,
}

/// Combined configuration for a [`Wallet`](crate::wallet::Wallet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WalletConfig {
    pub discovery: DiscoveryConfig,
    pub selection: SelectionConfig,
}

impl WalletConfig {
    /// Defaults overridden by any `TESSERA_*` environment variables that are set.
    pub fn from_env() -> Result<Self, WalletError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) but reading from an arbitrary source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WalletError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_GAP_LIMIT) {
            config.discovery.gap_limit = parse_u32(ENV_GAP_LIMIT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_DISCOVERY_WINDOWS) {
            config.discovery.max_windows = parse_u32(ENV_MAX_DISCOVERY_WINDOWS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_ZERO_CHANGE) {
            config.selection.zero_change = raw.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), WalletError> {
        self.discovery.validate()
    }
}

fn parse_u32(key: &str, raw: &str) -> Result<u32, WalletError> {
    raw.trim()
        .parse()
        .map_err(|_| WalletError::InvalidConfig(format!("{key} must be a positive integer, got `{raw}`")))
}
