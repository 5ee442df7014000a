//! Wallet-core constants.

/// Number of addresses derived and checked per discovery window.
pub const DEFAULT_GAP_LIMIT: u32 = 20;

/// Upper bound on the number of windows a single discovery scan may visit
/// before giving up with `DiscoveryExhausted`.
pub const DEFAULT_MAX_DISCOVERY_WINDOWS: u32 = 10_000;

/// `Addressing::change` value for the external (receiving) chain.
pub const EXTERNAL_CHAIN: u8 = 0;

/// `Addressing::change` value for the internal (change) chain.
pub const INTERNAL_CHAIN: u8 = 1;

/// Length in bytes of a transaction identifier.
pub const TX_ID_LEN: usize = 32;
