//! Protocol Constants
//!
//! All magic numbers and configuration values for the FundMe contracts.

/// Native currency precision (ETH / wei)
pub mod currency {
    /// Decimal places of the native currency
    pub const NATIVE_DECIMALS: u8 = 18;
    /// One native unit in its smallest denomination (1 ETH = 10^18 wei)
    pub const ONE_ETHER: u128 = 1_000_000_000_000_000_000;
    /// One reference-currency unit at native precision (1 USD = 10^18)
    pub const ONE_USD: u128 = ONE_ETHER;
}

/// Contribution policy
pub mod funding {
    use super::currency::ONE_USD;

    /// Minimum contribution, expressed in USD with 18 decimals ($50)
    pub const MINIMUM_USD: u128 = 50 * ONE_USD;
}

/// Price feed defaults (Chainlink AggregatorV3 compatible)
pub mod price_feed {
    /// Decimals reported by ETH/USD feeds
    pub const DECIMALS: u8 = 8;

    /// Initial answer of the development mock ($2,000 with 8 decimals)
    pub const INITIAL_ANSWER: i128 = 2_000_00000000;

    /// Aggregator interface version reported by the mock
    pub const VERSION: u64 = 0;

    /// Human readable description of the mock feed
    pub const DESCRIPTION: &str = "v0.8/tests/MockV3Aggregator.sol";
}

/// Deployment defaults
pub mod deploy {
    /// Confirmations to wait for when a network does not configure any
    pub const DEFAULT_BLOCK_CONFIRMATIONS: u64 = 1;
}
