//! Network Configuration
//!
//! Maps chain ids to the ETH/USD price feed deployed on them. Development
//! chains have no real feed and get a mock aggregator at deploy time.

use crate::constants::deploy::DEFAULT_BLOCK_CONFIRMATIONS;
use crate::types::{evm_address, Address};

/// Networks that deploy a mock price feed
pub const DEVELOPMENT_CHAINS: &[&str] = &["hardhat", "localhost"];

/// Deployment parameters for one network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Network name as used on the command line
    pub name: &'static str,
    /// EIP-155 chain id
    pub chain_id: u64,
    /// ETH/USD feed address, absent on development chains
    pub eth_usd_price_feed: Option<Address>,
    /// Confirmations to wait for after deployment
    pub block_confirmations: u64,
}

impl NetworkConfig {
    /// Whether contracts on this network should use a mock feed
    pub fn is_development(&self) -> bool {
        is_development_chain(self.name)
    }
}

/// Known networks
pub const NETWORKS: &[NetworkConfig] = &[
    NetworkConfig {
        name: "mainnet",
        chain_id: 1,
        eth_usd_price_feed: Some(evm_address([
            0x5f, 0x4e, 0xc3, 0xdf, 0x9c, 0xbd, 0x43, 0x71, 0x4f, 0xe2,
            0x74, 0x0f, 0x5e, 0x36, 0x16, 0x15, 0x5c, 0x5b, 0x84, 0x19,
        ])),
        block_confirmations: 6,
    },
    NetworkConfig {
        name: "sepolia",
        chain_id: 11_155_111,
        eth_usd_price_feed: Some(evm_address([
            0x69, 0x4a, 0xa1, 0x76, 0x93, 0x57, 0x21, 0x5d, 0xe4, 0xfa,
            0xc0, 0x81, 0xbf, 0x1f, 0x30, 0x9a, 0xdc, 0x32, 0x53, 0x06,
        ])),
        block_confirmations: 6,
    },
    NetworkConfig {
        name: "hardhat",
        chain_id: 31_337,
        eth_usd_price_feed: None,
        block_confirmations: DEFAULT_BLOCK_CONFIRMATIONS,
    },
    NetworkConfig {
        name: "localhost",
        chain_id: 31_337,
        eth_usd_price_feed: None,
        block_confirmations: DEFAULT_BLOCK_CONFIRMATIONS,
    },
];

/// Check whether a network name is a development chain
pub fn is_development_chain(name: &str) -> bool {
    DEVELOPMENT_CHAINS.contains(&name)
}

/// Look up a network by name
pub fn network_by_name(name: &str) -> Option<&'static NetworkConfig> {
    NETWORKS.iter().find(|n| n.name == name)
}

/// Look up a network by chain id (first match wins)
pub fn network_by_chain_id(chain_id: u64) -> Option<&'static NetworkConfig> {
    NETWORKS.iter().find(|n| n.chain_id == chain_id)
}
