//! Deployment
//!
//! Wires a FundMe contract to the right ETH/USD feed for a network.
//! Development networks get a freshly deployed mock aggregator; live
//! networks use the feed listed in the network table.

use sha2::{Digest, Sha256};

use fundme_common::{
    errors::{FundMeError, FundMeResult},
    network::NetworkConfig,
    types::Address,
};
use fundme_price_feed::AggregatorState;

use crate::FundMe;

/// Result of deploying FundMe on a network
#[derive(Debug, Clone)]
pub struct Deployment {
    /// Network the contracts were deployed on
    pub network: NetworkConfig,
    /// Address of the FundMe contract
    pub address: Address,
    /// The deployed contract
    pub fund_me: FundMe,
    /// Mock feed, present on development networks only
    pub mock_feed: Option<AggregatorState>,
    /// Confirmations to wait for before using the contract
    pub block_confirmations: u64,
}

/// Deploy FundMe from `deployer`, starting at account nonce `nonce`
///
/// On development networks the mock feed takes `nonce` and FundMe
/// takes `nonce + 1`. The deployer also operates the mock.
///
/// # Errors
/// - `InvalidInput` if a live network has no configured feed
/// - `Overflow` if the deployer has no nonce left for FundMe
pub fn deploy_fund_me(
    network: &NetworkConfig,
    deployer: Address,
    nonce: u64,
    block_height: u64,
) -> FundMeResult<Deployment> {
    let (price_feed, mock_feed, fund_me_nonce) = if network.is_development() {
        let mock_address = derive_contract_address(&deployer, nonce);
        let mock = AggregatorState::eth_usd_mock(mock_address, deployer, block_height);
        let fund_me_nonce = nonce.checked_add(1).ok_or(FundMeError::Overflow)?;
        (mock_address, Some(mock), fund_me_nonce)
    } else {
        let feed = network.eth_usd_price_feed.ok_or(FundMeError::InvalidInput {
            param: "network",
            reason: "no ETH/USD price feed configured",
        })?;
        (feed, None, nonce)
    };

    let fund_me = FundMe::new(deployer, price_feed)?;

    Ok(Deployment {
        network: *network,
        address: derive_contract_address(&deployer, fund_me_nonce),
        fund_me,
        mock_feed,
        block_confirmations: network.block_confirmations,
    })
}

/// Generate a deterministic contract address
pub fn derive_contract_address(deployer: &Address, nonce: u64) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(deployer);
    hasher.update(nonce.to_le_bytes());
    let result = hasher.finalize();
    let mut address = [0u8; 32];
    address.copy_from_slice(&result);
    address
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundme_common::network::{network_by_name, NETWORKS};
    use fundme_price_feed::PriceFeed;

    const DEPLOYER: Address = [1u8; 32];

    #[test]
    fn test_development_network_uses_mock() {
        let hardhat = network_by_name("hardhat").unwrap();
        let deployment = deploy_fund_me(hardhat, DEPLOYER, 0, 1).unwrap();

        let mock = deployment.mock_feed.as_ref().expect("mock feed deployed");
        assert_eq!(deployment.fund_me.get_price_feed(), mock.address());
        assert_eq!(deployment.fund_me.get_owner(), DEPLOYER);
        assert_eq!(mock.operator, DEPLOYER);
        assert_ne!(deployment.address, mock.address());
    }

    #[test]
    fn test_live_network_uses_configured_feed() {
        let sepolia = network_by_name("sepolia").unwrap();
        let deployment = deploy_fund_me(sepolia, DEPLOYER, 3, 1).unwrap();

        assert!(deployment.mock_feed.is_none());
        assert_eq!(Some(deployment.fund_me.get_price_feed()), sepolia.eth_usd_price_feed);
        assert_eq!(deployment.block_confirmations, 6);
        assert_eq!(deployment.address, derive_contract_address(&DEPLOYER, 3));
    }

    #[test]
    fn test_live_network_without_feed() {
        let custom = NetworkConfig {
            name: "custom",
            chain_id: 999,
            eth_usd_price_feed: None,
            block_confirmations: 1,
        };

        assert!(matches!(
            deploy_fund_me(&custom, DEPLOYER, 0, 1),
            Err(FundMeError::InvalidInput { param: "network", .. })
        ));
    }

    #[test]
    fn test_exhausted_nonce() {
        let hardhat = network_by_name("hardhat").unwrap();
        assert!(matches!(
            deploy_fund_me(hardhat, DEPLOYER, u64::MAX, 1),
            Err(FundMeError::Overflow)
        ));

        // Live networks deploy FundMe at the given nonce
        let sepolia = network_by_name("sepolia").unwrap();
        assert!(deploy_fund_me(sepolia, DEPLOYER, u64::MAX, 1).is_ok());
    }

    #[test]
    fn test_addresses_are_deterministic() {
        assert_eq!(derive_contract_address(&DEPLOYER, 0), derive_contract_address(&DEPLOYER, 0));
        assert_ne!(derive_contract_address(&DEPLOYER, 0), derive_contract_address(&DEPLOYER, 1));
        assert_ne!(derive_contract_address(&DEPLOYER, 0), derive_contract_address(&[2u8; 32], 0));
    }

    #[test]
    fn test_every_known_network_deploys() {
        for network in NETWORKS {
            assert!(deploy_fund_me(network, DEPLOYER, 0, 1).is_ok(), "{} failed", network.name);
        }
    }
}
