//! Price Converter
//!
//! Turns a single feed reading into a USD value at native precision.
//! Every conversion reads the feed exactly once.

use fundme_common::{
    errors::{FundMeResult, OracleFailure},
    math::{convert_to_usd, normalize_price},
};

use crate::PriceFeed;

/// ETH/USD price with 18 decimals
///
/// # Errors
/// - `OracleUnavailable` if the feed cannot be read, reports a
///   non-positive answer, or its latest round is incomplete
/// - `OracleUnavailable { InvalidDecimals }` if the answer vanishes or
///   overflows when scaled to 18 decimals
pub fn get_price<F: PriceFeed + ?Sized>(feed: &F) -> FundMeResult<u128> {
    let round = feed.latest_round_data()?;

    if round.answer <= 0 {
        return Err(OracleFailure::NonPositiveAnswer.into());
    }
    if !round.is_complete() {
        return Err(OracleFailure::IncompleteRound.into());
    }

    match normalize_price(round.answer as u128, feed.decimals()) {
        Ok(price) if price > 0 => Ok(price),
        _ => Err(OracleFailure::InvalidDecimals.into()),
    }
}

/// USD value (18 decimals) of `eth_amount` wei, floored
pub fn get_conversion_rate<F: PriceFeed + ?Sized>(eth_amount: u128, feed: &F) -> FundMeResult<u128> {
    let eth_price = get_price(feed)?;
    convert_to_usd(eth_amount, eth_price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AggregatorState;
    use fundme_common::{
        constants::currency::{ONE_ETHER, ONE_USD},
        errors::FundMeError,
        types::{Address, RoundData},
    };

    const FEED: Address = [7u8; 32];

    /// Feed that can never be reached
    struct OfflineFeed;

    impl PriceFeed for OfflineFeed {
        fn address(&self) -> Address {
            FEED
        }

        fn decimals(&self) -> u8 {
            8
        }

        fn latest_round_data(&self) -> FundMeResult<RoundData> {
            Err(OracleFailure::Unreachable.into())
        }
    }

    fn mock_feed() -> AggregatorState {
        AggregatorState::eth_usd_mock(FEED, [1u8; 32], 100)
    }

    #[test]
    fn test_get_price_normalizes_to_18_decimals() {
        assert_eq!(get_price(&mock_feed()).unwrap(), 2_000 * ONE_USD);
    }

    #[test]
    fn test_get_price_other_decimals() {
        let feed = AggregatorState::new(FEED, [1u8; 32], 20, 2_000 * 10i128.pow(20), 1);
        assert_eq!(get_price(&feed).unwrap(), 2_000 * ONE_USD);
    }

    #[test]
    fn test_answer_lost_to_decimals() {
        // 5e-21 USD floors to zero at 18 decimals
        let tiny = AggregatorState::new(FEED, [1u8; 32], 21, 5, 1);
        assert_eq!(
            get_price(&tiny),
            Err(FundMeError::OracleUnavailable { reason: OracleFailure::InvalidDecimals })
        );

        // 10^60 does not fit in u128
        let wide = AggregatorState::new(FEED, [1u8; 32], 78, 2_000, 1);
        assert_eq!(
            get_conversion_rate(ONE_ETHER, &wide),
            Err(FundMeError::OracleUnavailable { reason: OracleFailure::InvalidDecimals })
        );
        assert!(FundMeError::from(OracleFailure::InvalidDecimals).is_recoverable());
    }

    #[test]
    fn test_conversion_rate() {
        let feed = mock_feed();

        // 0.05 ETH at $2,000 = $100
        assert_eq!(get_conversion_rate(ONE_ETHER / 20, &feed).unwrap(), 100 * ONE_USD);
        // 1 ETH at $2,000 = $2,000
        assert_eq!(get_conversion_rate(ONE_ETHER, &feed).unwrap(), 2_000 * ONE_USD);
        assert_eq!(get_conversion_rate(0, &feed).unwrap(), 0);
    }

    #[test]
    fn test_non_positive_answer() {
        let mut feed = mock_feed();
        feed.update_answer(0, 101);
        assert_eq!(
            get_price(&feed),
            Err(FundMeError::OracleUnavailable { reason: OracleFailure::NonPositiveAnswer })
        );

        feed.update_answer(-5, 102);
        assert!(get_conversion_rate(ONE_ETHER, &feed).is_err());
    }

    #[test]
    fn test_incomplete_round() {
        let mut feed = mock_feed();
        feed.update_round_data(2, 2_000_00000000, 0, 101);

        assert_eq!(
            get_price(&feed),
            Err(FundMeError::OracleUnavailable { reason: OracleFailure::IncompleteRound })
        );
    }

    #[test]
    fn test_unreachable_feed() {
        assert_eq!(
            get_conversion_rate(ONE_ETHER, &OfflineFeed),
            Err(FundMeError::OracleUnavailable { reason: OracleFailure::Unreachable })
        );
    }
}
