//! Mathematical Utilities for FundMe
//!
//! Integer-only price math. Multiplication always precedes division and
//! results are floored, so contributions are never overvalued.

use primitive_types::U256;

use crate::constants::currency::{NATIVE_DECIMALS, ONE_ETHER};
use crate::errors::{FundMeError, FundMeResult};

/// Rescale a price from `from_decimals` to `to_decimals`
///
/// Scaling down truncates.
pub fn scale_price(price: u128, from_decimals: u8, to_decimals: u8) -> FundMeResult<u128> {
    if from_decimals == to_decimals {
        return Ok(price);
    }

    if from_decimals > to_decimals {
        let divisor = pow10(from_decimals - to_decimals)?;
        Ok(price / divisor)
    } else {
        let multiplier = pow10(to_decimals - from_decimals)?;
        price.checked_mul(multiplier).ok_or(FundMeError::Overflow)
    }
}

/// Normalize a feed answer to native precision (18 decimals)
pub fn normalize_price(price: u128, feed_decimals: u8) -> FundMeResult<u128> {
    scale_price(price, feed_decimals, NATIVE_DECIMALS)
}

/// Value of `eth_amount` wei in USD (18 decimals)
///
/// usd = eth_amount * eth_price / 1e18, with a 256-bit intermediate.
pub fn convert_to_usd(eth_amount: u128, eth_price: u128) -> FundMeResult<u128> {
    let product = U256::from(eth_amount)
        .checked_mul(U256::from(eth_price))
        .ok_or(FundMeError::Overflow)?;

    let usd = product
        .checked_div(U256::from(ONE_ETHER))
        .ok_or(FundMeError::DivisionByZero)?;

    if usd > U256::from(u128::MAX) {
        return Err(FundMeError::Overflow);
    }
    Ok(usd.low_u128())
}

/// Sum of contributions, checked
pub fn checked_total<'a, I>(amounts: I) -> FundMeResult<u128>
where
    I: IntoIterator<Item = &'a u128>,
{
    amounts
        .into_iter()
        .try_fold(0u128, |acc, amount| acc.checked_add(*amount))
        .ok_or(FundMeError::Overflow)
}

fn pow10(exp: u8) -> FundMeResult<u128> {
    10u128.checked_pow(exp as u32).ok_or(FundMeError::Overflow)
}
