//! Decimal precision rules per tick size and the rounding primitives the amount
//! calculations are built from.

use rust_decimal::RoundingStrategy;
use rust_decimal::prelude::ToPrimitive as _;

use crate::Result;
use crate::clob::types::TickSize;
use crate::error::Error;
use crate::types::{Decimal, U256};

/// Collateral (USDC) and conditional tokens both use 6 decimals on-chain.
pub const TOKEN_DECIMALS: u32 = 6;

/// Extra places kept when nudging an over-precise amount up before truncating it.
const AMOUNT_GUARD_DECIMALS: u32 = 4;

/// Decimal places allowed for price, size, and the derived amount of an order.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundConfig {
    pub price: u32,
    pub size: u32,
    pub amount: u32,
}

impl RoundConfig {
    #[must_use]
    pub const fn for_tick_size(tick_size: TickSize) -> Self {
        match tick_size {
            TickSize::Tenth => Self {
                price: 1,
                size: 2,
                amount: 3,
            },
            TickSize::Hundredth => Self {
                price: 2,
                size: 2,
                amount: 4,
            },
            TickSize::Thousandth => Self {
                price: 3,
                size: 2,
                amount: 5,
            },
            TickSize::TenThousandth => Self {
                price: 4,
                size: 2,
                amount: 6,
            },
        }
    }
}

impl From<TickSize> for RoundConfig {
    fn from(tick_size: TickSize) -> Self {
        RoundConfig::for_tick_size(tick_size)
    }
}

/// Looks up the rounding configuration for a tick size given as text, e.g. `"0.01"`.
pub fn round_config(tick_size: &str) -> Result<RoundConfig> {
    tick_size.parse::<TickSize>().map(RoundConfig::for_tick_size)
}

pub(crate) fn round_down(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::ToNegativeInfinity)
}

pub(crate) fn round_up(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::ToPositiveInfinity)
}

pub(crate) fn round_normal(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

pub(crate) fn decimal_places(value: Decimal) -> u32 {
    value.normalize().scale()
}

/// Brings a derived amount down to `decimals` places.
///
/// An amount with too many places is first rounded up at `decimals + 4` places, which
/// absorbs representation tails such as `x.xxx9999999`, and only truncated if it is still
/// too precise afterwards.
pub(crate) fn fit_amount(value: Decimal, decimals: u32) -> Decimal {
    if decimal_places(value) <= decimals {
        return value;
    }

    let nudged = round_up(value, decimals + AMOUNT_GUARD_DECIMALS);
    if decimal_places(nudged) > decimals {
        round_down(nudged, decimals)
    } else {
        nudged
    }
}

/// Converts a decimal token quantity into its integer on-chain unit (10^6), rounding half
/// away from zero.
pub fn to_token_decimals(value: Decimal) -> Result<U256> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(Error::validation(format!(
            "amount cannot be negative: {value}"
        )));
    }

    let scaled = value
        .checked_mul(Decimal::from(10_u64.pow(TOKEN_DECIMALS)))
        .ok_or_else(|| Error::validation(format!("amount {value} overflows")))?;
    let units = round_normal(scaled, 0)
        .to_u128()
        .ok_or_else(|| Error::validation(format!("unable to represent amount as u128: {value}")))?;

    Ok(U256::from(units))
}
