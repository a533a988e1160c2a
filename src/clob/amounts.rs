use crate::Result;
use crate::clob::rounding::{RoundConfig, fit_amount, round_down, round_normal, to_token_decimals};
use crate::clob::types::Side;
use crate::error::{Error, InvalidSide};
use crate::types::{Decimal, U256};

/// Integer settlement amounts of an order, in 10^6 units.
///
/// For a BUY the maker gives collateral and takes tokens; for a SELL it is the reverse.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderAmounts {
    pub side: Side,
    pub maker_amount: U256,
    pub taker_amount: U256,
}

fn invalid_side(side: Side) -> Error {
    InvalidSide {
        side: side.to_string(),
    }
    .into()
}

pub(crate) fn checked_add(lhs: Decimal, rhs: Decimal) -> Result<Decimal> {
    lhs.checked_add(rhs)
        .ok_or_else(|| Error::validation(format!("{lhs} + {rhs} overflows")))
}

pub(crate) fn checked_mul(lhs: Decimal, rhs: Decimal) -> Result<Decimal> {
    lhs.checked_mul(rhs)
        .ok_or_else(|| Error::validation(format!("{lhs} * {rhs} overflows")))
}

pub(crate) fn checked_div(lhs: Decimal, rhs: Decimal) -> Result<Decimal> {
    lhs.checked_div(rhs)
        .ok_or_else(|| Error::validation(format!("unable to divide {lhs} by {rhs}")))
}

/// Amounts of a limit order for `size` tokens at `price`.
///
/// Rounding is applied in a fixed order: the price to `config.price` places (half away
/// from zero), then the size to `config.size` places (down), then the derived collateral
/// amount to `config.amount` places.
///
/// e.g. buying 100 tokens at 0.34 takes `100_000_000` token units and makes
/// `34_000_000` collateral units.
pub fn order_amounts(
    side: Side,
    size: Decimal,
    price: Decimal,
    config: RoundConfig,
) -> Result<OrderAmounts> {
    let raw_price = round_normal(price, config.price);
    let raw_size = round_down(size, config.size);
    let raw_collateral = fit_amount(checked_mul(raw_size, raw_price)?, config.amount);

    let (maker, taker) = match side {
        Side::Buy => (raw_collateral, raw_size),
        Side::Sell => (raw_size, raw_collateral),
        Side::Unknown => return Err(invalid_side(side)),
    };

    Ok(OrderAmounts {
        side,
        maker_amount: to_token_decimals(maker)?,
        taker_amount: to_token_decimals(taker)?,
    })
}

/// Amounts of a market order.
///
/// A BUY spends `amount` collateral and takes `amount / price` tokens; a SELL gives
/// `amount` tokens and takes `amount * price` collateral.
pub fn market_order_amounts(
    side: Side,
    amount: Decimal,
    price: Decimal,
    config: RoundConfig,
) -> Result<OrderAmounts> {
    let raw_price = round_normal(price, config.price);
    let raw_maker = round_down(amount, config.size);

    let raw_taker = match side {
        Side::Buy => checked_div(raw_maker, raw_price)?,
        Side::Sell => checked_mul(raw_maker, raw_price)?,
        Side::Unknown => return Err(invalid_side(side)),
    };
    let raw_taker = fit_amount(raw_taker, config.amount);

    Ok(OrderAmounts {
        side,
        maker_amount: to_token_decimals(raw_maker)?,
        taker_amount: to_token_decimals(raw_taker)?,
    })
}

/// Amounts computed from the literal price and size, without any tick size rounding.
pub fn raw_order_amounts(side: Side, size: Decimal, price: Decimal) -> Result<OrderAmounts> {
    let collateral = checked_mul(price, size)?;

    let (maker, taker) = match side {
        Side::Buy => (collateral, size),
        Side::Sell => (size, collateral),
        Side::Unknown => return Err(invalid_side(side)),
    };

    Ok(OrderAmounts {
        side,
        maker_amount: to_token_decimals(maker)?,
        taker_amount: to_token_decimals(taker)?,
    })
}
