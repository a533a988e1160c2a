use crate::Result;
use crate::clob::amounts::{checked_add, checked_div, checked_mul};
use crate::clob::rounding::{round_down, round_up};
use crate::clob::types::{OrderBook, OrderSummary, OrderType, Side, TickSize};
use crate::error::{Error, InsufficientLiquidity, InvalidSide, NoMatchingLiquidity, NoOrderBook};
use crate::types::Decimal;

/// Liquidity a market order would consume from one side of the book.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarketFill {
    /// Tokens bought or sold.
    pub size: Decimal,
    /// Collateral spent or received.
    pub cost: Decimal,
    /// `cost / size`, the size-weighted average price of the consumed levels.
    pub price: Decimal,
    /// `false` when the book ran out before the requested amount was covered.
    pub complete: bool,
}

/// Walks the book the way a market order would execute and returns the weighted average
/// price. See [`market_fill`].
pub fn calculate_market_price(
    book: &OrderBook,
    side: Side,
    amount: Decimal,
    order_type: OrderType,
) -> Result<Decimal> {
    market_fill(book, side, amount, order_type).map(|fill| fill.price)
}

/// Walks the side of the book a market order executes against.
///
/// - BUY spends `amount` collateral across asks, cheapest first; the last level may be
///   partially consumed with whatever notional remains.
/// - SELL gives `amount` tokens across bids, highest first.
///
/// Level order in `book` is not relied upon. When depth runs out a [`OrderType::FOK`]
/// order fails with [`InsufficientLiquidity`]; other order types are priced over the depth
/// that exists.
pub fn market_fill(
    book: &OrderBook,
    side: Side,
    amount: Decimal,
    order_type: OrderType,
) -> Result<MarketFill> {
    if amount <= Decimal::ZERO {
        return Err(Error::validation(format!(
            "market order amount must be positive, got {amount}"
        )));
    }

    let mut levels: Vec<OrderSummary> = match side {
        Side::Buy => book.asks.clone(),
        Side::Sell => book.bids.clone(),
        Side::Unknown => {
            return Err(InvalidSide {
                side: side.to_string(),
            }
            .into());
        }
    };

    if book.bids.is_empty() && book.asks.is_empty() {
        return Err(NoOrderBook {
            token_id: book.asset_id,
        }
        .into());
    }

    levels.retain(|level| level.price > Decimal::ZERO && level.size > Decimal::ZERO);
    if side == Side::Buy {
        levels.sort_by(|a, b| a.price.cmp(&b.price));
    } else {
        levels.sort_by(|a, b| b.price.cmp(&a.price));
    }

    if levels.is_empty() {
        return Err(NoMatchingLiquidity {
            token_id: book.asset_id,
            side,
        }
        .into());
    }

    let mut remaining = amount;
    let mut size = Decimal::ZERO;
    let mut cost = Decimal::ZERO;

    for level in &levels {
        if remaining.is_zero() {
            break;
        }

        if side == Side::Buy {
            let level_cost = checked_mul(level.price, level.size)?;
            if level_cost <= remaining {
                size = checked_add(size, level.size)?;
                cost = checked_add(cost, level_cost)?;
                remaining -= level_cost;
            } else {
                size = checked_add(size, checked_div(remaining, level.price)?)?;
                cost = checked_add(cost, remaining)?;
                remaining = Decimal::ZERO;
            }
        } else {
            let taken = remaining.min(level.size);
            size = checked_add(size, taken)?;
            cost = checked_add(cost, checked_mul(taken, level.price)?)?;
            remaining -= taken;
        }
    }

    let complete = remaining.is_zero();
    if !complete && order_type == OrderType::FOK {
        return Err(InsufficientLiquidity {
            token_id: book.asset_id,
            requested: amount,
            available: amount - remaining,
        }
        .into());
    }

    Ok(MarketFill {
        size,
        cost,
        price: checked_div(cost, size)?,
        complete,
    })
}

/// Moves a derived price onto the tick grid: up for a BUY so the order still crosses the
/// consumed levels, down for a SELL.
pub(crate) fn snap_to_tick(price: Decimal, side: Side, tick_size: TickSize) -> Decimal {
    let decimals = tick_size.as_decimal().scale();
    match side {
        Side::Sell => round_down(price, decimals),
        _ => round_up(price, decimals),
    }
}
