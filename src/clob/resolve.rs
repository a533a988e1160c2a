//! Resolution of per-market parameters. A caller override is checked against, or takes
//! precedence over, the market's own value; absent overrides fall back to the market.

use crate::Result;
use crate::clob::market::MarketData;
use crate::clob::types::TickSize;
use crate::error::{FeeRateMismatch, InvalidPrice, InvalidTickSize};
use crate::types::{Decimal, U256};

/// Returns `requested` if it is at least as coarse as the market's minimum tick size,
/// otherwise the market minimum when nothing is requested.
pub async fn resolve_tick_size<M: MarketData + ?Sized>(
    market: &M,
    token_id: U256,
    requested: Option<TickSize>,
) -> Result<TickSize> {
    let minimum = market.tick_size(token_id).await?;

    match requested {
        Some(requested) if requested.is_finer_than(minimum) => {
            Err(InvalidTickSize { requested, minimum }.into())
        }
        Some(requested) => Ok(requested),
        None => Ok(minimum),
    }
}

/// Returns the market fee rate. A non-zero user rate must match a non-zero market rate.
pub async fn resolve_fee_rate<M: MarketData + ?Sized>(
    market: &M,
    token_id: U256,
    user_fee_rate_bps: u32,
) -> Result<u32> {
    let market_fee_rate_bps = market.fee_rate_bps(token_id).await?;
    reconcile_fee_rate(market_fee_rate_bps, user_fee_rate_bps)
}

pub(crate) fn reconcile_fee_rate(market: u32, user: u32) -> Result<u32> {
    if market > 0 && user > 0 && user != market {
        return Err(FeeRateMismatch { user, market }.into());
    }

    Ok(market)
}

/// Returns the override if present, otherwise the market's classification.
pub async fn resolve_neg_risk<M: MarketData + ?Sized>(
    market: &M,
    token_id: U256,
    neg_risk: Option<bool>,
) -> Result<bool> {
    match neg_risk {
        Some(neg_risk) => Ok(neg_risk),
        None => market.neg_risk(token_id).await,
    }
}

/// Accepts prices that are multiples of `tick_size` within `[tick_size, 1 - tick_size]`.
pub fn validate_price(price: Decimal, tick_size: TickSize) -> Result<()> {
    let tick = tick_size.as_decimal();
    let min = tick;
    let max = Decimal::ONE - tick;

    if price < min || price > max || !(price % tick).is_zero() {
        return Err(InvalidPrice {
            price,
            tick_size,
            min,
            max,
        }
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::clob::types::OrderBook;
    use crate::error::Kind;

    struct Fixed {
        tick_size: TickSize,
        fee_rate_bps: u32,
        neg_risk: bool,
        neg_risk_calls: AtomicUsize,
    }

    impl Fixed {
        fn new(tick_size: TickSize, fee_rate_bps: u32) -> Self {
            Self {
                tick_size,
                fee_rate_bps,
                neg_risk: true,
                neg_risk_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MarketData for Fixed {
        async fn tick_size(&self, _token_id: U256) -> Result<TickSize> {
            Ok(self.tick_size)
        }

        async fn fee_rate_bps(&self, _token_id: U256) -> Result<u32> {
            Ok(self.fee_rate_bps)
        }

        async fn neg_risk(&self, _token_id: U256) -> Result<bool> {
            self.neg_risk_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.neg_risk)
        }

        async fn order_book(&self, token_id: U256) -> Result<OrderBook> {
            Ok(OrderBook::builder().asset_id(token_id).build())
        }
    }

    #[tokio::test]
    async fn tick_size_defaults_to_market_minimum() {
        let market = Fixed::new(TickSize::Hundredth, 0);
        let tick_size = resolve_tick_size(&market, U256::from(1), None)
            .await
            .expect("tick size");
        assert_eq!(tick_size, TickSize::Hundredth);
    }

    #[tokio::test]
    async fn coarser_or_equal_tick_size_is_accepted() {
        let market = Fixed::new(TickSize::Hundredth, 0);
        for requested in [TickSize::Hundredth, TickSize::Tenth] {
            let tick_size = resolve_tick_size(&market, U256::from(1), Some(requested))
                .await
                .expect("tick size");
            assert_eq!(tick_size, requested);
        }
    }

    #[tokio::test]
    async fn finer_tick_size_is_rejected() {
        let market = Fixed::new(TickSize::Hundredth, 0);
        let err = resolve_tick_size(&market, U256::from(1), Some(TickSize::Thousandth))
            .await
            .expect_err("finer tick");

        assert_eq!(err.kind(), Kind::Validation);
        let invalid = err.downcast_ref::<InvalidTickSize>().expect("InvalidTickSize");
        assert_eq!(invalid.requested, TickSize::Thousandth);
        assert_eq!(invalid.minimum, TickSize::Hundredth);
        assert_eq!(
            invalid.to_string(),
            "invalid tick size (0.001), minimum for the market is 0.01"
        );
    }

    #[tokio::test]
    async fn fee_rate_reconciliation() {
        let market = Fixed::new(TickSize::Hundredth, 200);
        let token_id = U256::from(1);

        assert_eq!(resolve_fee_rate(&market, token_id, 0).await.expect("0"), 200);
        assert_eq!(resolve_fee_rate(&market, token_id, 200).await.expect("200"), 200);

        let err = resolve_fee_rate(&market, token_id, 150).await.expect_err("150");
        assert_eq!(
            err.downcast_ref::<FeeRateMismatch>(),
            Some(&FeeRateMismatch {
                user: 150,
                market: 200
            })
        );
    }

    #[test]
    fn zero_market_fee_accepts_any_user_fee() {
        assert_eq!(reconcile_fee_rate(0, 150).expect("free market"), 0);
        assert_eq!(reconcile_fee_rate(0, 0).expect("free market"), 0);
    }

    #[tokio::test]
    async fn neg_risk_override_skips_lookup() {
        let market = Fixed::new(TickSize::Hundredth, 0);
        let token_id = U256::from(1);

        assert!(!resolve_neg_risk(&market, token_id, Some(false)).await.expect("override"));
        assert_eq!(market.neg_risk_calls.load(Ordering::SeqCst), 0, "no lookup");

        assert!(resolve_neg_risk(&market, token_id, None).await.expect("lookup"));
        assert_eq!(market.neg_risk_calls.load(Ordering::SeqCst), 1, "one lookup");
    }

    #[test]
    fn valid_prices_for_every_tick_size() {
        for tick_size in TickSize::ALL {
            let tick = tick_size.as_decimal();
            for price in [tick, tick * dec!(2), dec!(0.5), Decimal::ONE - tick] {
                assert!(
                    validate_price(price, tick_size).is_ok(),
                    "{price} is valid for {tick_size}"
                );
            }
        }
    }

    #[test]
    fn out_of_range_prices_are_rejected() {
        for tick_size in TickSize::ALL {
            let tick = tick_size.as_decimal();
            let prices = [
                Decimal::ZERO,
                Decimal::ONE,
                tick / dec!(2),
                Decimal::ONE - tick / dec!(2),
                dec!(1.5),
            ];
            for price in prices {
                let err = validate_price(price, tick_size).expect_err("out of range");
                let invalid = err.downcast_ref::<InvalidPrice>().expect("InvalidPrice");
                assert_eq!(invalid.min, tick, "min for {tick_size}");
                assert_eq!(invalid.max, Decimal::ONE - tick, "max for {tick_size}");
            }
        }
    }

    #[test]
    fn off_tick_prices_are_rejected() {
        assert!(validate_price(dec!(0.505), TickSize::Hundredth).is_err(), "0.505");
        assert!(validate_price(dec!(0.55), TickSize::Tenth).is_err(), "0.55");
        assert!(validate_price(dec!(0.5000), TickSize::Tenth).is_ok(), "trailing zeros");
    }
}
