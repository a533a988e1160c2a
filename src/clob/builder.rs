use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use rand::Rng as _;

use crate::Result;
use crate::clob::amounts::OrderAmounts;
use crate::clob::types::{MarketOrderArgs, Order, OrderArgs, SignatureType};
use crate::error::Error;
use crate::types::{Address, U256};

/// Largest integer an IEEE 754 double represents exactly, `2^53 - 1`.
pub const MAX_SALT: u64 = (1 << 53) - 1;

/// The wallet orders are built for.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TradingAccount {
    /// Address of the signing key.
    pub signer: Address,
    /// Proxy wallet holding the funds; `None` when the signer trades for itself.
    pub funder: Option<Address>,
    pub signature_type: SignatureType,
}

impl TradingAccount {
    #[must_use]
    pub const fn new(
        signer: Address,
        funder: Option<Address>,
        signature_type: SignatureType,
    ) -> Self {
        Self {
            signer,
            funder,
            signature_type,
        }
    }

    /// The funder when configured, otherwise the signer.
    #[must_use]
    pub fn maker(&self) -> Address {
        self.funder.unwrap_or(self.signer)
    }
}

/// Order fields that come from the caller rather than from the amount calculation.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderTerms {
    pub token_id: U256,
    /// Already reconciled with the market.
    pub fee_rate_bps: u32,
    pub nonce: u64,
    pub expiration: Option<DateTime<Utc>>,
    pub taker: Option<Address>,
}

impl OrderTerms {
    #[must_use]
    pub fn limit(args: &OrderArgs, fee_rate_bps: u32) -> Self {
        Self {
            token_id: args.token_id,
            fee_rate_bps,
            nonce: args.nonce,
            expiration: args.expiration,
            taker: args.taker,
        }
    }

    /// Market orders never expire.
    #[must_use]
    pub fn market(args: &MarketOrderArgs, fee_rate_bps: u32) -> Self {
        Self {
            token_id: args.token_id,
            fee_rate_bps,
            nonce: args.nonce,
            expiration: None,
            taker: args.taker,
        }
    }
}

/// Assembles the unsigned order record.
pub fn build_order(
    account: &TradingAccount,
    terms: &OrderTerms,
    amounts: &OrderAmounts,
    salt: u64,
) -> Result<Order> {
    Ok(Order {
        salt: U256::from(mask_salt(salt)),
        maker: account.maker(),
        signer: account.signer,
        taker: terms.taker.unwrap_or(Address::ZERO),
        tokenId: terms.token_id,
        makerAmount: amounts.maker_amount,
        takerAmount: amounts.taker_amount,
        expiration: U256::from(expiration_seconds(terms.expiration)?),
        nonce: U256::from(terms.nonce),
        feeRateBps: U256::from(terms.fee_rate_bps),
        side: amounts.side as u8,
        signatureType: account.signature_type as u8,
    })
}

/// Unix seconds of `expiration`, `0` for an order that never expires.
pub fn expiration_seconds(expiration: Option<DateTime<Utc>>) -> Result<u64> {
    let Some(expiration) = expiration else {
        return Ok(0);
    };

    u64::try_from(expiration.timestamp()).map_err(|_e| {
        Error::validation(format!(
            "unable to represent expiration {expiration} as unix seconds"
        ))
    })
}

/// Clears everything above bit 53 so the salt survives a round trip through a JSON number.
#[must_use]
pub const fn mask_salt(salt: u64) -> u64 {
    salt & MAX_SALT
}

/// Current unix time scaled by a random factor, masked to [`MAX_SALT`].
#[must_use]
#[expect(
    clippy::float_arithmetic,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "the seed only needs to be unpredictable, not exact"
)]
pub fn generate_salt() -> u64 {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();
    let random = rand::rng().random::<f64>();
    mask_salt((seconds * random).round() as u64)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::clob::amounts::order_amounts;
    use crate::clob::rounding::RoundConfig;
    use crate::clob::types::{Side, TickSize};

    const SIGNER: Address = Address::repeat_byte(0x11);
    const FUNDER: Address = Address::repeat_byte(0x22);

    fn amounts(side: Side) -> OrderAmounts {
        order_amounts(
            side,
            dec!(100),
            dec!(0.34),
            RoundConfig::for_tick_size(TickSize::Hundredth),
        )
        .expect("amounts")
    }

    fn terms() -> OrderTerms {
        OrderTerms::limit(
            &OrderArgs::new(U256::from(99), Side::Buy, dec!(0.34), dec!(100)),
            0,
        )
    }

    #[test]
    fn maker_is_funder_when_configured() {
        let proxy = TradingAccount::new(SIGNER, Some(FUNDER), SignatureType::GnosisSafe);
        let order = build_order(&proxy, &terms(), &amounts(Side::Buy), 7).expect("order");

        assert_eq!(order.maker, FUNDER);
        assert_eq!(order.signer, SIGNER);
        assert_eq!(order.signatureType, 2);

        let eoa = TradingAccount::new(SIGNER, None, SignatureType::Eoa);
        let order = build_order(&eoa, &terms(), &amounts(Side::Buy), 7).expect("order");
        assert_eq!(order.maker, SIGNER, "an EOA makes its own orders");
        assert_eq!(order.signatureType, 0);
    }

    #[test]
    fn defaults_fill_optional_terms() {
        let account = TradingAccount::new(SIGNER, None, SignatureType::Eoa);
        let order = build_order(&account, &terms(), &amounts(Side::Sell), 7).expect("order");

        assert_eq!(order.taker, Address::ZERO, "public order");
        assert_eq!(order.expiration, U256::ZERO, "never expires");
        assert_eq!(order.nonce, U256::ZERO);
        assert_eq!(order.feeRateBps, U256::ZERO);
        assert_eq!(order.tokenId, U256::from(99));
        assert_eq!(order.side, 1);
        assert_eq!(order.salt, U256::from(7));
    }

    #[test]
    fn explicit_terms_are_copied() {
        let expiration = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).single();
        let args = OrderArgs::builder()
            .token_id(U256::from(99))
            .side(Side::Buy)
            .price(dec!(0.34))
            .size(dec!(100))
            .nonce(3)
            .maybe_expiration(expiration)
            .taker(FUNDER)
            .build();
        let account = TradingAccount::new(SIGNER, None, SignatureType::Eoa);

        let order = build_order(
            &account,
            &OrderTerms::limit(&args, 200),
            &amounts(Side::Buy),
            7,
        )
        .expect("order");

        assert_eq!(order.taker, FUNDER);
        assert_eq!(order.expiration, U256::from(1_893_456_000_u64));
        assert_eq!(order.nonce, U256::from(3));
        assert_eq!(order.feeRateBps, U256::from(200));
    }

    #[test]
    fn pre_epoch_expiration_is_rejected() {
        let before_epoch = Utc.with_ymd_and_hms(1969, 12, 31, 0, 0, 0).single();
        assert!(expiration_seconds(before_epoch).is_err(), "negative timestamp");
        assert_eq!(expiration_seconds(None).expect("none"), 0);
        assert_eq!(
            expiration_seconds(Some(DateTime::<Utc>::UNIX_EPOCH)).expect("epoch"),
            0
        );
    }

    #[test]
    fn salts_fit_in_a_double() {
        assert_eq!(mask_salt(u64::MAX), MAX_SALT);
        assert_eq!(mask_salt(12_345), 12_345);
        for _ in 0..100 {
            assert!(generate_salt() <= MAX_SALT, "salt is masked");
        }
    }

    #[test]
    fn market_terms_never_expire() {
        let args = MarketOrderArgs::new(U256::from(5), Side::Buy, dec!(10));
        let terms = OrderTerms::market(&args, 100);

        assert_eq!(terms.expiration, None);
        assert_eq!(terms.fee_rate_bps, 100);
        assert_eq!(terms.token_id, U256::from(5));
    }
}
