use std::fmt;
use std::str::FromStr;

use alloy::primitives::hex;
use alloy::sol;
use bon::Builder;
use chrono::{DateTime, Utc};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize, Serializer};
use serde_repr::{Deserialize_repr, Serialize_repr};
use serde_with::{DisplayFromStr, serde_as};
use strum_macros::Display;

use crate::Result;
use crate::error::{Error, InvalidSide, UnsupportedTickSize};
use crate::types::{Address, ChainId, Decimal, Signature, U256};

#[non_exhaustive]
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
#[repr(u8)]
pub enum Side {
    Buy = 0,
    Sell = 1,
    #[serde(other)]
    Unknown = 255,
}

impl Side {
    #[must_use]
    pub const fn from_repr(value: u8) -> Self {
        match value {
            0 => Side::Buy,
            1 => Side::Sell,
            _ => Side::Unknown,
        }
    }
}

impl FromStr for Side {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            _ => Err(InvalidSide {
                side: s.to_owned(),
            }
            .into()),
        }
    }
}

/// Time in force of a posted order.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    /// Good till cancelled.
    #[default]
    GTC,
    /// Fill or kill: the whole amount fills immediately or nothing does.
    FOK,
    /// Fill and kill: fill what is available immediately, cancel the remainder.
    FAK,
    /// Good till date: rests until a non-zero expiration.
    GTD,
}

/// How the order signer relates to the maker (funder) address.
#[non_exhaustive]
#[derive(
    Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr,
)]
#[repr(u8)]
pub enum SignatureType {
    /// The signer is an externally owned account and is also the maker.
    #[default]
    Eoa = 0,
    /// Email or social-recovery proxy wallet.
    Proxy = 1,
    /// Browser-wallet Gnosis Safe proxy.
    GnosisSafe = 2,
}

impl SignatureType {
    /// Parses config-style input: `0|eoa`, `1|proxy`, `2|gnosis|gnosis_safe|safe`.
    pub fn parse(value: &str) -> Result<SignatureType> {
        match value.trim().to_ascii_lowercase().as_str() {
            "0" | "eoa" => Ok(SignatureType::Eoa),
            "1" | "proxy" => Ok(SignatureType::Proxy),
            "2" | "gnosis" | "gnosis_safe" | "gnosissafe" | "safe" => {
                Ok(SignatureType::GnosisSafe)
            }
            other => Err(Error::validation(format!(
                "invalid signature_type `{other}`; expected one of: eoa|proxy|gnosis"
            ))),
        }
    }
}

impl FromStr for SignatureType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        SignatureType::parse(s)
    }
}

/// Minimum price increment of a market.
///
/// The set is closed: any other increment is rejected with [`UnsupportedTickSize`] when it
/// is parsed, so every value of this type has a rounding configuration.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub enum TickSize {
    Tenth,
    Hundredth,
    Thousandth,
    TenThousandth,
}

impl TickSize {
    pub const ALL: [TickSize; 4] = [
        TickSize::Tenth,
        TickSize::Hundredth,
        TickSize::Thousandth,
        TickSize::TenThousandth,
    ];

    #[must_use]
    pub fn as_decimal(self) -> Decimal {
        match self {
            TickSize::Tenth => dec!(0.1),
            TickSize::Hundredth => dec!(0.01),
            TickSize::Thousandth => dec!(0.001),
            TickSize::TenThousandth => dec!(0.0001),
        }
    }

    /// `true` when `self` allows more price granularity than `other`.
    #[must_use]
    pub fn is_finer_than(self, other: TickSize) -> bool {
        self.as_decimal() < other.as_decimal()
    }
}

impl fmt::Display for TickSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.as_decimal(), f)
    }
}

impl From<TickSize> for Decimal {
    fn from(tick_size: TickSize) -> Self {
        tick_size.as_decimal()
    }
}

impl TryFrom<Decimal> for TickSize {
    type Error = Error;

    fn try_from(value: Decimal) -> std::result::Result<Self, Self::Error> {
        TickSize::ALL
            .into_iter()
            .find(|tick_size| tick_size.as_decimal() == value)
            .ok_or_else(|| {
                UnsupportedTickSize {
                    tick_size: value.normalize().to_string(),
                }
                .into()
            })
    }
}

impl FromStr for TickSize {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|_e| UnsupportedTickSize {
            tick_size: s.to_owned(),
        })?;
        TickSize::try_from(value)
    }
}

sol! {
    /// EIP-712 `Order` struct of the CTF exchange. Field order and types are part of the
    /// signed type hash.
    #[non_exhaustive]
    #[derive(Debug, Default, PartialEq, Eq)]
    struct Order {
        uint256 salt;
        address maker;
        address signer;
        address taker;
        uint256 tokenId;
        uint256 makerAmount;
        uint256 takerAmount;
        uint256 expiration;
        uint256 nonce;
        uint256 feeRateBps;
        uint8 side;
        uint8 signatureType;
    }
}

/// An [`Order`] together with its signature.
///
/// There is no mutable access to the order: a changed order has to be signed again.
#[derive(Clone, Debug, PartialEq)]
pub struct SignedOrder {
    order: Order,
    signature: Signature,
}

impl SignedOrder {
    pub(crate) fn new(order: Order, signature: Signature) -> Self {
        Self { order, signature }
    }

    #[must_use]
    pub fn order(&self) -> &Order {
        &self.order
    }

    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// `r || s || v`, 65 bytes.
    #[must_use]
    pub fn signature_bytes(&self) -> [u8; 65] {
        self.signature.as_bytes()
    }

    #[must_use]
    pub fn side(&self) -> Side {
        Side::from_repr(self.order.side)
    }

    /// Recovers the address that produced the signature under the domain for
    /// `(chain_id, neg_risk)`.
    pub fn recover_signer(&self, chain_id: ChainId, neg_risk: bool) -> Result<Address> {
        let hash = crate::clob::signing::signing_hash(&self.order, chain_id, neg_risk)?;
        Ok(self.signature.recover_address_from_prehash(&hash)?)
    }
}

#[serde_as]
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderPayload {
    #[serde_as(as = "DisplayFromStr")]
    salt: U256,
    #[serde_as(as = "DisplayFromStr")]
    maker: Address,
    #[serde_as(as = "DisplayFromStr")]
    signer: Address,
    #[serde_as(as = "DisplayFromStr")]
    taker: Address,
    #[serde_as(as = "DisplayFromStr")]
    token_id: U256,
    #[serde_as(as = "DisplayFromStr")]
    maker_amount: U256,
    #[serde_as(as = "DisplayFromStr")]
    taker_amount: U256,
    #[serde_as(as = "DisplayFromStr")]
    expiration: U256,
    #[serde_as(as = "DisplayFromStr")]
    nonce: U256,
    #[serde_as(as = "DisplayFromStr")]
    fee_rate_bps: U256,
    side: Side,
    signature_type: u8,
    signature: String,
}

/// Serializes to the canonical order payload: integers as decimal strings, addresses
/// checksummed, side as `BUY`/`SELL`, and the signature as `0x`-prefixed hex.
impl Serialize for SignedOrder {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let order = &self.order;
        OrderPayload {
            salt: order.salt,
            maker: order.maker,
            signer: order.signer,
            taker: order.taker,
            token_id: order.tokenId,
            maker_amount: order.makerAmount,
            taker_amount: order.takerAmount,
            expiration: order.expiration,
            nonce: order.nonce,
            fee_rate_bps: order.feeRateBps,
            side: self.side(),
            signature_type: order.signatureType,
            signature: hex::encode_prefixed(self.signature.as_bytes()),
        }
        .serialize(serializer)
    }
}

/// Input values for a single limit order.
#[non_exhaustive]
#[derive(Clone, Debug, Builder, PartialEq)]
pub struct OrderArgs {
    pub token_id: U256,
    pub side: Side,
    pub price: Decimal,
    pub size: Decimal,
    /// `0` defers to the market fee rate.
    #[builder(default)]
    pub fee_rate_bps: u32,
    #[builder(default)]
    pub nonce: u64,
    /// `None` (or the unix epoch) means the order never expires.
    pub expiration: Option<DateTime<Utc>>,
    /// `None` lets any taker fill the order.
    pub taker: Option<Address>,
}

impl OrderArgs {
    #[must_use]
    pub fn new(token_id: U256, side: Side, price: Decimal, size: Decimal) -> Self {
        Self {
            token_id,
            side,
            price,
            size,
            fee_rate_bps: 0,
            nonce: 0,
            expiration: None,
            taker: None,
        }
    }
}

/// Input values for a market order. The price is derived from the book unless given.
#[non_exhaustive]
#[derive(Clone, Debug, Builder, PartialEq)]
pub struct MarketOrderArgs {
    pub token_id: U256,
    pub side: Side,
    /// USDC notional for [`Side::Buy`], token quantity for [`Side::Sell`].
    pub amount: Decimal,
    #[builder(default = OrderType::FOK)]
    pub order_type: OrderType,
    /// Explicit limit price; `None` or a non-positive value prices from the book.
    pub price: Option<Decimal>,
    #[builder(default)]
    pub fee_rate_bps: u32,
    #[builder(default)]
    pub nonce: u64,
    pub taker: Option<Address>,
}

impl MarketOrderArgs {
    #[must_use]
    pub fn new(token_id: U256, side: Side, amount: Decimal) -> Self {
        Self {
            token_id,
            side,
            amount,
            order_type: OrderType::FOK,
            price: None,
            fee_rate_bps: 0,
            nonce: 0,
            taker: None,
        }
    }
}

/// Per-order overrides. Absent values are resolved from market data.
#[derive(Clone, Copy, Debug, Default)]
pub struct CreateOrderOptions {
    /// Must not be finer than the market's minimum tick size.
    pub tick_size: Option<TickSize>,
    pub neg_risk: Option<bool>,
    /// Use price and size verbatim: no tick size lookup, fee reconciliation, or rounding.
    pub raw: bool,
    /// Order type handed to the submitter; limit orders default to [`OrderType::GTC`].
    pub order_type: Option<OrderType>,
}

impl CreateOrderOptions {
    #[must_use]
    pub const fn with_tick_size(mut self, tick_size: TickSize) -> Self {
        self.tick_size = Some(tick_size);
        self
    }

    #[must_use]
    pub const fn with_neg_risk(mut self, neg_risk: bool) -> Self {
        self.neg_risk = Some(neg_risk);
        self
    }

    #[must_use]
    pub const fn raw(mut self) -> Self {
        self.raw = true;
        self
    }

    #[must_use]
    pub const fn with_order_type(mut self, order_type: OrderType) -> Self {
        self.order_type = Some(order_type);
        self
    }
}

/// One price level of an order book.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub price: Decimal,
    pub size: Decimal,
}

impl OrderSummary {
    #[must_use]
    pub const fn new(price: Decimal, size: Decimal) -> Self {
        Self { price, size }
    }
}

/// Snapshot of both sides of a market's book.
#[non_exhaustive]
#[serde_as]
#[derive(Clone, Debug, Default, Serialize, Deserialize, Builder, PartialEq)]
pub struct OrderBook {
    #[serde_as(as = "DisplayFromStr")]
    pub asset_id: U256,
    #[builder(default)]
    #[serde(default)]
    pub bids: Vec<OrderSummary>,
    #[builder(default)]
    #[serde(default)]
    pub asks: Vec<OrderSummary>,
}
