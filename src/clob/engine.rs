use alloy::signers::Signer;
use alloy::signers::local::PrivateKeySigner;
use chrono::{DateTime, Utc};

use crate::clob::amounts::{OrderAmounts, market_order_amounts, order_amounts, raw_order_amounts};
use crate::clob::builder::{OrderTerms, TradingAccount, build_order, generate_salt};
use crate::clob::cache::CachedMarketData;
use crate::clob::market::{MarketData, OrderSubmitter};
use crate::clob::market_price::{self, snap_to_tick};
use crate::clob::resolve::{resolve_fee_rate, resolve_neg_risk, resolve_tick_size, validate_price};
use crate::clob::rounding::RoundConfig;
use crate::clob::signing::sign_order;
use crate::clob::types::{
    CreateOrderOptions, MarketOrderArgs, OrderArgs, OrderType, Side, SignatureType, SignedOrder,
};
use crate::config::{EngineConfig, validate_funder};
use crate::error::{AuthLevel, Error, InvalidSide};
use crate::types::{Address, ChainId, Decimal, U256};
use crate::{Result, contract_config};

/// Builds, signs, and optionally submits orders for one trading account.
///
/// Market parameters come from `M`; signing uses `S`. Every method takes `&self`, so any
/// number of orders can be built concurrently. Replacing the signing key needs `&mut self`.
#[derive(Clone, Debug)]
pub struct OrderEngine<M, S = PrivateKeySigner> {
    chain_id: ChainId,
    market: M,
    signer: Option<S>,
    funder: Option<Address>,
    signature_type: SignatureType,
    salt_generator: fn() -> u64,
}

impl<M: MarketData> OrderEngine<M> {
    /// Creates an engine without a signing key. Building orders fails with [`AuthLevel`]
    /// until one is added with [`OrderEngine::with_signer`].
    pub fn new(chain_id: ChainId, market: M) -> Result<Self> {
        if contract_config(chain_id, false).is_none() {
            return Err(Error::missing_contract_config(chain_id, false));
        }

        Ok(Self {
            chain_id,
            market,
            signer: None,
            funder: None,
            signature_type: SignatureType::Eoa,
            salt_generator: generate_salt,
        })
    }
}

impl<M: MarketData> OrderEngine<CachedMarketData<M>> {
    /// Creates an engine from validated configuration with `market` behind a read-through
    /// cache.
    pub fn from_config(config: &EngineConfig, market: M) -> Result<Self> {
        let signer = config.signer()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            chain_id = config.chain_id,
            signature_type = %config.signature_type,
            signer = ?signer.as_ref().map(|signer| signer.address()),
            "order engine configured"
        );

        Ok(Self {
            chain_id: config.chain_id,
            market: CachedMarketData::with_ttl(market, config.cache_ttl),
            signer,
            funder: config.funder,
            signature_type: config.signature_type,
            salt_generator: generate_salt,
        })
    }
}

impl<M: MarketData, S: Signer> OrderEngine<M, S> {
    #[must_use]
    pub fn with_signer<T: Signer>(self, signer: T) -> OrderEngine<M, T> {
        OrderEngine {
            chain_id: self.chain_id,
            market: self.market,
            signer: Some(signer),
            funder: self.funder,
            signature_type: self.signature_type,
            salt_generator: self.salt_generator,
        }
    }

    /// Trades on behalf of the proxy wallet `funder`.
    ///
    /// Applies the same funder rules as [`EngineConfig::new`].
    pub fn with_funder(mut self, funder: Address, signature_type: SignatureType) -> Result<Self> {
        validate_funder(signature_type, Some(funder), self.address())?;

        self.funder = Some(funder);
        self.signature_type = signature_type;
        Ok(self)
    }

    /// Replaces the salt source. Salts are masked to 53 bits regardless of the generator.
    #[must_use]
    pub fn with_salt_generator(mut self, salt_generator: fn() -> u64) -> Self {
        self.salt_generator = salt_generator;
        self
    }

    /// Swaps the signing key, returning the previous one.
    pub fn rotate_signer(&mut self, signer: S) -> Option<S> {
        #[cfg(feature = "tracing")]
        tracing::info!(signer = %signer.address(), "signing key rotated");

        self.signer.replace(signer)
    }

    #[must_use]
    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    #[must_use]
    pub fn market(&self) -> &M {
        &self.market
    }

    /// Address of the signing key, if one is configured.
    #[must_use]
    pub fn address(&self) -> Option<Address> {
        self.signer.as_ref().map(|signer| signer.address())
    }

    #[must_use]
    pub fn funder(&self) -> Option<Address> {
        self.funder
    }

    #[must_use]
    pub fn signature_type(&self) -> SignatureType {
        self.signature_type
    }

    fn account(&self) -> Result<(&S, TradingAccount)> {
        let signer = self.signer.as_ref().ok_or(AuthLevel)?;
        let account = TradingAccount::new(signer.address(), self.funder, self.signature_type);
        Ok((signer, account))
    }

    /// Builds and signs a limit order.
    ///
    /// In standard mode the tick size, price range, neg-risk flag, and fee rate are
    /// resolved and validated before the amounts are rounded. With
    /// [`CreateOrderOptions::raw`] price and size are used as given: only the neg-risk
    /// flag is resolved and the caller's fee rate is signed unchanged.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            skip(self, args),
            fields(
                token_id = %args.token_id,
                side = %args.side,
                price = %args.price,
                size = %args.size
            ),
            err(level = "warn")
        )
    )]
    pub async fn create_order(
        &self,
        args: &OrderArgs,
        options: CreateOrderOptions,
    ) -> Result<SignedOrder> {
        let (signer, account) = self.account()?;

        check_side(args.side)?;
        if args.size <= Decimal::ZERO {
            return Err(Error::validation(format!(
                "order size must be positive, got {}",
                args.size
            )));
        }
        if args.price.is_sign_negative() {
            return Err(Error::validation(format!(
                "order price must not be negative, got {}",
                args.price
            )));
        }
        check_expiration(options.order_type.unwrap_or_default(), args.expiration)?;

        let (amounts, neg_risk, fee_rate_bps) = if options.raw {
            let amounts = raw_order_amounts(args.side, args.size, args.price)?;
            let neg_risk = resolve_neg_risk(&self.market, args.token_id, options.neg_risk).await?;
            (amounts, neg_risk, args.fee_rate_bps)
        } else {
            let tick_size =
                resolve_tick_size(&self.market, args.token_id, options.tick_size).await?;
            validate_price(args.price, tick_size)?;
            let neg_risk = resolve_neg_risk(&self.market, args.token_id, options.neg_risk).await?;
            let fee_rate_bps =
                resolve_fee_rate(&self.market, args.token_id, args.fee_rate_bps).await?;
            let amounts = order_amounts(
                args.side,
                args.size,
                args.price,
                RoundConfig::from(tick_size),
            )?;
            (amounts, neg_risk, fee_rate_bps)
        };

        let terms = OrderTerms::limit(args, fee_rate_bps);
        self.sign(signer, &account, &terms, &amounts, neg_risk).await
    }

    /// Builds and signs a market order.
    ///
    /// Without an explicit positive price the book is walked for `args.amount` and the
    /// resulting average price is moved onto the tick grid: up for a BUY, down for a SELL.
    /// [`CreateOrderOptions::raw`] has no effect on market orders.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            skip(self, args),
            fields(token_id = %args.token_id, side = %args.side, amount = %args.amount),
            err(level = "warn")
        )
    )]
    pub async fn create_market_order(
        &self,
        args: &MarketOrderArgs,
        options: CreateOrderOptions,
    ) -> Result<SignedOrder> {
        let (signer, account) = self.account()?;

        check_side(args.side)?;
        if args.amount <= Decimal::ZERO {
            return Err(Error::validation(format!(
                "market order amount must be positive, got {}",
                args.amount
            )));
        }
        let order_type = options.order_type.unwrap_or(args.order_type);
        check_expiration(order_type, None)?;

        let tick_size = resolve_tick_size(&self.market, args.token_id, options.tick_size).await?;

        let price = match args.price {
            Some(price) if price > Decimal::ZERO => price,
            _ => {
                let price = self
                    .calculate_market_price(args.token_id, args.side, args.amount, order_type)
                    .await?;
                snap_to_tick(price, args.side, tick_size)
            }
        };
        validate_price(price, tick_size)?;

        let neg_risk = resolve_neg_risk(&self.market, args.token_id, options.neg_risk).await?;
        let fee_rate_bps = resolve_fee_rate(&self.market, args.token_id, args.fee_rate_bps).await?;
        let amounts = market_order_amounts(
            args.side,
            args.amount,
            price,
            RoundConfig::from(tick_size),
        )?;

        let terms = OrderTerms::market(args, fee_rate_bps);
        self.sign(signer, &account, &terms, &amounts, neg_risk).await
    }

    /// Weighted average price a market order for `amount` would execute at against the
    /// current book.
    pub async fn calculate_market_price(
        &self,
        token_id: U256,
        side: Side,
        amount: Decimal,
        order_type: OrderType,
    ) -> Result<Decimal> {
        let book = self.market.order_book(token_id).await?;
        market_price::calculate_market_price(&book, side, amount, order_type)
    }

    /// [`OrderEngine::create_order`], then hands the order to `submitter` as
    /// [`OrderType::GTC`] unless the options name another type.
    pub async fn create_and_post_order<P: OrderSubmitter>(
        &self,
        submitter: &P,
        args: &OrderArgs,
        options: CreateOrderOptions,
    ) -> Result<P::Response> {
        let order = self.create_order(args, options).await?;
        let order_type = options.order_type.unwrap_or_default();
        submitter.post_order(&order, order_type).await
    }

    /// [`OrderEngine::create_market_order`], then hands the order to `submitter` with the
    /// order type of `args` unless the options name another type.
    pub async fn create_and_post_market_order<P: OrderSubmitter>(
        &self,
        submitter: &P,
        args: &MarketOrderArgs,
        options: CreateOrderOptions,
    ) -> Result<P::Response> {
        let order = self.create_market_order(args, options).await?;
        let order_type = options.order_type.unwrap_or(args.order_type);
        submitter.post_order(&order, order_type).await
    }

    async fn sign(
        &self,
        signer: &S,
        account: &TradingAccount,
        terms: &OrderTerms,
        amounts: &OrderAmounts,
        neg_risk: bool,
    ) -> Result<SignedOrder> {
        let order = build_order(account, terms, amounts, (self.salt_generator)())?;
        let signed = sign_order(signer, order, self.chain_id, neg_risk).await?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            token_id = %terms.token_id,
            maker_amount = %amounts.maker_amount,
            taker_amount = %amounts.taker_amount,
            fee_rate_bps = terms.fee_rate_bps,
            neg_risk,
            "order signed"
        );

        Ok(signed)
    }
}

fn check_side(side: Side) -> Result<()> {
    match side {
        Side::Buy | Side::Sell => Ok(()),
        Side::Unknown => Err(InvalidSide {
            side: side.to_string(),
        }
        .into()),
    }
}

fn check_expiration(order_type: OrderType, expiration: Option<DateTime<Utc>>) -> Result<()> {
    let expires = expiration.is_some_and(|expiration| expiration > DateTime::<Utc>::UNIX_EPOCH);

    match order_type {
        OrderType::GTD if !expires => Err(Error::validation(
            "GTD orders require an expiration after the unix epoch",
        )),
        OrderType::GTD => Ok(()),
        _ if expires => Err(Error::validation(format!(
            "only GTD orders may have a non-zero expiration, got {order_type}"
        ))),
        _ => Ok(()),
    }
}
