use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::clob::types::{OrderBook, OrderType, SignedOrder, TickSize};
use crate::types::U256;

/// Read-only market data the order pipeline depends on.
///
/// Implementations perform their own I/O; errors are propagated to the caller unchanged
/// and are never retried by this crate.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Minimum tick size of the market.
    async fn tick_size(&self, token_id: U256) -> Result<TickSize>;

    /// Fee rate of the market in basis points.
    async fn fee_rate_bps(&self, token_id: U256) -> Result<u32>;

    /// Whether the market settles through the neg-risk exchange.
    async fn neg_risk(&self, token_id: U256) -> Result<bool>;

    async fn order_book(&self, token_id: U256) -> Result<OrderBook>;
}

#[async_trait]
impl<M: MarketData + ?Sized> MarketData for Arc<M> {
    async fn tick_size(&self, token_id: U256) -> Result<TickSize> {
        (**self).tick_size(token_id).await
    }

    async fn fee_rate_bps(&self, token_id: U256) -> Result<u32> {
        (**self).fee_rate_bps(token_id).await
    }

    async fn neg_risk(&self, token_id: U256) -> Result<bool> {
        (**self).neg_risk(token_id).await
    }

    async fn order_book(&self, token_id: U256) -> Result<OrderBook> {
        (**self).order_book(token_id).await
    }
}

/// Hands a signed order to the exchange.
#[async_trait]
pub trait OrderSubmitter: Send + Sync {
    type Response: Send;

    async fn post_order(
        &self,
        order: &SignedOrder,
        order_type: OrderType,
    ) -> Result<Self::Response>;
}
