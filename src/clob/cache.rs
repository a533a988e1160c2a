use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::Result;
use crate::clob::market::MarketData;
use crate::clob::types::{OrderBook, TickSize};
use crate::types::U256;

#[derive(Clone, Copy, Debug)]
struct Cached<T> {
    value: T,
    fetched_at: Instant,
}

#[derive(Clone, Copy, Debug, Default)]
struct MarketEntry {
    tick_size: Option<Cached<TickSize>>,
    fee_rate_bps: Option<Cached<u32>>,
    neg_risk: Option<Cached<bool>>,
}

/// Read-through cache of tick size, fee rate, and neg-risk classification keyed by token
/// id, in front of another [`MarketData`].
///
/// Order books are always fetched from the inner source. Failed lookups are not cached.
/// Without a TTL entries live until [`CachedMarketData::invalidate`] or
/// [`CachedMarketData::clear`]. With one, expired tokens are dropped on their next lookup or
/// by [`CachedMarketData::evict_expired`].
#[derive(Debug)]
pub struct CachedMarketData<M> {
    inner: M,
    ttl: Option<Duration>,
    entries: DashMap<U256, MarketEntry>,
}

impl<M> CachedMarketData<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self::with_ttl(inner, None)
    }

    #[must_use]
    pub fn with_ttl(inner: M, ttl: Option<Duration>) -> Self {
        Self {
            inner,
            ttl,
            entries: DashMap::new(),
        }
    }

    #[must_use]
    pub fn inner(&self) -> &M {
        &self.inner
    }

    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Drops every cached value for `token_id`.
    pub fn invalidate(&self, token_id: U256) {
        self.entries.remove(&token_id);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drops every token whose cached values have all expired.
    pub fn evict_expired(&self) {
        if self.ttl.is_some() {
            self.entries.retain(|_, entry| self.has_fresh(entry));
        }
    }

    fn is_fresh(&self, fetched_at: Instant) -> bool {
        self.ttl.is_none_or(|ttl| fetched_at.elapsed() < ttl)
    }

    fn has_fresh(&self, entry: &MarketEntry) -> bool {
        [
            entry.tick_size.map(|cached| cached.fetched_at),
            entry.fee_rate_bps.map(|cached| cached.fetched_at),
            entry.neg_risk.map(|cached| cached.fetched_at),
        ]
        .into_iter()
        .flatten()
        .any(|fetched_at| self.is_fresh(fetched_at))
    }

    /// A stale hit removes the token's entry once none of its values are fresh.
    fn lookup<T: Copy>(
        &self,
        token_id: U256,
        field: fn(&MarketEntry) -> Option<Cached<T>>,
    ) -> Option<T> {
        let cached = self.entries.get(&token_id).and_then(|entry| field(&entry))?;
        if self.is_fresh(cached.fetched_at) {
            return Some(cached.value);
        }

        self.entries.remove_if(&token_id, |_, entry| !self.has_fresh(entry));
        None
    }

    fn store<T>(&self, token_id: U256, set: fn(&mut MarketEntry, Cached<T>), value: T) {
        let cached = Cached {
            value,
            fetched_at: Instant::now(),
        };
        set(&mut self.entries.entry(token_id).or_default(), cached);
    }
}

#[async_trait]
impl<M: MarketData> MarketData for CachedMarketData<M> {
    async fn tick_size(&self, token_id: U256) -> Result<TickSize> {
        if let Some(tick_size) = self.lookup(token_id, |entry| entry.tick_size) {
            #[cfg(feature = "tracing")]
            tracing::trace!(%token_id, %tick_size, "tick size cache hit");
            return Ok(tick_size);
        }

        let tick_size = self.inner.tick_size(token_id).await?;
        self.store(token_id, |entry, cached| entry.tick_size = Some(cached), tick_size);

        #[cfg(feature = "tracing")]
        tracing::debug!(%token_id, %tick_size, "tick size cached");
        Ok(tick_size)
    }

    async fn fee_rate_bps(&self, token_id: U256) -> Result<u32> {
        if let Some(fee_rate_bps) = self.lookup(token_id, |entry| entry.fee_rate_bps) {
            return Ok(fee_rate_bps);
        }

        let fee_rate_bps = self.inner.fee_rate_bps(token_id).await?;
        self.store(
            token_id,
            |entry, cached| entry.fee_rate_bps = Some(cached),
            fee_rate_bps,
        );

        #[cfg(feature = "tracing")]
        tracing::debug!(%token_id, fee_rate_bps, "fee rate cached");
        Ok(fee_rate_bps)
    }

    async fn neg_risk(&self, token_id: U256) -> Result<bool> {
        if let Some(neg_risk) = self.lookup(token_id, |entry| entry.neg_risk) {
            return Ok(neg_risk);
        }

        let neg_risk = self.inner.neg_risk(token_id).await?;
        self.store(token_id, |entry, cached| entry.neg_risk = Some(cached), neg_risk);

        #[cfg(feature = "tracing")]
        tracing::debug!(%token_id, neg_risk, "neg risk cached");
        Ok(neg_risk)
    }

    async fn order_book(&self, token_id: U256) -> Result<OrderBook> {
        self.inner.order_book(token_id).await
    }
}
