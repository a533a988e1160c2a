use std::hint::black_box;
use std::str::FromStr as _;

use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use clob_order_engine::clob::amounts::{market_order_amounts, order_amounts};
use clob_order_engine::clob::builder::{OrderTerms, TradingAccount, build_order};
use clob_order_engine::clob::market_price::calculate_market_price;
use clob_order_engine::clob::rounding::RoundConfig;
use clob_order_engine::clob::signing::sign_order;
use clob_order_engine::clob::types::{
    CreateOrderOptions, OrderArgs, OrderBook, OrderSummary, OrderType, Side, SignatureType,
    TickSize,
};
use clob_order_engine::clob::{MarketData, OrderEngine};
use clob_order_engine::types::{Decimal, U256};
use clob_order_engine::{POLYGON, Result};
use criterion::{Criterion, criterion_group, criterion_main};
use rust_decimal_macros::dec;
use tokio::runtime::Runtime;

const PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

struct StaticMarket {
    book: OrderBook,
}

#[async_trait]
impl MarketData for StaticMarket {
    async fn tick_size(&self, _token_id: U256) -> Result<TickSize> {
        Ok(TickSize::Hundredth)
    }

    async fn fee_rate_bps(&self, _token_id: U256) -> Result<u32> {
        Ok(0)
    }

    async fn neg_risk(&self, _token_id: U256) -> Result<bool> {
        Ok(false)
    }

    async fn order_book(&self, _token_id: U256) -> Result<OrderBook> {
        Ok(self.book.clone())
    }
}

fn deep_book() -> OrderBook {
    let level = |cents: u32| OrderSummary::new(Decimal::new(i64::from(cents), 2), dec!(250));

    OrderBook::builder()
        .asset_id(U256::from(1234))
        .bids((1..50).rev().map(level).collect())
        .asks((50..99).map(level).collect())
        .build()
}

fn bench_amounts(c: &mut Criterion) {
    let config = RoundConfig::for_tick_size(TickSize::Hundredth);

    c.bench_function("order_amounts", |b| {
        b.iter(|| {
            order_amounts(
                black_box(Side::Buy),
                black_box(dec!(116.88)),
                black_box(dec!(0.45)),
                config,
            )
        });
    });
    c.bench_function("market_order_amounts", |b| {
        b.iter(|| {
            market_order_amounts(
                black_box(Side::Buy),
                black_box(dec!(100)),
                black_box(dec!(0.34)),
                config,
            )
        });
    });
}

fn bench_market_price(c: &mut Criterion) {
    let book = deep_book();

    c.bench_function("calculate_market_price", |b| {
        b.iter(|| {
            calculate_market_price(
                black_box(&book),
                Side::Buy,
                black_box(dec!(2500)),
                OrderType::FOK,
            )
        });
    });
}

fn bench_signing(c: &mut Criterion) {
    let runtime = Runtime::new().expect("runtime");
    let signer = PrivateKeySigner::from_str(PRIVATE_KEY).expect("key");
    let account = TradingAccount::new(signer.address(), None, SignatureType::Eoa);
    let args = OrderArgs::new(U256::from(1234), Side::Buy, dec!(0.34), dec!(100));
    let amounts = order_amounts(
        Side::Buy,
        args.size,
        args.price,
        RoundConfig::for_tick_size(TickSize::Hundredth),
    )
    .expect("amounts");
    let order = build_order(&account, &OrderTerms::limit(&args, 0), &amounts, 42).expect("order");

    c.bench_function("sign_order", |b| {
        b.iter(|| {
            runtime.block_on(sign_order(&signer, black_box(order.clone()), POLYGON, false))
        });
    });

    let engine = OrderEngine::new(POLYGON, StaticMarket { book: deep_book() })
        .expect("engine")
        .with_signer(signer.clone());
    c.bench_function("create_order", |b| {
        b.iter(|| {
            runtime.block_on(engine.create_order(black_box(&args), CreateOrderOptions::default()))
        });
    });
}

criterion_group!(benches, bench_amounts, bench_market_price, bench_signing);
criterion_main!(benches);
