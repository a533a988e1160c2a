//! Order pipeline: parameter resolution, amount rounding, market pricing, order assembly,
//! and EIP-712 signing.

pub mod amounts;
pub mod builder;
pub mod cache;
pub mod engine;
pub mod http;
pub mod market;
pub mod market_price;
pub mod resolve;
pub mod rounding;
pub mod signing;
pub mod types;

pub use cache::CachedMarketData;
pub use engine::OrderEngine;
pub use http::HttpMarketData;
pub use market::{MarketData, OrderSubmitter};
