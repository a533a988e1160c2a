use clob_order_engine::clob::types::TickSize;
use clob_order_engine::clob::{CachedMarketData, HttpMarketData, MarketData as _};
use clob_order_engine::error::{Kind, Status, UnsupportedTickSize};
use clob_order_engine::types::U256;
use httpmock::prelude::*;
use reqwest::StatusCode;
use rust_decimal_macros::dec;
use serde_json::json;

const TOKEN_ID: U256 = U256::from_limbs([1234, 0, 0, 0]);

#[tokio::test]
async fn reads_market_parameters() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let tick_size = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/tick-size")
                .query_param("token_id", "1234");
            then.status(200).json_body(json!({ "minimum_tick_size": 0.001 }));
        })
        .await;
    let fee_rate = server
        .mock_async(|when, then| {
            when.method(GET).path("/fee-rate").query_param("token_id", "1234");
            then.status(200).json_body(json!({ "base_fee": 200 }));
        })
        .await;
    let neg_risk = server
        .mock_async(|when, then| {
            when.method(GET).path("/neg-risk").query_param("token_id", "1234");
            then.status(200).json_body(json!({ "neg_risk": true }));
        })
        .await;

    let market = HttpMarketData::new(&server.base_url())?;

    assert_eq!(market.tick_size(TOKEN_ID).await?, TickSize::Thousandth);
    assert_eq!(market.fee_rate_bps(TOKEN_ID).await?, 200);
    assert!(market.neg_risk(TOKEN_ID).await?, "neg risk market");

    tick_size.assert_async().await;
    fee_rate.assert_async().await;
    neg_risk.assert_async().await;

    Ok(())
}

#[tokio::test]
async fn reads_order_book() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/book").query_param("token_id", "1234");
            then.status(200).json_body(json!({
                "market": "0xbd31dc8a20211944f6b70f31557f1001557b59905b7738480ca09bd4532f84af",
                "asset_id": "1234",
                "timestamp": "1710000000000",
                "hash": "0xabc",
                "bids": [{ "price": "0.38", "size": "500" }],
                "asks": [{ "price": "0.45", "size": "50" }, { "price": "0.40", "size": "100" }],
                "tick_size": "0.01",
                "neg_risk": false
            }));
        })
        .await;

    let market = HttpMarketData::new(&server.base_url())?;
    let book = market.order_book(TOKEN_ID).await?;

    mock.assert_async().await;
    assert_eq!(book.asset_id, TOKEN_ID);
    assert_eq!(book.bids.len(), 1);
    assert_eq!(book.asks.len(), 2);
    assert_eq!(book.asks[1].price, dec!(0.40));

    Ok(())
}

#[tokio::test]
async fn non_success_status_is_reported() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/tick-size");
            then.status(404)
                .json_body(json!({ "error": "market not found" }));
        })
        .await;

    let market = HttpMarketData::new(&server.base_url())?;
    let err = market.tick_size(TOKEN_ID).await.expect_err("404");

    assert_eq!(err.kind(), Kind::Status);
    let status = err.downcast_ref::<Status>().expect("Status");
    assert_eq!(status.status_code, StatusCode::NOT_FOUND);
    assert_eq!(status.path, "/tick-size");
    assert!(status.message.contains("market not found"), "{}", status.message);

    Ok(())
}

#[tokio::test]
async fn unsupported_tick_size_is_rejected() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/tick-size");
            then.status(200).json_body(json!({ "minimum_tick_size": 0.005 }));
        })
        .await;

    let market = HttpMarketData::new(&server.base_url())?;
    let err = market.tick_size(TOKEN_ID).await.expect_err("0.005");

    assert_eq!(err.kind(), Kind::Validation);
    let unsupported = err
        .downcast_ref::<UnsupportedTickSize>()
        .expect("UnsupportedTickSize");
    assert_eq!(unsupported.tick_size, "0.005");

    Ok(())
}

#[tokio::test]
async fn cache_serves_repeated_reads() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/neg-risk");
            then.status(200).json_body(json!({ "neg_risk": false }));
        })
        .await;

    let market = CachedMarketData::new(HttpMarketData::new(&server.base_url())?);
    for _ in 0..3 {
        assert!(!market.neg_risk(TOKEN_ID).await?, "standard market");
    }

    mock.assert_async().await;

    Ok(())
}
