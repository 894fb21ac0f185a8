//! End-to-end tests for the quote API routes with a mocked upstream client.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mockall::mock;
use serde_json::{json, Value};
use tower::ServiceExt;

use crypto_quote_api::error::QuoteError;
use crypto_quote_api::server::{create_router, AppState, PriceBroadcaster};
use crypto_quote_api::settings::SettingsStore;
use crypto_quote_api::types::PriceResult;
use crypto_quote_api::upstream::QuoteClient;

mock! {
    pub Quotes {}

    #[async_trait]
    impl QuoteClient for Quotes {
        async fn get_prices(
            &self,
            crypto_code: &str,
            currencies: &[String],
        ) -> Result<Vec<PriceResult>, QuoteError>;
    }
}

fn app_with(quotes: MockQuotes) -> (Router, Arc<SettingsStore>) {
    let settings = Arc::new(SettingsStore::new());
    let router = create_router(AppState::new(
        Arc::clone(&settings),
        Arc::new(quotes),
        PriceBroadcaster::new(8),
    ));
    (router, settings)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn get_quote_returns_ok_with_valid_data() {
    let mut quotes = MockQuotes::new();
    quotes
        .expect_get_prices()
        .withf(|code, currencies| code == "BTC" && currencies == ["USD", "EUR"])
        .times(1)
        .returning(|_, _| {
            Ok(vec![
                PriceResult::ok("USD", 50000.0),
                PriceResult::ok("EUR", 42000.0),
            ])
        });
    let (app, _) = app_with(quotes);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/crypto/BTC?currencies=USD&currencies=EUR")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body,
        json!([
            {"currency": "USD", "price": 50000.0},
            {"currency": "EUR", "price": 42000.0},
        ])
    );
}

#[tokio::test]
async fn get_quote_defaults_to_five_currency_basket() {
    let mut quotes = MockQuotes::new();
    quotes
        .expect_get_prices()
        .withf(|_, currencies| currencies == ["USD", "EUR", "BRL", "GBP", "AUD"])
        .times(1)
        .returning(|_, currencies| {
            Ok(currencies
                .iter()
                .map(|c| PriceResult::ok(c.clone(), 1.0))
                .collect())
        });
    let (app, _) = app_with(quotes);

    let response = app
        .oneshot(Request::builder().uri("/crypto/BTC").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let order: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["currency"].as_str().unwrap())
        .collect();
    assert_eq!(order, vec!["USD", "EUR", "BRL", "GBP", "AUD"]);
}

#[tokio::test]
async fn get_quote_fills_missing_currencies_with_placeholders() {
    let mut quotes = MockQuotes::new();
    quotes.expect_get_prices().times(1).returning(|_, _| {
        // Reordered and missing XYZ on purpose
        Ok(vec![PriceResult::ok("EUR", 42000.0), PriceResult::ok("USD", 50000.0)])
    });
    let (app, _) = app_with(quotes);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/crypto/BTC?currencies=USD&currencies=XYZ&currencies=EUR")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body,
        json!([
            {"currency": "USD", "price": 50000.0},
            {"currency": "XYZ", "price": null, "error": "Exchange rate for 'XYZ' is not available."},
            {"currency": "EUR", "price": 42000.0},
        ])
    );
}

#[tokio::test]
async fn get_quote_with_empty_upstream_result_is_bad_request() {
    let mut quotes = MockQuotes::new();
    quotes
        .expect_get_prices()
        .times(1)
        .returning(|_, _| Ok(Vec::new()));
    let (app, _) = app_with(quotes);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/crypto/INVALID_CODE?currencies=USD")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["message"],
        "price for the cryptocurrency is not available."
    );
}

#[tokio::test]
async fn get_quote_maps_unknown_asset_to_not_found() {
    let mut quotes = MockQuotes::new();
    quotes
        .expect_get_prices()
        .times(1)
        .returning(|code, _| Err(QuoteError::CryptocurrencyNotFound(code.to_string())));
    let (app, _) = app_with(quotes);

    let response = app
        .oneshot(Request::builder().uri("/crypto/NOPE").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Cryptocurrency 'NOPE' was not found.");
}

#[tokio::test]
async fn get_quote_maps_upstream_failure_to_service_unavailable() {
    let mut quotes = MockQuotes::new();
    quotes
        .expect_get_prices()
        .times(1)
        .returning(|_, _| Err(QuoteError::upstream("connection refused")));
    let (app, _) = app_with(quotes);

    let response = app
        .oneshot(Request::builder().uri("/crypto/BTC").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    // Internal detail never leaks
    assert!(!body["message"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn get_quote_rejects_malformed_currency_code() {
    let quotes = MockQuotes::new();
    let (app, _) = app_with(quotes);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/crypto/BTC?currencies=USDT")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_crypto_code_reflects_settings_store() {
    let quotes = MockQuotes::new();
    let (app, settings) = app_with(quotes);
    settings.set("sol").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/crypto/cryptoCode")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["cryptoCode"], "SOL");
}

#[tokio::test]
async fn set_crypto_code_updates_store_and_uppercases() {
    let quotes = MockQuotes::new();
    let (app, settings) = app_with(quotes);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/crypto/cryptoCode")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"CryptoCode":"eth"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "CryptoCode updated to ETH.");
    assert_eq!(settings.get().await, "ETH");
}

#[tokio::test]
async fn set_crypto_code_rejects_empty_input() {
    let quotes = MockQuotes::new();
    let (app, settings) = app_with(quotes);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/crypto/cryptoCode")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"CryptoCode":""}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["message"], "CryptoCode cannot be empty.");
    // Store unchanged
    assert_eq!(settings.get().await, "BTC");
}
