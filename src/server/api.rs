//! Quote API routes and handlers

use axum::{
    extract::{ws::WebSocketUpgrade, Path, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use super::{websocket, AppState};
use crate::error::QuoteError;
use crate::types::{self, QuoteEntry};
use crate::upstream::QuoteClient;

/// Create the API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Static segment takes precedence over the {cryptoCode} capture
        .route(
            "/crypto/cryptoCode",
            get(get_crypto_code).post(set_crypto_code),
        )
        .route("/crypto/:crypto_code", get(get_crypto_quote))
        // WebSocket
        .route("/ws", get(websocket_handler))
        .with_state(state)
        // CORS for browser clients
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CryptoCodeResponse {
    crypto_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CryptoCodeUpdateRequest {
    #[serde(alias = "CryptoCode")]
    crypto_code: Option<String>,
}

/// GET /crypto/{cryptoCode}?currencies=USD&currencies=EUR
async fn get_crypto_quote(
    Path(crypto_code): Path<String>,
    RawQuery(query): RawQuery,
    State(state): State<AppState>,
) -> Response {
    let requested = parse_currencies_query(query.as_deref());
    match handle_quote(state.quotes.as_ref(), &crypto_code, &requested).await {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(err) => error_response(err),
    }
}

/// GET /crypto/cryptoCode - currently selected base crypto code
async fn get_crypto_code(State(state): State<AppState>) -> Response {
    let crypto_code = state.settings.get().await;
    Json(CryptoCodeResponse { crypto_code }).into_response()
}

/// POST /crypto/cryptoCode - update the selected base crypto code
async fn set_crypto_code(
    State(state): State<AppState>,
    Json(request): Json<CryptoCodeUpdateRequest>,
) -> Response {
    let Some(code) = request
        .crypto_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(MessageResponse {
                message: "CryptoCode cannot be empty.".to_string(),
            }),
        )
            .into_response();
    };

    state.settings.set(code).await;
    let updated = code.to_uppercase();
    tracing::info!(crypto_code = %updated, "CryptoCode updated");
    Json(MessageResponse {
        message: format!("CryptoCode updated to {updated}."),
    })
    .into_response()
}

/// GET /ws - WebSocket upgrade for live price updates
async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| websocket::handle_socket(socket, state.broadcaster))
}

/// Validate the request, fetch upstream prices, and re-derive one entry per
/// requested currency in request order.
pub async fn handle_quote(
    quotes: &dyn QuoteClient,
    crypto_code: &str,
    requested_currencies: &[String],
) -> Result<Vec<QuoteEntry>, QuoteError> {
    let crypto_code = crypto_code.trim().to_uppercase();
    if crypto_code.is_empty() {
        return Err(QuoteError::validation("Cryptocurrency code is required."));
    }

    let currencies = types::normalize_currencies(requested_currencies);
    if let Some(bad) = currencies
        .iter()
        .find(|c| !types::is_valid_currency_code(c))
    {
        return Err(QuoteError::validation(format!(
            "Currency code '{bad}' must be 3 uppercase letters."
        )));
    }

    let prices = quotes.get_prices(&crypto_code, &currencies).await?;
    if prices.is_empty() {
        tracing::warn!(crypto_code = %crypto_code, "No prices available");
        return Err(QuoteError::PriceNotAvailable);
    }

    // The upstream sequence may be a subset, superset, or reordered; the
    // response must match the requested list exactly.
    let entries = currencies
        .iter()
        .map(|currency| {
            let price = prices
                .iter()
                .find(|p| &p.currency == currency)
                .and_then(|p| p.price);
            match price {
                Some(price) => QuoteEntry {
                    currency: currency.clone(),
                    price: Some(price),
                    error: None,
                },
                None => QuoteEntry {
                    currency: currency.clone(),
                    price: None,
                    error: Some(format!("Exchange rate for '{currency}' is not available.")),
                },
            }
        })
        .collect();

    Ok(entries)
}

/// Pull repeated `currencies=` values out of the raw query string. Accepts
/// comma-separated values inside a single parameter as well.
fn parse_currencies_query(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    raw.split('&')
        .filter_map(|pair| pair.split_once('='))
        .filter(|(key, _)| *key == "currencies")
        .flat_map(|(_, value)| value.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Single translation point from domain errors to HTTP responses. Internal
/// detail is logged, never sent to the caller.
fn error_response(err: QuoteError) -> Response {
    let (status, message) = match &err {
        QuoteError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        QuoteError::PriceNotAvailable => (StatusCode::BAD_REQUEST, err.to_string()),
        QuoteError::CryptocurrencyNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        QuoteError::Upstream(detail) => {
            tracing::error!(error = %detail, "Upstream service failure");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "The cryptocurrency service is currently unavailable.".to_string(),
            )
        }
        QuoteError::Unexpected(e) => {
            tracing::error!(error = %e, "Unexpected failure while handling quote request");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred.".to_string(),
            )
        }
    };
    (status, Json(MessageResponse { message })).into_response()
}
