//! Currency conversion lookup.
//!
//! Balances are held in roubles. This client asks an external exchange rate
//! API what a balance is worth in another currency. It is strictly read-only
//! and never touches the ledger.

use std::time::Duration;

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use url::Url;

use crate::error::AppError;

/// Currency all balances are denominated in.
pub const BASE_CURRENCY: &str = "RUB";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Body returned by the exchange rate API. Only `result` is used.
#[derive(Debug, Deserialize)]
struct ExchangeResponse {
    result: Decimal,
}

/// Client for the exchange rate API.
#[derive(Debug, Clone)]
pub struct ExchangeClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

impl ExchangeClient {
    /// Build a client for `endpoint` authenticated with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if `endpoint` is not a valid URL or the HTTP client
    /// cannot be built.
    pub fn new(endpoint: &str, api_key: impl Into<String>) -> anyhow::Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            endpoint,
            api_key: api_key.into(),
        })
    }

    /// Full request URL for converting `amount` roubles into `currency`.
    fn conversion_url(&self, currency: &str, amount: Decimal) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("to", currency)
            .append_pair("from", BASE_CURRENCY)
            .append_pair("amount", &amount.normalize().to_string());
        url
    }

    /// Convert `amount` roubles into `currency`.
    ///
    /// # Errors
    ///
    /// - `ExchangeRejected`: the API answered with a non-200 status
    /// - `ExchangeRequest`: the API was unreachable, timed out, or returned
    ///   a body without a numeric `result`
    pub async fn convert(&self, currency: &str, amount: Decimal) -> Result<Decimal, AppError> {
        let url = self.conversion_url(currency, amount);

        let response = self
            .http
            .get(url)
            .header("apikey", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await?;
            return Err(AppError::ExchangeRejected {
                status: status.as_u16(),
                body,
            });
        }

        let exchange: ExchangeResponse = response.json().await?;
        Ok(exchange.result)
    }
}
