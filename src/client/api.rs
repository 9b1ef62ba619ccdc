//! HTTP access to the prediction service.

use crate::client::response::{error_text, parse_success_body, PredictOutcome};
use crate::config::ClientConfig;
use crate::error::PredictError;
use crate::types::{Horizon, Symbol, Tier, ANONYMOUS_WALLET};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Body of `POST /predict-lstm`.
#[derive(Debug, Clone, Serialize)]
pub struct PredictRequest {
    pub wallet: String,
    pub symbol: Symbol,
    pub days: Horizon,
}

impl PredictRequest {
    /// Build a request; without a wallet the anonymous identity is used.
    pub fn new(wallet: Option<&Pubkey>, symbol: Symbol, days: Horizon) -> Self {
        Self {
            wallet: wallet
                .map(|key| key.to_string())
                .unwrap_or_else(|| ANONYMOUS_WALLET.to_string()),
            symbol,
            days,
        }
    }
}

/// Body of `POST /reset-usage`.
#[derive(Debug, Clone, Serialize)]
pub struct ResetUsageRequest {
    pub wallet: String,
    #[serde(rename = "newLimit")]
    pub new_limit: Tier,
}

#[derive(Debug, Deserialize)]
struct SymbolsResponse {
    symbols: Vec<String>,
}

/// Operations offered by the prediction service.
#[async_trait]
pub trait PredictionApi: Send + Sync {
    /// List the symbols the service can predict.
    async fn symbols(&self) -> Result<Vec<Symbol>>;

    /// Request a prediction. Exactly one HTTP call, no retry.
    async fn predict(&self, request: &PredictRequest) -> Result<PredictOutcome, PredictError>;

    /// Tell the service a wallet bought a new prediction limit.
    async fn reset_usage(&self, request: &ResetUsageRequest) -> Result<()>;
}

/// reqwest-backed implementation of [`PredictionApi`].
pub struct HttpPredictionClient {
    http_client: Client,
    config: ClientConfig,
}

impl HttpPredictionClient {
    /// Create a client with the configured timeout.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            config,
        })
    }
}

#[async_trait]
impl PredictionApi for HttpPredictionClient {
    #[instrument(skip(self))]
    async fn symbols(&self) -> Result<Vec<Symbol>> {
        let response = self
            .http_client
            .get(self.config.endpoint("/symbols"))
            .send()
            .await
            .context("Failed to fetch symbols")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(error_text(status.as_u16(), &body)));
        }

        let payload: SymbolsResponse = response
            .json()
            .await
            .context("Failed to parse symbols")?;

        let symbols: Vec<Symbol> = payload
            .symbols
            .into_iter()
            .filter_map(|raw| Symbol::new(raw).ok())
            .collect();

        debug!("Fetched {} symbols", symbols.len());
        Ok(symbols)
    }

    #[instrument(skip(self, request), fields(symbol = %request.symbol, days = %request.days))]
    async fn predict(&self, request: &PredictRequest) -> Result<PredictOutcome, PredictError> {
        let response = self
            .http_client
            .post(self.config.endpoint("/predict-lstm"))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let text = error_text(status.as_u16(), &body);
            warn!("Prediction request failed with {}: {}", status, text);
            return Err(PredictError::Service(text));
        }

        parse_success_body(&body)
    }

    #[instrument(
        skip(self, request),
        fields(wallet = %request.wallet, new_limit = %request.new_limit)
    )]
    async fn reset_usage(&self, request: &ResetUsageRequest) -> Result<()> {
        let response = self
            .http_client
            .post(self.config.endpoint("/reset-usage"))
            .json(request)
            .send()
            .await
            .context("Failed to reach prediction service")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(error_text(status.as_u16(), &body)));
        }

        debug!("Usage reset accepted");
        Ok(())
    }
}
