//! Client configuration.
//!
//! Defaults point at a locally running prediction service and Solana mainnet.
//! Values can be overridden with the builder or from the environment
//! (a `.env` file is honored).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Recipient of every prediction-package payment.
pub const DEFAULT_RECIPIENT: &str = "G8Gfszz1eXgbLhkLbRD97V9q3QF2Bv8JDGiByT1D2Kzi";

/// Complete client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the prediction service
    pub api_base_url: String,
    /// Solana JSON-RPC endpoint
    pub rpc_url: String,
    /// Base58 address that receives payments
    pub recipient: String,
    /// Explorer prefix used to link submitted transactions
    pub explorer_tx_url: String,
    /// HTTP timeout for prediction service calls in seconds
    pub http_timeout_seconds: u64,
    /// RPC timeout in seconds
    pub rpc_timeout_seconds: u64,
    /// How long the symbol list is cached, in seconds
    pub symbols_cache_ttl_seconds: u64,
    /// Extra attempts for the quota sync call after a payment. 0 means a single attempt.
    pub quota_sync_retry_attempts: usize,
    /// Keypair file backing the local wallet
    pub keypair_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            recipient: DEFAULT_RECIPIENT.to_string(),
            explorer_tx_url: "https://solscan.io/tx".to_string(),
            http_timeout_seconds: 30,
            rpc_timeout_seconds: 30,
            symbols_cache_ttl_seconds: 300,
            quota_sync_retry_attempts: 0,
            keypair_path: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from the environment on top of the defaults.
    pub fn from_env() -> Result<Self> {
        // Missing .env is fine
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        Ok(Self {
            api_base_url: env::var("NRG_API_URL").unwrap_or(defaults.api_base_url),
            rpc_url: env::var("NRG_RPC_URL").unwrap_or(defaults.rpc_url),
            recipient: env::var("NRG_RECIPIENT").unwrap_or(defaults.recipient),
            explorer_tx_url: env::var("NRG_EXPLORER_TX_URL").unwrap_or(defaults.explorer_tx_url),
            http_timeout_seconds: parse_env(
                "NRG_HTTP_TIMEOUT_SECS",
                defaults.http_timeout_seconds,
            )?,
            rpc_timeout_seconds: parse_env("NRG_RPC_TIMEOUT_SECS", defaults.rpc_timeout_seconds)?,
            symbols_cache_ttl_seconds: parse_env(
                "NRG_SYMBOLS_TTL_SECS",
                defaults.symbols_cache_ttl_seconds,
            )?,
            quota_sync_retry_attempts: parse_env(
                "NRG_QUOTA_SYNC_RETRIES",
                defaults.quota_sync_retry_attempts,
            )?,
            keypair_path: env::var("NRG_KEYPAIR").ok().map(PathBuf::from).or(defaults.keypair_path),
        })
    }

    /// Parsed payment recipient.
    pub fn recipient_pubkey(&self) -> Result<Pubkey> {
        Pubkey::from_str(&self.recipient)
            .with_context(|| format!("Invalid recipient address: {}", self.recipient))
    }

    /// Prediction service URL for a path such as `/symbols`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url.trim_end_matches('/'), path)
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value for {}: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

/// Builder for convenient construction with sensible defaults.
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    /// Start from an existing configuration.
    pub fn from_config(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Set the prediction service base URL.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    /// Set the Solana RPC endpoint.
    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.config.rpc_url = url.into();
        self
    }

    /// Set the payment recipient.
    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.config.recipient = recipient.into();
        self
    }

    /// Set the symbol cache TTL in seconds.
    pub fn with_symbols_cache_ttl(mut self, ttl_seconds: u64) -> Self {
        self.config.symbols_cache_ttl_seconds = ttl_seconds;
        self
    }

    /// Set extra quota sync attempts.
    pub fn with_quota_sync_retries(mut self, attempts: usize) -> Self {
        self.config.quota_sync_retry_attempts = attempts;
        self
    }

    /// Set the keypair file for the local wallet.
    pub fn with_keypair_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.keypair_path = Some(path.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
