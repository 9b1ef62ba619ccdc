//! NRG Predict - client for a crypto-price prediction service
//!
//! This crate requests price predictions for a symbol over a 1-7 day horizon
//! and buys additional prediction quota with an on-chain SOL transfer signed
//! by the user's wallet.

pub mod client;
pub mod config;
pub mod error;
pub mod network;
pub mod purchase;
pub mod session;
pub mod types;
pub mod wallet;

// Re-export main types for convenience
pub use client::{HttpPredictionClient, PredictOutcome, PredictionApi, SymbolCatalog};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Alert, PredictError, PurchaseError, WalletError};
pub use network::{Network, RpcNetwork};
pub use purchase::{PaymentConfirmation, PurchaseFlow, QuotaSync};
pub use session::Session;
pub use types::{Horizon, PredictionPoint, Symbol, Tier};
pub use wallet::{KeypairWallet, WalletAdapter};
