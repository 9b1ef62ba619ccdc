//! Error taxonomy for the client.
//!
//! Alerts block the triggering action before any I/O happens. Prediction and
//! purchase errors are produced after I/O started and are rendered inline.

use thiserror::Error;

/// Where users are sent when no wallet can be found.
pub const WALLET_INSTALL_URL: &str = "https://docs.solanalabs.com/cli/wallets/file-system";

/// Blocking, user-facing prompts raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Alert {
    #[error("Please select a valid symbol and a day count between 1 and 7.")]
    InvalidInput,

    #[error("Wallet not detected. Please install a wallet: {install_url}")]
    WalletNotDetected { install_url: String },

    #[error("Please connect your wallet to make a purchase.")]
    ConnectWallet,
}

/// Failures of a single prediction request.
#[derive(Debug, Error)]
pub enum PredictError {
    /// Non-success status; carries the service's `detail` or `message` text
    #[error("{0}")]
    Service(String),

    /// Success status but a body in none of the known shapes
    #[error("Unexpected response from server.")]
    UnexpectedResponse,

    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}

impl PredictError {
    /// Text shown in the result area.
    pub fn display_text(&self) -> String {
        match self {
            PredictError::UnexpectedResponse => self.to_string(),
            other => format!("Error: {}", other),
        }
    }
}

/// Wallet adapter failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("Wallet not detected (install from {install_url})")]
    NotDetected { install_url: String },

    #[error("Wallet connection rejected: {0}")]
    Rejected(String),

    #[error("Wallet is not connected")]
    NotConnected,

    #[error("Signing failed: {0}")]
    Signing(String),
}

/// Failures while building, signing or submitting a payment.
#[derive(Debug, Error)]
pub enum PurchaseError {
    #[error("No wallet connected")]
    WalletNotConnected,

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("Failed to fetch latest blockhash: {0}")]
    Blockhash(String),

    #[error("Failed to submit transaction: {0}")]
    Submit(String),
}

impl PurchaseError {
    /// Text shown in the payment status line.
    pub fn display_text(&self) -> String {
        format!("Payment failed: {}", self)
    }
}
