//! Core types and data structures shared by the prediction and purchase flows.

use crate::error::Alert;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Wallet value sent to the prediction service when no wallet is connected.
pub const ANONYMOUS_WALLET: &str = "anonymous_user";

/// Lamports in one SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// A tradable symbol as listed by the prediction service (e.g. "BTC").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a symbol, rejecting blank input.
    pub fn new(raw: impl Into<String>) -> Result<Self, Alert> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Alert::InvalidInput);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Number of future days to predict. Always within `[Horizon::MIN, Horizon::MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Horizon(u8);

impl Horizon {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 7;

    /// Validate a raw day count.
    pub fn new(days: i64) -> Result<Self, Alert> {
        if days < Self::MIN as i64 || days > Self::MAX as i64 {
            return Err(Alert::InvalidInput);
        }
        Ok(Self(days as u8))
    }

    /// Clamp a raw day count into range, the way a bounded number input behaves.
    pub fn clamped(days: i64) -> Self {
        Self(days.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub fn days(&self) -> u8 {
        self.0
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single predicted price point returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPoint {
    /// Date of the prediction, as formatted by the service (e.g. "2025-01-31")
    pub timestamp: String,
    /// Predicted price in USD
    #[serde(rename = "Predicted_Price")]
    pub predicted_price: f64,
}

/// A purchasable prediction package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// 100 predictions
    Hundred,
    /// 500 predictions
    FiveHundred,
    /// 1000 predictions
    Thousand,
    /// No prediction limit
    Unlimited,
}

impl Tier {
    /// Returns all purchasable tiers, cheapest first.
    pub fn all() -> [Tier; 4] {
        [Tier::Hundred, Tier::FiveHundred, Tier::Thousand, Tier::Unlimited]
    }

    /// Number of predictions granted, `None` for unlimited.
    pub fn predictions(&self) -> Option<u32> {
        match self {
            Tier::Hundred => Some(100),
            Tier::FiveHundred => Some(500),
            Tier::Thousand => Some(1000),
            Tier::Unlimited => None,
        }
    }

    /// Price in lamports. This table is the source of truth for the transfer amount.
    pub fn price_lamports(&self) -> u64 {
        match self {
            Tier::Hundred => 10_000_000,
            Tier::FiveHundred => 50_000_000,
            Tier::Thousand => 80_000_000,
            Tier::Unlimited => 100_000_000,
        }
    }

    /// Price in SOL, for display.
    pub fn price_sol(&self) -> f64 {
        self.price_lamports() as f64 / LAMPORTS_PER_SOL as f64
    }

    /// Human-readable label used by the buy menu.
    pub fn label(&self) -> String {
        match self.predictions() {
            Some(n) => format!("{} Predictions - {} SOL", n, self.price_sol()),
            None => format!("Unlimited - {} SOL", self.price_sol()),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.predictions() {
            Some(n) => write!(f, "{}", n),
            None => f.write_str("unlimited"),
        }
    }
}

impl FromStr for Tier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "100" => Ok(Tier::Hundred),
            "500" => Ok(Tier::FiveHundred),
            "1000" => Ok(Tier::Thousand),
            "unlimited" => Ok(Tier::Unlimited),
            other => anyhow::bail!(
                "Invalid tier: {}. Must be '100', '500', '1000' or 'unlimited'",
                other
            ),
        }
    }
}

// The service accepts `newLimit` as either a number or the string "unlimited".
impl Serialize for Tier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.predictions() {
            Some(n) => serializer.serialize_u32(n),
            None => serializer.serialize_str("unlimited"),
        }
    }
}
