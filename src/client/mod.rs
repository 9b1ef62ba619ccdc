//! Prediction service client.
//!
//! `api` talks HTTP, `response` turns wire shapes into outcomes, and `catalog`
//! caches the symbol list.

pub mod api;
pub mod catalog;
pub mod response;

pub use api::{HttpPredictionClient, PredictRequest, PredictionApi, ResetUsageRequest};
pub use catalog::SymbolCatalog;
pub use response::{Forecast, PredictOutcome, PredictionPayload, RawPredictResponse};
