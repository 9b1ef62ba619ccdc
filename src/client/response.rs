//! Prediction response shapes and their normalization.
//!
//! The service answers `/predict-lstm` with one of several shapes. Everything
//! is resolved here into a [`PredictOutcome`] so nothing downstream inspects
//! raw JSON.

use crate::error::PredictError;
use crate::types::{Horizon, PredictionPoint, Symbol};
use serde::Deserialize;
use serde_json::Value;

/// The `prediction` field is either a flat list or a list wrapped in an object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PredictionPayload {
    Flat(Vec<PredictionPoint>),
    Nested { prediction: Vec<PredictionPoint> },
}

impl PredictionPayload {
    pub fn into_points(self) -> Vec<PredictionPoint> {
        match self {
            PredictionPayload::Flat(points) => points,
            PredictionPayload::Nested { prediction } => prediction,
        }
    }
}

/// Usage counters reported for free-plan wallets.
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaInfo {
    pub remaining: i64,
    pub used: Option<i64>,
}

/// Success body of `/predict-lstm`, as sent on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPredictResponse {
    pub prediction: Option<PredictionPayload>,
    pub paid: Option<bool>,
    pub quota: Option<QuotaInfo>,
    pub free_predictions_left: Option<i64>,
    pub message: Option<String>,
}

/// A usable prediction together with the quota state that came with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub points: Vec<PredictionPoint>,
    pub paid: bool,
    pub remaining: Option<i64>,
    pub free_predictions_left: Option<i64>,
}

impl Forecast {
    /// Quota line appended under the predicted prices.
    pub fn quota_suffix(&self) -> Option<String> {
        if self.paid {
            return Some("Paid plan. Predictions remaining: unlimited".to_string());
        }
        match self.remaining {
            Some(remaining) if remaining >= 0 => Some(format!("Predictions left: {}", remaining)),
            _ => None,
        }
    }

    /// Whether the free quota is used up and the buy menu should be offered.
    ///
    /// `free_predictions_left` wins when present, then `quota.remaining`;
    /// with neither the quota counts as exhausted.
    pub fn purchase_required(&self) -> bool {
        if self.paid {
            return false;
        }
        self.free_predictions_left.or(self.remaining).unwrap_or(0) <= 0
    }

    /// Multi-line text shown in the result area.
    pub fn render(&self, symbol: &Symbol, horizon: Horizon) -> String {
        let mut lines = Vec::with_capacity(self.points.len() + 2);
        lines.push(format!("Predicted price(s) for {} in {} day(s):", symbol, horizon));
        lines.extend(
            self.points
                .iter()
                .map(|p| format!("{}: ${}", p.timestamp, p.predicted_price)),
        );
        if let Some(suffix) = self.quota_suffix() {
            lines.push(suffix);
        }
        lines.join("\n")
    }
}

/// Result of a successful `/predict-lstm` exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictOutcome {
    /// At least one predicted point
    Forecast(Forecast),
    /// The service declined to predict, e.g. because the free quota is exhausted
    Refused { message: String },
}

impl RawPredictResponse {
    /// Resolve the wire shape into an outcome.
    pub fn normalize(self) -> Result<PredictOutcome, PredictError> {
        let points = self
            .prediction
            .map(PredictionPayload::into_points)
            .unwrap_or_default();

        if !points.is_empty() {
            return Ok(PredictOutcome::Forecast(Forecast {
                points,
                paid: self.paid.unwrap_or(false),
                remaining: self.quota.map(|q| q.remaining),
                free_predictions_left: self.free_predictions_left,
            }));
        }

        match self.message {
            Some(message) => Ok(PredictOutcome::Refused { message }),
            None => Err(PredictError::UnexpectedResponse),
        }
    }
}

/// Parse a success body. Anything that does not fit the known shapes is unexpected.
pub fn parse_success_body(body: &str) -> Result<PredictOutcome, PredictError> {
    let raw: RawPredictResponse =
        serde_json::from_str(body).map_err(|_| PredictError::UnexpectedResponse)?;
    raw.normalize()
}

/// Extract the display text from a failure body: `detail`, then `message`.
///
/// Null and empty strings are skipped.
pub fn error_text(status: u16, body: &str) -> String {
    let fallback = || format!("HTTP {}", status);
    let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) else {
        return fallback();
    };

    ["detail", "message"]
        .iter()
        .filter_map(|key| fields.get(*key))
        .find_map(|value| match value {
            Value::Null => None,
            Value::String(text) if text.is_empty() => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        })
        .unwrap_or_else(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn btc() -> Symbol {
        Symbol::new("BTC").unwrap()
    }

    #[test]
    fn test_flat_list_renders_one_line_per_point_in_order() {
        let body = r#"{"prediction":[
            {"timestamp":"2025-01-01","Predicted_Price":101.5},
            {"timestamp":"2025-01-02","Predicted_Price":99},
            {"timestamp":"2025-01-03","Predicted_Price":100.25}
        ],"paid":false,"quota":{"remaining":3}}"#;

        let PredictOutcome::Forecast(forecast) = parse_success_body(body).unwrap() else {
            panic!("Expected a forecast");
        };
        let text = forecast.render(&btc(), Horizon::new(3).unwrap());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Predicted price(s) for BTC in 3 day(s):");
        assert_eq!(lines[1], "2025-01-01: $101.5");
        assert_eq!(lines[2], "2025-01-02: $99");
        assert_eq!(lines[3], "2025-01-03: $100.25");
        assert_eq!(lines[4], "Predictions left: 3");
    }

    #[test]
    fn test_nested_list_is_normalized() {
        let body = r#"{"prediction":{"prediction":[{"timestamp":"t1","Predicted_Price":5}],"wallet":"x"},
            "free_predictions_left":999,"paid":true}"#;

        match parse_success_body(body).unwrap() {
            PredictOutcome::Forecast(forecast) => {
                assert_eq!(forecast.points.len(), 1);
                assert_eq!(forecast.points[0].timestamp, "t1");
                assert!(forecast.paid);
            }
            other => panic!("Expected a forecast, got {:?}", other),
        }
    }

    #[test]
    fn test_paid_suffix_is_unlimited() {
        let forecast = Forecast {
            points: vec![],
            paid: true,
            remaining: Some(0),
            free_predictions_left: Some(0),
        };
        assert_eq!(
            forecast.quota_suffix().unwrap(),
            "Paid plan. Predictions remaining: unlimited"
        );
        assert!(!forecast.purchase_required());
    }

    #[test]
    fn test_free_suffix_shows_remaining() {
        let forecast = Forecast {
            points: vec![],
            paid: false,
            remaining: Some(4),
            free_predictions_left: Some(4),
        };
        assert_eq!(forecast.quota_suffix().unwrap(), "Predictions left: 4");
        assert!(!forecast.purchase_required());
    }

    #[test]
    fn test_purchase_required_when_free_quota_exhausted() {
        let mut forecast = Forecast {
            points: vec![],
            paid: false,
            remaining: Some(0),
            free_predictions_left: Some(0),
        };
        assert!(forecast.purchase_required());

        forecast.free_predictions_left = Some(-1);
        forecast.remaining = None;
        assert!(forecast.purchase_required());

        forecast.free_predictions_left = None;
        assert!(forecast.purchase_required());
    }

    #[test]
    fn test_message_only_is_refused() {
        let body = r#"{"message":"Free predictions exhausted","free_predictions_left":0,"paid":false}"#;
        assert_eq!(
            parse_success_body(body).unwrap(),
            PredictOutcome::Refused { message: "Free predictions exhausted".to_string() }
        );
    }

    #[test]
    fn test_empty_or_malformed_is_unexpected() {
        let bodies = [
            r#"{"prediction":[]}"#,
            r#"{}"#,
            r#"[1,2,3]"#,
            "not json",
            r#"{"prediction":"soon"}"#,
        ];
        for body in bodies {
            assert!(
                matches!(parse_success_body(body), Err(PredictError::UnexpectedResponse)),
                "body {} should be unexpected",
                body
            );
        }
    }

    #[test]
    fn test_error_text_prefers_detail() {
        assert_eq!(
            error_text(400, r#"{"detail":"Missing symbol or days"}"#),
            "Missing symbol or days"
        );
        assert_eq!(error_text(500, r#"{"message":"boom"}"#), "boom");
        assert_eq!(error_text(500, r#"{"detail":null,"message":"boom"}"#), "boom");
        assert_eq!(
            error_text(400, r#"{"detail":"","message":"quota exhausted"}"#),
            "quota exhausted"
        );
        assert_eq!(error_text(400, r#"{"detail":"","message":""}"#), "HTTP 400");
        assert_eq!(error_text(502, "<html>bad gateway</html>"), "HTTP 502");
        assert_eq!(
            error_text(422, r#"{"detail":[{"loc":["body","days"]}]}"#),
            r#"[{"loc":["body","days"]}]"#
        );
    }
}
