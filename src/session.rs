//! Session state and the user actions that drive it.
//!
//! All state a front-end displays lives in [`Session`]. Each action borrows the
//! session mutably for its whole duration, so one session never runs two
//! actions at once.

use crate::client::api::{PredictRequest, PredictionApi};
use crate::client::catalog::{self, SymbolCatalog};
use crate::client::response::PredictOutcome;
use crate::error::{Alert, WalletError};
use crate::purchase::{PaymentConfirmation, PurchaseFlow, QuotaSync};
use crate::types::{Horizon, Symbol, Tier};
use crate::wallet::WalletAdapter;
use anyhow::Result;
use solana_sdk::pubkey::Pubkey;
use tracing::{error, info, warn};

/// Everything the view renders.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Connected wallet, if any
    pub wallet: Option<Pubkey>,
    /// Symbols offered by the service
    pub symbols: Vec<Symbol>,
    pub selected_symbol: Option<Symbol>,
    pub horizon: Horizon,
    /// Text of the last prediction or prediction error
    pub result: String,
    /// Successful predictions since start or since the last purchase
    pub prediction_count: u32,
    pub show_buy_menu: bool,
    /// Text of the last payment outcome
    pub payment_status: String,
    /// True only while a prediction request is in flight
    pub is_loading: bool,
    pub last_payment: Option<PaymentConfirmation>,
    pub last_quota_sync: Option<QuotaSync>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the symbol list and preselect the first symbol.
    pub async fn load_symbols(&mut self, catalog: &SymbolCatalog) -> Result<()> {
        match catalog.symbols().await {
            Ok(symbols) => {
                self.symbols = symbols.iter().cloned().collect();
                if self.selected_symbol.is_none() {
                    self.selected_symbol = Some(symbols.head.clone());
                }
                info!("Loaded {} symbols", self.symbols.len());
                Ok(())
            }
            Err(e) => {
                error!("Failed to load symbols: {:#}", e);
                Err(e)
            }
        }
    }

    /// Select one of the loaded symbols.
    pub fn select_symbol(&mut self, raw: &str) -> Result<Symbol, Alert> {
        let symbol = catalog::resolve(&self.symbols, raw).ok_or(Alert::InvalidInput)?;
        self.selected_symbol = Some(symbol.clone());
        Ok(symbol)
    }

    /// Set the horizon from free input, clamping into the valid range.
    pub fn set_horizon(&mut self, days: i64) {
        self.horizon = Horizon::clamped(days);
    }

    /// Connect the wallet. A missing wallet raises an alert with an install link.
    pub async fn connect_wallet(&mut self, wallet: &mut dyn WalletAdapter) -> Result<(), Alert> {
        match wallet.connect(false).await {
            Ok(pubkey) => {
                self.wallet = Some(pubkey);
                Ok(())
            }
            Err(WalletError::NotDetected { install_url }) => {
                Err(Alert::WalletNotDetected { install_url })
            }
            Err(e) => {
                error!("Wallet connection error: {}", e);
                Ok(())
            }
        }
    }

    /// Disconnect the wallet. The local identity is cleared even if the adapter fails.
    pub async fn disconnect_wallet(&mut self, wallet: &mut dyn WalletAdapter) {
        if let Err(e) = wallet.disconnect().await {
            warn!("Wallet disconnect failed: {}", e);
        }
        self.wallet = None;
    }

    /// Request a prediction for the selected symbol over `days` days.
    ///
    /// Invalid input is rejected with an alert before any request is made.
    /// Service and transport failures end up in `result`.
    pub async fn predict(&mut self, api: &dyn PredictionApi, days: i64) -> Result<(), Alert> {
        let symbol = self.selected_symbol.clone().ok_or(Alert::InvalidInput)?;
        let horizon = Horizon::new(days)?;
        self.horizon = horizon;

        let request = PredictRequest::new(self.wallet.as_ref(), symbol.clone(), horizon);

        self.is_loading = true;
        let outcome = api.predict(&request).await;
        self.is_loading = false;

        match outcome {
            Ok(PredictOutcome::Forecast(forecast)) => {
                self.result = forecast.render(&symbol, horizon);
                self.prediction_count += 1;
                if forecast.purchase_required() {
                    self.show_buy_menu = true;
                }
            }
            Ok(PredictOutcome::Refused { message }) => {
                self.result = format!("Error: {}", message);
                self.show_buy_menu = true;
            }
            Err(e) => {
                warn!("Prediction for {} failed: {}", symbol, e);
                self.result = e.display_text();
            }
        }
        Ok(())
    }

    /// Buy a prediction package with the connected wallet.
    ///
    /// After the payment is accepted the local counter is reset and the buy
    /// menu hidden, whatever the quota sync reports. A failed sync is appended
    /// to the payment status together with the payment signature. The session
    /// identity follows the adapter's current account.
    pub async fn buy_plan(
        &mut self,
        flow: &PurchaseFlow,
        wallet: &dyn WalletAdapter,
        tier: Tier,
    ) -> Result<(), Alert> {
        if self.wallet.is_none() {
            return Err(Alert::ConnectWallet);
        }

        // The adapter may have switched accounts since connecting
        if let Some(current) = wallet.public_key() {
            if self.wallet != Some(current) {
                info!("Wallet account changed to {}", current);
                self.wallet = Some(current);
            }
        }

        let confirmation = match flow.pay(wallet, tier).await {
            Ok(confirmation) => confirmation,
            Err(e) => {
                error!("Payment for tier {} failed: {}", tier, e);
                self.payment_status = e.display_text();
                return Ok(());
            }
        };

        self.payment_status = format!(
            "Payment sent! TX: {}",
            flow.explorer_link(&confirmation.signature)
        );
        self.prediction_count = 0;
        self.show_buy_menu = false;

        let sync = flow
            .sync_quota(&confirmation.payer, tier, &confirmation.signature)
            .await;
        if let QuotaSync::Failed { reason } = &sync {
            self.payment_status.push_str(&format!(
                "\nQuota update failed: {} (payment reference {})",
                reason, confirmation.signature
            ));
        }

        self.last_payment = Some(confirmation);
        self.last_quota_sync = Some(sync);
        Ok(())
    }

    /// Lines of the buy menu, or `None` while it is hidden.
    pub fn buy_menu(&self) -> Option<Vec<String>> {
        if !self.show_buy_menu {
            return None;
        }
        let mut lines = vec!["You used all free predictions. Buy more to continue:".to_string()];
        lines.extend(Tier::all().iter().map(Tier::label));
        Some(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_defaults() {
        let session = Session::new();
        assert!(session.wallet.is_none());
        assert_eq!(session.horizon.days(), 1);
        assert_eq!(session.prediction_count, 0);
        assert!(!session.show_buy_menu);
        assert!(session.buy_menu().is_none());
    }

    #[test]
    fn test_select_symbol_requires_known_symbol() {
        let mut session = Session::new();
        assert_eq!(session.select_symbol("BTC"), Err(Alert::InvalidInput));

        session.symbols = vec![Symbol::new("btc").unwrap()];
        assert_eq!(session.select_symbol("BTC").unwrap().as_str(), "btc");
        assert_eq!(session.selected_symbol.as_ref().unwrap().as_str(), "btc");
    }

    #[test]
    fn test_set_horizon_clamps() {
        let mut session = Session::new();
        session.set_horizon(42);
        assert_eq!(session.horizon.days(), 7);
        session.set_horizon(-1);
        assert_eq!(session.horizon.days(), 1);
    }

    #[test]
    fn test_buy_menu_lists_all_tiers() {
        let mut session = Session::new();
        session.show_buy_menu = true;

        let menu = session.buy_menu().unwrap();
        assert_eq!(menu.len(), 5);
        assert_eq!(menu[1], "100 Predictions - 0.01 SOL");
        assert_eq!(menu[4], "Unlimited - 0.1 SOL");
    }
}
