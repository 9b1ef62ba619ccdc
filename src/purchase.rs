//! Prediction package purchases paid with a native SOL transfer.
//!
//! Paying and syncing the quota with the service are separate steps. The
//! payment either lands on-chain or not; the quota sync result is returned to
//! the caller, which decides how to present a mismatch.

use crate::client::api::{PredictionApi, ResetUsageRequest};
use crate::config::ClientConfig;
use crate::error::PurchaseError;
use crate::network::Network;
use crate::types::Tier;
use crate::wallet::WalletAdapter;
use anyhow::Result;
use chrono::{DateTime, Utc};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, Retry};
use tracing::{info, instrument, warn};

/// A payment accepted by the cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentConfirmation {
    pub signature: Signature,
    pub tier: Tier,
    pub lamports: u64,
    pub payer: Pubkey,
    pub recipient: Pubkey,
    pub submitted_at: DateTime<Utc>,
}

/// Outcome of telling the service about a purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaSync {
    Confirmed,
    Failed { reason: String },
}

impl QuotaSync {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, QuotaSync::Confirmed)
    }
}

/// Unsigned single-transfer transaction paying for `tier`, with `payer` as fee payer.
///
/// The recent blockhash is left at its default and must be stamped before signing.
pub fn build_transfer(payer: &Pubkey, recipient: &Pubkey, tier: Tier) -> Transaction {
    let instruction = system_instruction::transfer(payer, recipient, tier.price_lamports());
    Transaction::new_with_payer(&[instruction], Some(payer))
}

/// Builds, signs and submits payments, then syncs the purchased quota.
pub struct PurchaseFlow {
    network: Arc<dyn Network>,
    api: Arc<dyn PredictionApi>,
    recipient: Pubkey,
    explorer_tx_url: String,
    quota_sync_retry_attempts: usize,
}

impl PurchaseFlow {
    pub fn new(
        network: Arc<dyn Network>,
        api: Arc<dyn PredictionApi>,
        recipient: Pubkey,
        explorer_tx_url: String,
        quota_sync_retry_attempts: usize,
    ) -> Self {
        Self {
            network,
            api,
            recipient,
            explorer_tx_url,
            quota_sync_retry_attempts,
        }
    }

    pub fn from_config(
        config: &ClientConfig,
        network: Arc<dyn Network>,
        api: Arc<dyn PredictionApi>,
    ) -> Result<Self> {
        Ok(Self::new(
            network,
            api,
            config.recipient_pubkey()?,
            config.explorer_tx_url.clone(),
            config.quota_sync_retry_attempts,
        ))
    }

    pub fn recipient(&self) -> &Pubkey {
        &self.recipient
    }

    /// Explorer link for a submitted payment.
    pub fn explorer_link(&self, signature: &Signature) -> String {
        format!("{}/{}", self.explorer_tx_url.trim_end_matches('/'), signature)
    }

    /// Pay for `tier` from the connected wallet.
    ///
    /// Nothing is built when the wallet is not connected. There is no retry:
    /// a failed submit may still land, so resubmitting is left to the user.
    #[instrument(skip_all, fields(tier = %tier))]
    pub async fn pay(
        &self,
        wallet: &dyn WalletAdapter,
        tier: Tier,
    ) -> Result<PaymentConfirmation, PurchaseError> {
        let payer = wallet.public_key().ok_or(PurchaseError::WalletNotConnected)?;

        let mut tx = build_transfer(&payer, &self.recipient, tier);
        tx.message.recent_blockhash = self
            .network
            .latest_blockhash()
            .await
            .map_err(|e| PurchaseError::Blockhash(format!("{:#}", e)))?;

        let signed = wallet.sign_transaction(tx).await?;

        let signature = self
            .network
            .send_raw_transaction(&signed)
            .await
            .map_err(|e| PurchaseError::Submit(format!("{:#}", e)))?;

        info!(
            "Payment of {} lamports for tier {} submitted: {}",
            tier.price_lamports(),
            tier,
            signature
        );

        Ok(PaymentConfirmation {
            signature,
            tier,
            lamports: tier.price_lamports(),
            payer,
            recipient: self.recipient,
            submitted_at: Utc::now(),
        })
    }

    /// Ask the service to raise the wallet's limit to the purchased tier.
    #[instrument(skip_all, fields(payer = %payer, tier = %tier, signature = %signature))]
    pub async fn sync_quota(&self, payer: &Pubkey, tier: Tier, signature: &Signature) -> QuotaSync {
        let request = ResetUsageRequest {
            wallet: payer.to_string(),
            new_limit: tier,
        };

        let retry_strategy = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(5))
            .take(self.quota_sync_retry_attempts);

        match Retry::spawn(retry_strategy, || self.api.reset_usage(&request)).await {
            Ok(()) => {
                info!("Quota for {} raised to {}", payer, tier);
                QuotaSync::Confirmed
            }
            Err(e) => {
                warn!(
                    "Quota sync failed after payment {}; service limit not raised: {:#}",
                    signature, e
                );
                QuotaSync::Failed {
                    reason: format!("{:#}", e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::api::PredictRequest;
    use crate::client::response::PredictOutcome;
    use crate::error::PredictError;
    use crate::types::Symbol;
    use crate::wallet::KeypairWallet;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use solana_sdk::hash::Hash;
    use solana_sdk::signature::Keypair;
    use solana_sdk::system_program;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeNetwork {
        blockhash: Hash,
        submitted: Mutex<Vec<Transaction>>,
        fail_submit: bool,
    }

    impl FakeNetwork {
        fn new(fail_submit: bool) -> Self {
            Self {
                blockhash: Hash::new_unique(),
                submitted: Mutex::new(Vec::new()),
                fail_submit,
            }
        }
    }

    #[async_trait]
    impl Network for FakeNetwork {
        async fn latest_blockhash(&self) -> Result<Hash> {
            Ok(self.blockhash)
        }

        async fn send_raw_transaction(&self, tx: &Transaction) -> Result<Signature> {
            if self.fail_submit {
                return Err(anyhow!("insufficient funds for fee"));
            }
            self.submitted.lock().unwrap().push(tx.clone());
            Ok(tx.signatures[0])
        }
    }

    struct FlakyApi {
        failures_before_success: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PredictionApi for FlakyApi {
        async fn symbols(&self) -> Result<Vec<Symbol>> {
            Ok(vec![])
        }

        async fn predict(&self, _request: &PredictRequest) -> Result<PredictOutcome, PredictError> {
            Err(PredictError::UnexpectedResponse)
        }

        async fn reset_usage(&self, _request: &ResetUsageRequest) -> Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                Err(anyhow!("service unavailable"))
            } else {
                Ok(())
            }
        }
    }

    fn flow(network: Arc<FakeNetwork>, api: Arc<FlakyApi>, retries: usize) -> PurchaseFlow {
        PurchaseFlow::new(
            network,
            api,
            Pubkey::new_unique(),
            "https://solscan.io/tx".to_string(),
            retries,
        )
    }

    fn api(failures_before_success: usize) -> Arc<FlakyApi> {
        Arc::new(FlakyApi {
            failures_before_success,
            calls: AtomicUsize::new(0),
        })
    }

    #[test]
    fn test_build_transfer() {
        let payer = Pubkey::new_unique();
        let recipient = Pubkey::new_unique();
        let tx = build_transfer(&payer, &recipient, Tier::Thousand);

        assert_eq!(tx.message.account_keys[0], payer);
        assert_eq!(tx.message.instructions.len(), 1);
        assert_eq!(tx.message.header.num_required_signatures, 1);

        let expected = system_instruction::transfer(&payer, &recipient, 80_000_000);
        let compiled = &tx.message.instructions[0];
        assert_eq!(compiled.data, expected.data);
        assert_eq!(
            tx.message.account_keys[compiled.program_id_index as usize],
            system_program::id()
        );
    }

    #[tokio::test]
    async fn test_pay_without_wallet_builds_nothing() {
        let network = Arc::new(FakeNetwork::new(false));
        let flow = flow(network.clone(), api(0), 0);
        let wallet = KeypairWallet::from_keypair(Keypair::new());

        let err = flow.pay(&wallet, Tier::FiveHundred).await.unwrap_err();
        assert!(matches!(err, PurchaseError::WalletNotConnected));
        assert!(network.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pay_signs_and_submits() {
        let network = Arc::new(FakeNetwork::new(false));
        let flow = flow(network.clone(), api(0), 0);
        let mut wallet = KeypairWallet::from_keypair(Keypair::new());
        let payer = wallet.connect(false).await.unwrap();

        let confirmation = flow.pay(&wallet, Tier::Unlimited).await.unwrap();

        assert_eq!(confirmation.payer, payer);
        assert_eq!(confirmation.lamports, 100_000_000);
        assert_eq!(confirmation.recipient, *flow.recipient());

        let submitted = network.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].message.recent_blockhash, network.blockhash);
        assert_eq!(submitted[0].message.account_keys[0], payer);
        assert!(submitted[0].verify().is_ok());
        assert_eq!(submitted[0].signatures[0], confirmation.signature);
    }

    #[tokio::test]
    async fn test_submit_failure_is_reported() {
        let network = Arc::new(FakeNetwork::new(true));
        let flow = flow(network, api(0), 0);
        let mut wallet = KeypairWallet::from_keypair(Keypair::new());
        wallet.connect(false).await.unwrap();

        let err = flow.pay(&wallet, Tier::Hundred).await.unwrap_err();
        assert!(err.display_text().starts_with("Payment failed: "));
        assert!(err.to_string().contains("insufficient funds"));
    }

    #[tokio::test]
    async fn test_quota_sync_single_attempt_by_default() {
        let api = api(1);
        let flow = flow(Arc::new(FakeNetwork::new(false)), api.clone(), 0);

        let sync = flow
            .sync_quota(&Pubkey::new_unique(), Tier::Hundred, &Signature::default())
            .await;

        assert!(matches!(
            sync,
            QuotaSync::Failed { ref reason } if reason.contains("service unavailable")
        ));
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_quota_sync_retries_when_configured() {
        let api = api(1);
        let flow = flow(Arc::new(FakeNetwork::new(false)), api.clone(), 2);

        let sync = flow
            .sync_quota(&Pubkey::new_unique(), Tier::Thousand, &Signature::default())
            .await;

        assert!(sync.is_confirmed());
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_explorer_link() {
        let flow = flow(Arc::new(FakeNetwork::new(false)), api(0), 0);
        let signature = Signature::default();
        assert_eq!(
            flow.explorer_link(&signature),
            format!("https://solscan.io/tx/{}", signature)
        );
    }
}
