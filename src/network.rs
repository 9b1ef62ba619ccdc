//! Solana network access needed to pay for predictions.

use anyhow::{Context, Result};
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::hash::Hash;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Cluster operations used by the purchase flow.
#[async_trait]
pub trait Network: Send + Sync {
    /// Latest blockhash to stamp a new transaction with.
    async fn latest_blockhash(&self) -> Result<Hash>;

    /// Serialize and submit a signed transaction, returning its signature.
    async fn send_raw_transaction(&self, tx: &Transaction) -> Result<Signature>;
}

/// [`Network`] over a JSON-RPC endpoint.
pub struct RpcNetwork {
    rpc_client: Arc<RpcClient>,
}

impl RpcNetwork {
    pub fn new(rpc_url: String, timeout_seconds: u64) -> Self {
        Self {
            rpc_client: Arc::new(RpcClient::new_with_timeout(
                rpc_url,
                Duration::from_secs(timeout_seconds),
            )),
        }
    }

    pub fn url(&self) -> String {
        self.rpc_client.url()
    }
}

#[async_trait]
impl Network for RpcNetwork {
    #[instrument(skip(self))]
    async fn latest_blockhash(&self) -> Result<Hash> {
        let blockhash = self
            .rpc_client
            .get_latest_blockhash()
            .await
            .context("getLatestBlockhash failed")?;

        debug!("Latest blockhash: {}", blockhash);
        Ok(blockhash)
    }

    #[instrument(skip(self, tx))]
    async fn send_raw_transaction(&self, tx: &Transaction) -> Result<Signature> {
        let signature = self
            .rpc_client
            .send_transaction(tx)
            .await
            .context("sendTransaction failed")?;

        debug!("Transaction submitted: {}", signature);
        Ok(signature)
    }
}
