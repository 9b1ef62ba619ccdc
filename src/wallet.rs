//! Wallet adapter abstraction and a keypair-file implementation.
//!
//! The adapter owns the signing key. Callers only ever see the public key and
//! hand over unsigned transactions.

use crate::error::{WalletError, WALLET_INSTALL_URL};
use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair, Signer};
use solana_sdk::transaction::Transaction;
use std::path::PathBuf;
use tracing::{debug, info, instrument};

/// Capabilities consumed from a wallet.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    /// Whether a wallet is present at all.
    fn is_available(&self) -> bool;

    /// Connect and return the wallet's public key.
    ///
    /// With `only_if_trusted` the wallet connects silently or not at all.
    async fn connect(&mut self, only_if_trusted: bool) -> Result<Pubkey, WalletError>;

    async fn disconnect(&mut self) -> Result<(), WalletError>;

    /// Public key of the connected wallet.
    fn public_key(&self) -> Option<Pubkey>;

    /// Sign a transaction whose recent blockhash is already set.
    async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction, WalletError>;
}

enum KeySource {
    File(PathBuf),
    Memory(Keypair),
    Missing,
}

/// Wallet backed by a Solana keypair, usually a file written by `solana-keygen`.
pub struct KeypairWallet {
    source: KeySource,
    keypair: Option<Keypair>,
    trusted: bool,
}

impl KeypairWallet {
    /// Wallet that loads its key from `path` on connect.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: KeySource::File(path.into()),
            keypair: None,
            trusted: false,
        }
    }

    /// Wallet over an in-memory key. It starts out trusted.
    pub fn from_keypair(keypair: Keypair) -> Self {
        Self {
            source: KeySource::Memory(keypair),
            keypair: None,
            trusted: true,
        }
    }

    /// Wallet with no key at all; every connect reports it as not detected.
    pub fn unavailable() -> Self {
        Self {
            source: KeySource::Missing,
            keypair: None,
            trusted: false,
        }
    }

    fn load(&self) -> Result<Keypair, WalletError> {
        match &self.source {
            KeySource::File(path) => {
                if !path.exists() {
                    return Err(not_detected());
                }
                read_keypair_file(path).map_err(|e| {
                    WalletError::Rejected(format!("cannot read {}: {}", path.display(), e))
                })
            }
            KeySource::Memory(keypair) => Ok(keypair.insecure_clone()),
            KeySource::Missing => Err(not_detected()),
        }
    }
}

fn not_detected() -> WalletError {
    WalletError::NotDetected {
        install_url: WALLET_INSTALL_URL.to_string(),
    }
}

#[async_trait]
impl WalletAdapter for KeypairWallet {
    fn is_available(&self) -> bool {
        match &self.source {
            KeySource::File(path) => path.exists(),
            KeySource::Memory(_) => true,
            KeySource::Missing => false,
        }
    }

    #[instrument(skip(self))]
    async fn connect(&mut self, only_if_trusted: bool) -> Result<Pubkey, WalletError> {
        if !self.is_available() {
            return Err(not_detected());
        }
        if only_if_trusted && !self.trusted {
            return Err(WalletError::Rejected("wallet has not been approved yet".to_string()));
        }

        let keypair = self.load()?;
        let pubkey = keypair.pubkey();
        self.keypair = Some(keypair);
        self.trusted = true;

        info!("Wallet connected: {}", pubkey);
        Ok(pubkey)
    }

    async fn disconnect(&mut self) -> Result<(), WalletError> {
        if self.keypair.take().is_some() {
            info!("Wallet disconnected");
        }
        Ok(())
    }

    fn public_key(&self) -> Option<Pubkey> {
        self.keypair.as_ref().map(|k| k.pubkey())
    }

    #[instrument(skip(self, tx))]
    async fn sign_transaction(&self, mut tx: Transaction) -> Result<Transaction, WalletError> {
        let keypair = self.keypair.as_ref().ok_or(WalletError::NotConnected)?;
        let blockhash = tx.message.recent_blockhash;

        tx.try_sign(&[keypair], blockhash)
            .map_err(|e| WalletError::Signing(e.to_string()))?;

        debug!("Signed transaction with blockhash {}", blockhash);
        Ok(tx)
    }
}
