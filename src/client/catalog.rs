//! Cached list of symbols the prediction service supports.

use crate::client::api::PredictionApi;
use crate::types::Symbol;
use anyhow::{anyhow, Result};
use moka::future::Cache;
use nonempty::NonEmpty;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Symbol list fetched from `/symbols` and cached for a fixed TTL.
pub struct SymbolCatalog {
    api: Arc<dyn PredictionApi>,
    cache: Cache<(), Arc<NonEmpty<Symbol>>>,
}

impl SymbolCatalog {
    pub fn new(api: Arc<dyn PredictionApi>, ttl_seconds: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(ttl_seconds))
            .build();

        Self { api, cache }
    }

    /// Current symbol list, fetched on first use or after expiry.
    #[instrument(skip(self))]
    pub async fn symbols(&self) -> Result<Arc<NonEmpty<Symbol>>> {
        self.cache
            .try_get_with((), self.fetch())
            .await
            .map_err(|e| anyhow!("{:#}", e))
    }

    /// Drop the cached list so the next call refetches.
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
        info!("Cleared symbol cache");
    }

    async fn fetch(&self) -> Result<Arc<NonEmpty<Symbol>>> {
        let symbols = self.api.symbols().await?;
        let symbols = NonEmpty::from_vec(symbols).ok_or_else(|| anyhow!("No symbols found."))?;
        debug!("Caching {} symbols", symbols.len());
        Ok(Arc::new(symbols))
    }
}

/// Match user input against known symbols: exact first, then ignoring case.
pub fn resolve(symbols: &[Symbol], raw: &str) -> Option<Symbol> {
    let raw = raw.trim();
    symbols
        .iter()
        .find(|s| s.as_str() == raw)
        .or_else(|| symbols.iter().find(|s| s.as_str().eq_ignore_ascii_case(raw)))
        .cloned()
}
