//! Per-run contract model cache.
//!
//! Later rounds of a run usually target the same address; the cache makes
//! sure each address is loaded at most once per run. Failed loads are
//! remembered too and are not retried within the run.

use std::collections::HashMap;
use std::sync::Arc;

use super::{AnalysisEngine, ContractModel};

pub struct ModelCache {
    engine: Arc<dyn AnalysisEngine>,
    models: HashMap<String, Option<Arc<ContractModel>>>,
}

impl ModelCache {
    pub fn new(engine: Arc<dyn AnalysisEngine>) -> Self {
        Self {
            engine,
            models: HashMap::new(),
        }
    }

    /// The model for `address`, loading it on first use.
    ///
    /// Returns `None` when the contract cannot be loaded.
    pub async fn get(&mut self, address: &str) -> Option<Arc<ContractModel>> {
        let key = address.to_ascii_lowercase();
        if let Some(cached) = self.models.get(&key) {
            return cached.clone();
        }

        let loaded = match self.engine.load(address).await {
            Ok(model) => {
                tracing::debug!(
                    address,
                    contracts = model.contracts.len(),
                    source_len = model.source_code.len(),
                    "contract loaded"
                );
                Some(Arc::new(model))
            }
            Err(e) => {
                tracing::warn!(address, error = %e, "contract load failed");
                None
            }
        };
        self.models.insert(key, loaded.clone());
        loaded
    }

    /// The engine this cache loads through.
    pub fn engine(&self) -> &Arc<dyn AnalysisEngine> {
        &self.engine
    }
}
