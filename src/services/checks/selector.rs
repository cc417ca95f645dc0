//! Check Selector
//!
//! Maps a natural-language question to the catalog checks worth running.
//! The catalog is embedded once into a [`VectorIndex`]; each query retrieves
//! the top-k descriptors, whose arguments are whitelisted against the catalog
//! before anything reaches the engine. An optional language-model pass narrows
//! the retrieved candidates further.

use std::collections::HashSet;
use std::sync::Arc;

use contract_guard_core::CheckDescriptor;
use contract_guard_llm::{LlmProvider, LlmRequestOptions, Message, ToolCallMode};
use tokio::sync::OnceCell;

use super::address::validate_address;
use crate::services::catalog::CheckCatalog;
use crate::services::embedding::{EmbeddingProvider, VectorIndex};
use crate::utils::error::AppResult;

pub const DEFAULT_TOP_K: usize = 5;

const REFINE_PROMPT: &str = "You select static-analysis detectors for a smart contract security question. \
Below are the candidate detectors with their documentation. \
Return ONLY the argument of the detectors required, they should be comma separated. \
Example answer: uninitialized-state, uninitialized-local";

/// Outcome of a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// No usable contract address; nothing may be run.
    NoTarget,
    /// Checks to run against `address`, best match first.
    Checks { address: String, ids: Vec<String> },
}

pub struct CheckSelector {
    catalog: Arc<CheckCatalog>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: OnceCell<VectorIndex>,
    top_k: usize,
    refiner: Option<Arc<dyn LlmProvider>>,
}

impl CheckSelector {
    pub fn new(catalog: Arc<CheckCatalog>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            catalog,
            embedder,
            index: OnceCell::new(),
            top_k: DEFAULT_TOP_K,
            refiner: None,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Let a language model narrow the retrieved candidates.
    pub fn with_refiner(mut self, refiner: Arc<dyn LlmProvider>) -> Self {
        self.refiner = Some(refiner);
        self
    }

    pub fn catalog(&self) -> &Arc<CheckCatalog> {
        &self.catalog
    }

    /// Use a prebuilt index instead of embedding the catalog.
    #[cfg(test)]
    fn with_index(mut self, index: VectorIndex) -> Self {
        self.index = OnceCell::from(index);
        self
    }

    /// Choose checks for `query` against the contract at `address`.
    ///
    /// An invalid address short-circuits before any retrieval. Retrieval
    /// failures degrade to an empty selection.
    pub async fn select(&self, address: Option<&str>, query: &str) -> Selection {
        let Some(address) = validate_address(address) else {
            tracing::debug!(address = ?address, "no valid target address");
            return Selection::NoTarget;
        };
        let address = address.to_string();

        let query = query.trim();
        if query.is_empty() || self.catalog.is_empty() {
            return Selection::Checks {
                address,
                ids: Vec::new(),
            };
        }

        let ids = match self.retrieve(query).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(error = %e, "check retrieval failed");
                Vec::new()
            }
        };
        let ids = match (&self.refiner, ids.is_empty()) {
            (Some(refiner), false) => self.refine(refiner.as_ref(), query, ids).await,
            _ => ids,
        };

        tracing::debug!(address = %address, checks = ?ids, "checks selected");
        Selection::Checks { address, ids }
    }

    async fn index(&self) -> AppResult<&VectorIndex> {
        let index = self
            .index
            .get_or_try_init(|| async {
                let documents = self.catalog.documents()?;
                let index = VectorIndex::build(self.embedder.clone(), documents).await?;
                AppResult::Ok(index)
            })
            .await?;
        Ok(index)
    }

    /// Top-k catalog arguments for `query`, deduplicated in rank order.
    async fn retrieve(&self, query: &str) -> AppResult<Vec<String>> {
        let hits = self.index().await?.query(query, self.top_k).await?;

        let mut seen = HashSet::new();
        let mut ids = Vec::with_capacity(hits.len());
        for hit in hits {
            let argument = match CheckDescriptor::argument_from_document(&hit.document) {
                Ok(argument) => argument,
                Err(e) => {
                    tracing::debug!(index = hit.index, error = %e, "skipping unparseable document");
                    continue;
                }
            };
            if !self.catalog.contains(&argument) {
                tracing::debug!(argument = %argument, "dropping check not in catalog");
                continue;
            }
            if seen.insert(argument.clone()) {
                ids.push(argument);
            }
        }
        Ok(ids)
    }

    /// Ask the model which candidates actually matter.
    ///
    /// Falls back to `candidates` when the call fails or names nothing valid.
    async fn refine(&self, refiner: &dyn LlmProvider, query: &str, candidates: Vec<String>) -> Vec<String> {
        let documents: Vec<String> = candidates
            .iter()
            .filter_map(|id| self.catalog.get(id))
            .filter_map(|d| d.to_document().ok())
            .collect();
        let prompt = format!(
            "<detectors>\n{}\n</detectors>\nQuestion: {}",
            documents.join("\n"),
            query
        );
        let options = LlmRequestOptions::default()
            .with_tool_call_mode(ToolCallMode::None)
            .with_temperature(0.0);

        let reply = match refiner
            .send_message(vec![Message::user(prompt)], Some(REFINE_PROMPT.to_string()), vec![], options)
            .await
        {
            Ok(response) => response.content.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "check refinement failed, using retrieval result");
                return candidates;
            }
        };

        let refined = parse_refined(&reply, &candidates);
        if refined.is_empty() {
            tracing::debug!(reply = %reply, "refinement named no candidate, using retrieval result");
            candidates
        } else {
            refined
        }
    }
}

/// Split a comma-separated reply and keep the candidates it names, in reply order.
fn parse_refined(reply: &str, candidates: &[String]) -> Vec<String> {
    let mut refined: Vec<String> = Vec::new();
    for part in reply.split([',', '\n']) {
        let name = part.trim().trim_matches(|c: char| c == '`' || c == '"' || c == '\'' || c == '.');
        if let Some(candidate) = candidates.iter().find(|c| c.as_str() == name) {
            if !refined.contains(candidate) {
                refined.push(candidate.clone());
            }
        }
    }
    refined
}
