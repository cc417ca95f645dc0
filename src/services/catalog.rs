//! Check Catalog
//!
//! The registry of analysis checks the engine accepts, with descriptive
//! metadata. Loaded once at startup and shared read-only; its argument set is
//! the whitelist for everything the selector returns.

use std::collections::HashMap;
use std::path::Path;

use contract_guard_core::CheckDescriptor;
use serde::Deserialize;

use crate::services::engine::AnalysisEngine;
use crate::utils::error::{AppError, AppResult};

/// On-disk catalog formats.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Wrapped { detectors: Vec<CheckDescriptor> },
    Bare(Vec<CheckDescriptor>),
}

#[derive(Debug, Clone, Default)]
pub struct CheckCatalog {
    descriptors: Vec<CheckDescriptor>,
    by_argument: HashMap<String, usize>,
}

impl CheckCatalog {
    /// Build a catalog, rejecting duplicate or empty arguments.
    pub fn from_descriptors(descriptors: Vec<CheckDescriptor>) -> AppResult<Self> {
        let mut by_argument = HashMap::with_capacity(descriptors.len());
        for (i, descriptor) in descriptors.iter().enumerate() {
            if descriptor.argument.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "catalog entry {} has an empty argument",
                    i
                )));
            }
            if by_argument.insert(descriptor.argument.clone(), i).is_some() {
                return Err(AppError::validation(format!(
                    "duplicate check argument in catalog: {}",
                    descriptor.argument
                )));
            }
        }
        Ok(Self {
            descriptors,
            by_argument,
        })
    }

    /// Load `{"detectors": [...]}` or a bare array of descriptors.
    pub fn load_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: CatalogFile = serde_json::from_str(&content)?;
        let descriptors = match file {
            CatalogFile::Wrapped { detectors } => detectors,
            CatalogFile::Bare(list) => list,
        };
        Self::from_descriptors(descriptors)
    }

    /// Load the catalog for this process.
    ///
    /// A catalog file is checked against the engine's own listing; any
    /// argument the engine does not know is fatal. Without a file the
    /// engine's listing is the catalog.
    pub async fn load(path: Option<&Path>, engine: &dyn AnalysisEngine) -> AppResult<Self> {
        let engine_checks = engine.list_checks().await?;
        let catalog = match path {
            Some(path) => {
                let catalog = Self::load_file(path)?;
                catalog.verify_against(&engine_checks)?;
                tracing::info!(path = %path.display(), checks = catalog.len(), "check catalog loaded from file");
                catalog
            }
            None => {
                let catalog = Self::from_descriptors(engine_checks)?;
                tracing::info!(checks = catalog.len(), "check catalog loaded from engine");
                catalog
            }
        };
        Ok(catalog)
    }

    /// Every argument must be one the engine accepts.
    pub fn verify_against(&self, engine_checks: &[CheckDescriptor]) -> AppResult<()> {
        let known: std::collections::HashSet<&str> =
            engine_checks.iter().map(|d| d.argument.as_str()).collect();
        let unknown: Vec<String> = self
            .descriptors
            .iter()
            .filter(|d| !known.contains(d.argument.as_str()))
            .map(|d| d.argument.clone())
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(AppError::CatalogMismatch { unknown })
        }
    }

    pub fn contains(&self, argument: &str) -> bool {
        self.by_argument.contains_key(argument)
    }

    pub fn get(&self, argument: &str) -> Option<&CheckDescriptor> {
        self.by_argument.get(argument).map(|&i| &self.descriptors[i])
    }

    /// Descriptors in catalog order.
    pub fn descriptors(&self) -> &[CheckDescriptor] {
        &self.descriptors
    }

    /// One retrieval document per descriptor, in catalog order.
    pub fn documents(&self) -> AppResult<Vec<String>> {
        self.descriptors
            .iter()
            .map(|d| d.to_document().map_err(AppError::from))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
