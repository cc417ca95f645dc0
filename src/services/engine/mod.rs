//! Analysis Engine
//!
//! The boundary to the static-analysis engine: listing the checks it knows,
//! loading a contract by address, and running a batch of named checks
//! against a loaded contract. [`SlitherEngine`] drives the Slither CLI;
//! tests substitute scripted engines.

pub mod cache;
pub mod etherscan;
pub mod outline;
pub mod slither;

use async_trait::async_trait;
use contract_guard_core::CheckDescriptor;
use thiserror::Error;

pub use cache::ModelCache;
pub use etherscan::EtherscanClient;
pub use outline::{ContractOutline, FunctionOutline, Visibility};
pub use slither::SlitherEngine;

/// Errors raised by an analysis engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The contract could not be fetched or compiled.
    #[error("failed to load contract {address}: {message}")]
    Load { address: String, message: String },

    /// The engine ran but reported a failure.
    #[error("check execution failed: {0}")]
    Execution(String),

    /// The engine's output could not be understood.
    #[error("unexpected engine output: {0}")]
    Parse(String),

    /// The engine process could not be started.
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    /// The engine did not finish in time.
    #[error("engine timed out after {0}s")]
    Timeout(u64),
}

impl EngineError {
    pub fn load(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Load {
            address: address.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// A loaded contract: its source and a structural outline of it.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractModel {
    pub address: String,
    pub source_code: String,
    /// Contracts, interfaces and libraries in source order.
    pub contracts: Vec<ContractOutline>,
}

impl ContractModel {
    /// Build a model by outlining `source_code`.
    pub fn from_source(address: impl Into<String>, source_code: impl Into<String>) -> Self {
        let source_code = source_code.into();
        let contracts = outline::parse_outline(&source_code);
        Self {
            address: address.into(),
            source_code,
            contracts,
        }
    }
}

/// Parent reference of a raw element as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawParent {
    pub element_type: String,
    pub name: String,
}

/// A source element referenced by a raw issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawElement {
    pub element_type: String,
    pub name: String,
    pub parent: Option<RawParent>,
}

/// One issue as reported by the engine, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIssue {
    pub check: String,
    pub impact: String,
    pub confidence: String,
    pub description: String,
    pub elements: Vec<RawElement>,
}

/// The static-analysis engine.
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// Every check the engine accepts.
    async fn list_checks(&self) -> EngineResult<Vec<CheckDescriptor>>;

    /// Fetch and outline the contract deployed at `address`.
    async fn load(&self, address: &str) -> EngineResult<ContractModel>;

    /// Run the named checks in one batch.
    ///
    /// The result has one slot per entry of `ids`, in the same order; an
    /// empty slot means the check found nothing.
    async fn run_checks(&self, model: &ContractModel, ids: &[String])
        -> EngineResult<Vec<Vec<RawIssue>>>;
}
