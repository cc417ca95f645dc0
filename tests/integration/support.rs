//! Shared doubles for the integration tests: a scripted decision step, a
//! fixture analysis engine, and recording notifier/summarizer.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use contract_guard::services::catalog::CheckCatalog;
use contract_guard::services::checks::{CheckRunner, CheckSelector};
use contract_guard::services::embedding::TfIdfEmbeddingProvider;
use contract_guard::services::engine::{
    AnalysisEngine, ContractModel, EngineError, EngineResult, RawElement, RawIssue, RawParent,
};
use contract_guard::services::notification::{Notifier, NotifyError};
use contract_guard::services::orchestrator::{
    DecisionStep, OrchestratorService, Summarizer, ToolDispatcher,
};
use contract_guard::AppResult;
use contract_guard_core::{CheckDescriptor, Scope, ToolInvocation, ToolKind};

pub const TOKEN: &str = "0xdac17f958d2ee523a2206206994597c13d831ec7";
pub const OTHER_TOKEN: &str = "0x6b175474e89094c44da98b954eedeac495271d0f";
pub const PLACEHOLDER: &str = "0x1234567890123456789012345678901234567890";

pub const TOKEN_SOURCE: &str = r#"
pragma solidity ^0.8.0;

contract Ownable {
    address public owner;
    constructor() { owner = msg.sender; }
    modifier onlyOwner() { require(msg.sender == owner); _; }
    function transferOwnership(address newOwner) public onlyOwner { owner = newOwner; }
}

contract Token is Ownable, ERC20 {
    function _mint(address account, uint256 amount) internal override { }
    function balanceOf(address account) public view returns (uint256) { return 0; }
    function setFee(uint256 fee) external { }
}
"#;

pub const OTHER_SOURCE: &str = r#"
contract Dai {
    function rely(address guy) external onlyOwner { }
}
"#;

pub fn detectors(address: &str, query: Option<&str>) -> Option<ToolInvocation> {
    Some(ToolInvocation::DetectorsCheck {
        address: Some(address.to_string()),
        query: query.map(String::from),
    })
}

pub fn mint(address: &str) -> Option<ToolInvocation> {
    Some(ToolInvocation::MintCheck {
        address: Some(address.to_string()),
    })
}

pub fn unprotected(address: &str) -> Option<ToolInvocation> {
    Some(ToolInvocation::UnprotectedFunc {
        address: Some(address.to_string()),
    })
}

/// Plays back decisions in order; makes no decision once the script is out.
#[derive(Default)]
pub struct ScriptedDecision {
    script: Mutex<VecDeque<Option<ToolInvocation>>>,
    pub calls: Mutex<Vec<(Vec<ToolKind>, Option<Scope>)>>,
}

impl ScriptedDecision {
    pub fn new(script: Vec<Option<ToolInvocation>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl DecisionStep for ScriptedDecision {
    async fn select(
        &self,
        _query: &str,
        allowed: &[ToolKind],
        context: Option<&Scope>,
    ) -> AppResult<Option<ToolInvocation>> {
        self.calls
            .lock()
            .unwrap()
            .push((allowed.to_vec(), context.cloned()));
        Ok(self.script.lock().unwrap().pop_front().flatten())
    }
}

/// Serves fixed sources by address. Requested checks whose id contains
/// `flag` report one issue each.
pub struct FixtureEngine {
    sources: HashMap<String, String>,
    flag: String,
    misaligned: bool,
    pub loads: AtomicUsize,
    pub runs: Mutex<Vec<Vec<String>>>,
}

impl FixtureEngine {
    pub fn new() -> Self {
        Self {
            sources: HashMap::from([
                (TOKEN.to_string(), TOKEN_SOURCE.to_string()),
                (OTHER_TOKEN.to_string(), OTHER_SOURCE.to_string()),
            ]),
            flag: "reentrancy".to_string(),
            misaligned: false,
            loads: AtomicUsize::new(0),
            runs: Mutex::new(Vec::new()),
        }
    }

    /// Every `run_checks` answer drops its last slot.
    pub fn misaligned() -> Self {
        Self {
            misaligned: true,
            ..Self::new()
        }
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<Vec<String>> {
        self.runs.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisEngine for FixtureEngine {
    async fn list_checks(&self) -> EngineResult<Vec<CheckDescriptor>> {
        Ok(catalog().descriptors().to_vec())
    }

    async fn load(&self, address: &str) -> EngineResult<ContractModel> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.sources
            .get(address)
            .map(|source| ContractModel::from_source(address, source.clone()))
            .ok_or_else(|| EngineError::load(address, "contract source code not verified"))
    }

    async fn run_checks(
        &self,
        _model: &ContractModel,
        ids: &[String],
    ) -> EngineResult<Vec<Vec<RawIssue>>> {
        self.runs.lock().unwrap().push(ids.to_vec());
        let mut slots: Vec<Vec<RawIssue>> = ids
            .iter()
            .map(|id| {
                if id.contains(&self.flag) {
                    vec![RawIssue {
                        check: id.clone(),
                        impact: "High".to_string(),
                        confidence: "Medium".to_string(),
                        description: "Reentrancy in Token.withdraw() sends eth before updating balances".to_string(),
                        elements: vec![RawElement {
                            element_type: "function".to_string(),
                            name: "withdraw".to_string(),
                            parent: Some(RawParent {
                                element_type: "contract".to_string(),
                                name: "Token".to_string(),
                            }),
                        }],
                    }]
                } else {
                    Vec::new()
                }
            })
            .collect();
        if self.misaligned {
            slots.pop();
        }
        Ok(slots)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Answers with a digest of the scope it was handed.
#[derive(Default)]
pub struct DigestSummarizer {
    pub seen: Mutex<Vec<Scope>>,
}

#[async_trait]
impl Summarizer for DigestSummarizer {
    async fn summarize(&self, query: &str, scope: &Scope) -> AppResult<String> {
        self.seen.lock().unwrap().push(scope.clone());
        Ok(format!(
            "{}: {} finding(s), {} issue(s)",
            query,
            scope.detectors_checks().len(),
            scope.issue_count()
        ))
    }
}

pub fn catalog() -> CheckCatalog {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/detectors.json");
    CheckCatalog::load_file(&path).expect("bundled catalog loads")
}

/// The real selector, runner and dispatcher over the bundled catalog.
pub fn orchestrator(
    decision: Arc<ScriptedDecision>,
    engine: Arc<FixtureEngine>,
) -> OrchestratorService {
    let catalog = Arc::new(catalog());
    let selector = CheckSelector::new(catalog.clone(), Arc::new(TfIdfEmbeddingProvider::new()));
    let dispatcher = Arc::new(ToolDispatcher::new(
        Arc::new(selector),
        Arc::new(CheckRunner::new(catalog)),
    ));
    OrchestratorService::new(decision, dispatcher, engine)
}
