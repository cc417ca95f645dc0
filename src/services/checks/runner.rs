//! Check Runner
//!
//! Runs a validated list of catalog checks against one contract in a single
//! engine call and normalizes the raw issues into findings.

use std::sync::Arc;

use contract_guard_core::{CheckDescriptor, Element, ElementParent, Finding, Issue, ToolResult};

use crate::services::catalog::CheckCatalog;
use crate::services::engine::{ModelCache, RawElement, RawIssue};
use crate::utils::error::{AppError, AppResult};

pub struct CheckRunner {
    catalog: Arc<CheckCatalog>,
}

impl CheckRunner {
    pub fn new(catalog: Arc<CheckCatalog>) -> Self {
        Self { catalog }
    }

    /// Run `ids` against the contract at `address`.
    ///
    /// Load failures and engine failures degrade to an empty result; the only
    /// error is an engine answer whose slot count differs from `ids`.
    pub async fn run(
        &self,
        cache: &mut ModelCache,
        address: &str,
        ids: &[String],
    ) -> AppResult<ToolResult> {
        let Some(model) = cache.get(address).await else {
            return Ok(ToolResult::empty_detectors());
        };
        let source_code = Some(model.source_code.clone());

        if ids.is_empty() {
            tracing::debug!(address, "no checks selected, skipping engine");
            return Ok(ToolResult::DetectorsCheck {
                checks: Vec::new(),
                source_code,
            });
        }

        let slots = match cache.engine().run_checks(&model, ids).await {
            Ok(slots) => slots,
            Err(e) => {
                tracing::warn!(address, error = %e, "check execution failed");
                return Ok(ToolResult::DetectorsCheck {
                    checks: Vec::new(),
                    source_code,
                });
            }
        };

        if slots.len() != ids.len() {
            return Err(AppError::EngineMisaligned {
                expected: ids.len(),
                actual: slots.len(),
            });
        }

        let checks: Vec<Finding> = ids
            .iter()
            .zip(slots)
            .map(|(id, raw)| self.finding(id, raw))
            .collect();
        tracing::debug!(
            address,
            checks = checks.len(),
            issues = checks.iter().map(|f| f.issues.len()).sum::<usize>(),
            "checks completed"
        );

        Ok(ToolResult::DetectorsCheck {
            checks,
            source_code,
        })
    }

    fn finding(&self, id: &str, raw: Vec<RawIssue>) -> Finding {
        let check_info = self
            .catalog
            .get(id)
            .cloned()
            .unwrap_or_else(|| CheckDescriptor::new(id));
        Finding {
            check_id: id.to_string(),
            check_info,
            issues: raw.into_iter().map(normalize_issue).collect(),
        }
    }
}

fn normalize_issue(raw: RawIssue) -> Issue {
    Issue {
        check_name: raw.check,
        impact: raw.impact,
        confidence: raw.confidence,
        description: raw.description,
        elements: raw.elements.into_iter().map(normalize_element).collect(),
    }
}

fn normalize_element(raw: RawElement) -> Element {
    Element {
        element_type: raw.element_type,
        name: raw.name,
        parent: raw.parent.map(|p| ElementParent {
            element_type: p.element_type,
            name: p.name,
        }),
    }
}
