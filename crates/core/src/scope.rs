//! Scope
//!
//! The running context of one orchestration run. Every tool result is folded
//! in through [`Scope::merge`], whose rules depend only on the current scope
//! and the incoming result:
//!
//! - detector findings are appended, never replaced or deduplicated
//! - the contract source is stored once; the first writer wins
//! - point-check messages overwrite the previous value; the last writer wins
//! - a skip changes nothing
//!
//! A `Scope` belongs to exactly one run and is never shared between runs.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::checks::Finding;
use crate::error::CoreResult;
use crate::tool::{ToolKind, ToolResult};

/// Accumulated tool output for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    detectors_checks: Vec<Finding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mint_check: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unprotected_func: Option<String>,
    /// Result kinds merged so far in this run.
    #[serde(skip)]
    observed: BTreeSet<ToolKind>,
}

/// Emitted by every merge that changed (or could have changed) the scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeEvent {
    pub kind: ToolKind,
    /// True the first time this kind is merged in the run.
    pub first_occurrence: bool,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one tool result into the scope.
    ///
    /// Returns `None` for a skip, otherwise the kind that was merged and
    /// whether it is the first of its kind in this run.
    pub fn merge(&mut self, result: ToolResult) -> Option<MergeEvent> {
        let kind = result.kind();
        match result {
            ToolResult::Skip => return None,
            ToolResult::DetectorsCheck {
                checks,
                source_code,
            } => {
                self.detectors_checks.extend(checks);
                if self.source_code.is_none() {
                    self.source_code = source_code;
                }
            }
            ToolResult::MintCheck { message } => self.mint_check = Some(message),
            ToolResult::UnprotectedFunc { message } => self.unprotected_func = Some(message),
        }
        let first_occurrence = self.observed.insert(kind);
        Some(MergeEvent {
            kind,
            first_occurrence,
        })
    }

    pub fn detectors_checks(&self) -> &[Finding] {
        &self.detectors_checks
    }

    pub fn source_code(&self) -> Option<&str> {
        self.source_code.as_deref()
    }

    pub fn mint_check(&self) -> Option<&str> {
        self.mint_check.as_deref()
    }

    pub fn unprotected_func(&self) -> Option<&str> {
        self.unprotected_func.as_deref()
    }

    /// Whether this kind has been merged in this run.
    pub fn has_observed(&self, kind: ToolKind) -> bool {
        self.observed.contains(&kind)
    }

    /// True when nothing has been merged.
    pub fn is_empty(&self) -> bool {
        self.detectors_checks.is_empty()
            && self.source_code.is_none()
            && self.mint_check.is_none()
            && self.unprotected_func.is_none()
    }

    /// Total number of issues across all detector findings.
    pub fn issue_count(&self) -> usize {
        self.detectors_checks.iter().map(|f| f.issues.len()).sum()
    }

    /// Serialize the scope as the JSON context handed to language-model steps.
    pub fn to_context_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
