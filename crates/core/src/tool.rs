//! Tool Invocations and Results
//!
//! The decision step picks one of a small, closed set of tools per round.
//! Each tool is a variant here rather than an entry in a string-keyed
//! registry, so dispatch and merge are exhaustive `match`es.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::checks::Finding;
use crate::error::{CoreError, CoreResult};

/// The kind of a tool, independent of its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Retrieve relevant checks for the query and run them.
    DetectorsCheck,
    /// Look for contracts overriding `_mint`.
    MintCheck,
    /// Look for public functions without an owner guard.
    UnprotectedFunc,
    /// No security analysis is needed.
    #[serde(rename = "skip_security_checks")]
    Skip,
}

impl ToolKind {
    /// Tools allowed in the first round.
    pub const TRIAGE: [ToolKind; 2] = [ToolKind::DetectorsCheck, ToolKind::Skip];

    /// Tools allowed once the first round has run.
    pub const ALL: [ToolKind; 4] = [
        ToolKind::DetectorsCheck,
        ToolKind::MintCheck,
        ToolKind::UnprotectedFunc,
        ToolKind::Skip,
    ];

    /// Name the tool is advertised under.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::DetectorsCheck => "detectors_check",
            ToolKind::MintCheck => "mint_check",
            ToolKind::UnprotectedFunc => "unprotected_func",
            ToolKind::Skip => "skip_security_checks",
        }
    }

    /// Resolve an advertised tool name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A tool call chosen by the decision step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolInvocation {
    DetectorsCheck {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        address: Option<String>,
        /// Retrieval query; the user's question when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        query: Option<String>,
    },
    MintCheck {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        address: Option<String>,
    },
    UnprotectedFunc {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        address: Option<String>,
    },
    #[serde(rename = "skip_security_checks")]
    Skip,
}

impl ToolInvocation {
    /// Build an invocation from a tool name and its JSON arguments.
    ///
    /// Arguments are read leniently: a missing or non-string `address` becomes
    /// `None` so the address validation downstream decides what to do with it.
    pub fn from_call(name: &str, args: &Value) -> CoreResult<Self> {
        let kind = ToolKind::from_name(name).ok_or_else(|| CoreError::unknown_tool(name))?;
        let address = string_arg(args, "address");
        Ok(match kind {
            ToolKind::DetectorsCheck => ToolInvocation::DetectorsCheck {
                address,
                query: string_arg(args, "query"),
            },
            ToolKind::MintCheck => ToolInvocation::MintCheck { address },
            ToolKind::UnprotectedFunc => ToolInvocation::UnprotectedFunc { address },
            ToolKind::Skip => ToolInvocation::Skip,
        })
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ToolInvocation::DetectorsCheck { .. } => ToolKind::DetectorsCheck,
            ToolInvocation::MintCheck { .. } => ToolKind::MintCheck,
            ToolInvocation::UnprotectedFunc { .. } => ToolKind::UnprotectedFunc,
            ToolInvocation::Skip => ToolKind::Skip,
        }
    }
}

fn string_arg(args: &Value, key: &str) -> Option<String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Normalized output of one executed tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolResult {
    DetectorsCheck {
        checks: Vec<Finding>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source_code: Option<String>,
    },
    MintCheck {
        message: String,
    },
    UnprotectedFunc {
        message: String,
    },
    #[serde(rename = "skip_security_checks")]
    Skip,
}

impl ToolResult {
    /// The "nothing selected, no source available" result.
    pub fn empty_detectors() -> Self {
        ToolResult::DetectorsCheck {
            checks: Vec::new(),
            source_code: None,
        }
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ToolResult::DetectorsCheck { .. } => ToolKind::DetectorsCheck,
            ToolResult::MintCheck { .. } => ToolKind::MintCheck,
            ToolResult::UnprotectedFunc { .. } => ToolKind::UnprotectedFunc,
            ToolResult::Skip => ToolKind::Skip,
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, ToolResult::Skip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_names_roundtrip() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::from_name("get_slither_object"), None);
    }

    #[test]
    fn test_triage_is_subset_of_all() {
        for kind in ToolKind::TRIAGE {
            assert!(ToolKind::ALL.contains(&kind));
        }
        assert!(!ToolKind::TRIAGE.contains(&ToolKind::MintCheck));
    }

    #[test]
    fn test_from_call_detectors_check() {
        let inv = ToolInvocation::from_call(
            "detectors_check",
            &json!({"address": " 0xdac17f958d2ee523a2206206994597c13d831ec7 ", "query": "is mint safe?"}),
        )
        .unwrap();
        assert_eq!(
            inv,
            ToolInvocation::DetectorsCheck {
                address: Some("0xdac17f958d2ee523a2206206994597c13d831ec7".to_string()),
                query: Some("is mint safe?".to_string()),
            }
        );
        assert_eq!(inv.kind(), ToolKind::DetectorsCheck);
    }

    #[test]
    fn test_from_call_lenient_arguments() {
        let inv = ToolInvocation::from_call("mint_check", &json!({"address": 42})).unwrap();
        assert_eq!(inv, ToolInvocation::MintCheck { address: None });

        let inv = ToolInvocation::from_call("unprotected_func", &serde_json::Value::Null).unwrap();
        assert_eq!(inv, ToolInvocation::UnprotectedFunc { address: None });

        let inv = ToolInvocation::from_call("skip_security_checks", &json!({})).unwrap();
        assert_eq!(inv, ToolInvocation::Skip);
    }

    #[test]
    fn test_from_call_unknown_tool() {
        let err = ToolInvocation::from_call("selfdestruct", &json!({})).unwrap_err();
        assert!(matches!(err, CoreError::UnknownTool(_)));
    }

    #[test]
    fn test_result_serialization_is_tagged() {
        let json = serde_json::to_value(ToolResult::MintCheck {
            message: "ok".to_string(),
        })
        .unwrap();
        assert_eq!(json, json!({"kind": "mint_check", "message": "ok"}));

        let json = serde_json::to_value(ToolResult::Skip).unwrap();
        assert_eq!(json, json!({"kind": "skip_security_checks"}));
    }

    #[test]
    fn test_empty_detectors() {
        let result = ToolResult::empty_detectors();
        assert_eq!(result.kind(), ToolKind::DetectorsCheck);
        assert!(!result.is_skip());
        assert_eq!(serde_json::to_value(&result).unwrap(), json!({"kind": "detectors_check", "checks": []}));
    }
}
