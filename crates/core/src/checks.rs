//! Check Model
//!
//! Descriptor and finding types shared by the catalog, the selector, the
//! runner and the scope. Field names match the JSON the analysis engine and
//! the catalog file use, so these types double as the wire shape handed to
//! the summarization step.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Descriptive metadata for one analysis check.
///
/// `argument` is the identifier the analysis engine accepts when a check is
/// registered; it is unique within a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckDescriptor {
    pub argument: String,
    #[serde(default)]
    pub help: String,
    #[serde(default)]
    pub impact: String,
    #[serde(default)]
    pub confidence: String,
    #[serde(default)]
    pub wiki: String,
    #[serde(default)]
    pub wiki_title: String,
    #[serde(default)]
    pub wiki_description: String,
    #[serde(default)]
    pub wiki_exploit_scenario: String,
    #[serde(default)]
    pub wiki_recommendation: String,
}

impl CheckDescriptor {
    /// Create a descriptor with only the argument set.
    pub fn new(argument: impl Into<String>) -> Self {
        Self {
            argument: argument.into(),
            help: String::new(),
            impact: String::new(),
            confidence: String::new(),
            wiki: String::new(),
            wiki_title: String::new(),
            wiki_description: String::new(),
            wiki_exploit_scenario: String::new(),
            wiki_recommendation: String::new(),
        }
    }

    /// Set the one-line help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Set impact and confidence levels.
    pub fn with_levels(mut self, impact: impl Into<String>, confidence: impl Into<String>) -> Self {
        self.impact = impact.into();
        self.confidence = confidence.into();
        self
    }

    /// Serialize the full descriptor as a retrieval document.
    pub fn to_document(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Extract the `argument` from a retrieval document.
    ///
    /// Only `argument` is required; the rest of the record may be partial.
    pub fn argument_from_document(document: &str) -> CoreResult<String> {
        let record: serde_json::Value = serde_json::from_str(document)?;
        record
            .get("argument")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CoreError::parse("document has no argument field"))
    }
}

/// Reference from an element to its enclosing element (e.g. function → contract).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementParent {
    #[serde(rename = "type")]
    pub element_type: String,
    pub name: String,
}

/// A source element an issue points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub element_type: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ElementParent>,
}

/// One problem reported by a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub check_name: String,
    pub impact: String,
    pub confidence: String,
    pub description: String,
    #[serde(default)]
    pub elements: Vec<Element>,
}

/// The normalized output of running one check.
///
/// An empty `issues` list means the check ran and found nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub check_id: String,
    pub check_info: CheckDescriptor,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

impl Finding {
    /// A finding for a check that reported nothing.
    pub fn clean(check_info: CheckDescriptor) -> Self {
        Self {
            check_id: check_info.argument.clone(),
            check_info,
            issues: Vec::new(),
        }
    }
}
