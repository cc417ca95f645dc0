//! Contract Guard Core
//!
//! Foundational types for the Contract Guard workspace. This crate has no
//! dependencies on the analysis engine, language-model providers or the chat
//! transport.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `checks` - Check descriptors and normalized findings
//! - `tool` - Tool kinds, invocations and results
//! - `scope` - Per-run result accumulation and merge rules

pub mod checks;
pub mod error;
pub mod scope;
pub mod tool;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Check Model ────────────────────────────────────────────────────────
pub use checks::{CheckDescriptor, Element, ElementParent, Finding, Issue};

// ── Tools ──────────────────────────────────────────────────────────────
pub use tool::{ToolInvocation, ToolKind, ToolResult};

// ── Scope ──────────────────────────────────────────────────────────────
pub use scope::{MergeEvent, Scope};
