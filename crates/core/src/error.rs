//! Core Error Types
//!
//! Errors raised while building or decoding the core data model. Kept
//! dependency-free (thiserror + serde_json) so the core crate stays light;
//! the application crate wraps these in its own `AppError`.

use thiserror::Error;

/// Core error type for the Contract Guard workspace.
#[derive(Error, Debug)]
pub enum CoreError {
    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// A tool name the decision step produced that no tool answers to
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Parse errors
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an unknown tool error
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool(name.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::validation("duplicate argument: reentrancy-eth");
        assert_eq!(
            err.to_string(),
            "Validation error: duplicate argument: reentrancy-eth"
        );
    }

    #[test]
    fn test_unknown_tool_error() {
        let err = CoreError::unknown_tool("drain_wallet");
        assert_eq!(err.to_string(), "Unknown tool: drain_wallet");
    }

    #[test]
    fn test_serde_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let core_err: CoreError = parse_err.into();
        assert!(matches!(core_err, CoreError::Serialization(_)));
    }
}
