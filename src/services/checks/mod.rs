//! Contract Checks
//!
//! Everything between a tool invocation and a tool result: address
//! validation, retrieval-based check selection, batch execution against the
//! engine, and the outline-based point checks.

pub mod address;
pub mod point_checks;
pub mod runner;
pub mod selector;

pub use address::validate_address;
pub use point_checks::{run_mint_check, run_unprotected_func};
pub use runner::CheckRunner;
pub use selector::{CheckSelector, Selection};
