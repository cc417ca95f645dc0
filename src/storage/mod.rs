//! Storage Layer
//!
//! Handles the JSON config file. Nothing else is persisted.

pub mod config;

pub use config::*;
