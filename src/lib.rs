//! Contract Guard
//!
//! A smart-contract security assistant. A bounded orchestration loop lets a
//! language model pick static-analysis checks for a question, runs them, and
//! summarizes the findings. It includes:
//! - Check catalog, retrieval-based check selection and the Slither engine
//! - The orchestration loop and summary step
//! - A Telegram front end
//! - JSON configuration and utilities

pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use models::settings::AppConfig;
pub use utils::error::{AppError, AppResult};
