//! Integration Tests Module
//!
//! End-to-end runs of the orchestration loop and the chat flow, using the
//! bundled check catalog with scripted decision steps and a fixture engine.

mod support;

// Tool loop: round cap, merge rules, selection, misalignment, notifications
mod orchestration_test;

// Assistant answers and the chat gateway
mod assistant_test;
