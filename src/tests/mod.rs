//! Integration testing module
//!
//! End-to-end tests for the decode and segmentation pipeline:
//! - frame conservation across emitted shots
//! - cut placement around the pre-shot window
//! - known-boundary bypass
//! - shot length capping
//! - completion and close semantics

pub mod pipeline;
