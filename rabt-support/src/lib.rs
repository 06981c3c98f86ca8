//! # Rabt Support
//!
//! Shared utilities for the Rabt DI crates.
//!
//! This crate provides:
//! - Text rendering for error messages and debug reports
//! - Logging bootstrap on top of `tracing-subscriber`

pub mod logging;
pub mod rendering;
