//! Utility functions and helpers for the fhir2spine gateway.
//!
//! # Submodules
//!
//! - `logging`: Tracing initialization and log-safe payload previews.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod logging;
