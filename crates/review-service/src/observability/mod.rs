//! Observability module for the Review Service.
//!
//! Provides metrics definitions and instrumentation helpers.

pub mod metrics;
