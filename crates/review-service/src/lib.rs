//! Review Service Library
//!
//! Assigns code reviewers to pull requests within teams:
//!
//! - Team provisioning with member rosters
//! - Automatic reviewer assignment (up to two active teammates of the author)
//! - Reviewer reassignment within the replaced reviewer's team
//! - Idempotent merge
//! - Per-team reviewer load statistics
//!
//! # Architecture
//!
//! Handler -> Service -> Repository:
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> services/*.rs -> repositories/*.rs
//! ```
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - HTTP metrics middleware
//! - `models` - Domain types and JSON bodies
//! - `observability` - Prometheus metrics
//! - `repositories` - Storage traits, PostgreSQL and in-memory implementations
//! - `routes` - Axum router setup
//! - `services` - Business rules

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
