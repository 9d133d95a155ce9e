//! # Review Test Utilities
//!
//! Shared test utilities for the Review Service.
//!
//! This crate provides:
//! - Server test harness (`TestReviewServer` for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use review_test_utils::*;
//!
//! #[sqlx::test(migrations = "../../migrations")]
//! async fn test_example(pool: PgPool) -> Result<()> {
//!     let server = TestReviewServer::spawn(pool).await?;
//!
//!     let response = reqwest::get(format!("{}/health", server.url())).await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod server_harness;

pub use server_harness::*;
