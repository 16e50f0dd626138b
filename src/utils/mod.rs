//! Utility modules for the matching engine.

pub mod database_retry;

pub use database_retry::{RetryConfig, with_retry};
