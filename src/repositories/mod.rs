//! Retry decoration for the `store` module's database access.
//!
//! The donor wraps a generic CRUD `Repository<T, ID>` trait with a
//! `RetryWrapper`; this engine's `GazetteerStore`/`InputStore` ports are not
//! generic CRUD, so `retry_wrapper::RetryingStore` instead wraps the
//! individual async closures each adapter method issues, reusing the same
//! read/write/critical retry-policy split.

pub mod retry_wrapper;

pub use retry_wrapper::RetryingStore;
