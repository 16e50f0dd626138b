//! Retry decorator for database operations, handling locking and other
//! transient failures the same way the donor's `RetryWrapper` does, adapted
//! from wrapping a generic CRUD `Repository<T, ID>` trait to wrapping the
//! per-call-site closures the `GazetteerStore`/`InputStore` adapters issue.
//!
//! # Example usage
//!
//! ```ignore
//! let retry = RetryingStore::default();
//! let entry = retry.for_reads(|| async { store.lookup_by_key("ABC123").await }).await?;
//! ```

use crate::errors::StoreResult;
use crate::utils::database_retry::{RetryConfig, with_retry};

/// Holds the three retry policies (read/write/critical) the donor's
/// `RetryWrapper::for_reads` / `for_writes` / `for_critical` constructors
/// expose, but as a reusable dispatcher rather than a one-shot wrapper
/// around a single repository instance.
#[derive(Clone)]
pub struct RetryingStore {
    reads: RetryConfig,
    writes: RetryConfig,
    critical: RetryConfig,
}

impl Default for RetryingStore {
    fn default() -> Self {
        Self {
            reads: RetryConfig::for_reads(),
            writes: RetryConfig::for_writes(),
            critical: RetryConfig::for_critical(),
        }
    }
}

impl RetryingStore {
    pub async fn for_reads<T, F, Fut>(&self, operation: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = StoreResult<T>>,
    {
        with_retry(&self.reads, operation, "store-read").await
    }

    pub async fn for_writes<T, F, Fut>(&self, operation: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = StoreResult<T>>,
    {
        with_retry(&self.writes, operation, "store-write").await
    }

    pub async fn for_critical<T, F, Fut>(&self, operation: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = StoreResult<T>>,
    {
        with_retry(&self.critical, operation, "store-critical").await
    }
}
