//! Centralized error handling for the matching engine.
//!
//! # Error Categories
//!
//! - **Input errors**: malformed or empty raw address text.
//! - **Store errors**: gazetteer/input persistence failures.
//! - **External service errors**: embedder/rewriter HTTP failures.
//! - **Config errors**: configuration load/validation failures.
//!
//! # Usage
//!
//! ```
//! use llpg_matcher::errors::{EngineResult};
//!
//! fn example() -> EngineResult<String> {
//!     Ok("success".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using MatchError.
pub type EngineResult<T> = Result<T, MatchError>;

/// Convenience type alias for Store Results.
pub type StoreResult<T> = Result<T, StoreError>;

/// Convenience type alias for external-service Results.
pub type ExternalResult<T> = Result<T, ExternalServiceError>;

/// Convenience type alias for Config Results.
pub type ConfigResult<T> = Result<T, ConfigError>;
