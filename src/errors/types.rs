//! Error hierarchy for the matching engine.
//!
//! Mirrors the stable error kinds required by the matching engine's external
//! contract: invalid input, transient vs fatal external failures, sentinel
//! insertion races, and verifier disagreement.

use thiserror::Error;

/// Top-level error type for the matching engine.
#[derive(Error, Debug)]
pub enum MatchError {
    /// Raw text missing or normalises to an empty canonical form.
    #[error("invalid input for {input_id}: {reason}")]
    InputInvalid { input_id: String, reason: String },

    /// A transient external failure (DB timeout, vector service timeout,
    /// embedder/rewriter 5xx) that was retried to exhaustion. The caller
    /// drops the affected strategy rather than failing the whole input.
    #[error("external call to {service} timed out after retries: {message}")]
    ExternalTransient { service: String, message: String },

    /// An unrecoverable external failure (auth, schema mismatch). Propagated
    /// up; the orchestrator aborts the run.
    #[error("external service {service} failed fatally: {message}")]
    ExternalFatal { service: String, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    ExternalService(#[from] ExternalServiceError),

    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),
}

impl MatchError {
    pub fn input_invalid(input_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InputInvalid {
            input_id: input_id.into(),
            reason: reason.into(),
        }
    }

    pub fn external_transient(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalTransient {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn external_fatal(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalFatal {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Whether this error should cause the orchestrator to abort the entire
    /// run, as opposed to downgrading a single input to the next tier.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ExternalFatal { .. })
    }
}

/// Errors surfaced by the `GazetteerStore` / `InputStore` / `VectorIndex` adapters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("failed to connect to store: {0}")]
    ConnectionFailed(String),

    #[error("query failed: {0}")]
    QueryFailed(String),

    #[error("no row found for key '{0}'")]
    NotFound(String),

    /// Racing `insertSentinel` calls resolved by a uniqueness constraint.
    /// Not an error in practice (callers get back the existing row) but
    /// modelled as a variant so the retry layer can recognise and swallow it.
    #[error("sentinel conflict for key '{0}', existing row returned")]
    SentinelConflict(String),
}

/// Errors from the `Embedder` / `Rewriter` HTTP collaborators.
#[derive(Error, Debug)]
pub enum ExternalServiceError {
    #[error("{service} timed out")]
    Timeout { service: String },

    #[error("{service} unavailable: {message}")]
    Unavailable { service: String, message: String },

    #[error("{service} returned an invalid response: {message}")]
    InvalidResponse { service: String, message: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl ExternalServiceError {
    pub fn timeout(service: impl Into<String>) -> Self {
        Self::Timeout {
            service: service.into(),
        }
    }

    pub fn unavailable(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            service: service.into(),
            message: message.into(),
        }
    }
}

/// Configuration load/validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(#[from] figment::Error),

    #[error("invalid configuration value for '{field}': {message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A verifier's judgement when comparing two canonical addresses, used by
/// the Group Consensus Corrector (C9) and Rewriter Gate (C10). Disagreement
/// is a normal "do not accept" signal, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifierSignal {
    Same,
    Different,
    Unknown,
}

impl VerifierSignal {
    pub fn is_same(self) -> bool {
        matches!(self, Self::Same)
    }
}
