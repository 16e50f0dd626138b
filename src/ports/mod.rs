//! External interfaces the matching engine consumes.
//!
//! These traits are the normative shapes from SPEC_FULL.md §6: the core
//! depends on them, not on any particular transport or storage engine.
//! `crate::store` provides a `sea-orm`-backed implementation of
//! `GazetteerStore` and `InputStore`; HTTP-backed `Embedder`/`Rewriter`
//! implementations live alongside their concrete adapters.

use async_trait::async_trait;

use crate::domain::{CorrectionNote, GazetteerEntry, InputRecord, MatchResult};
use crate::errors::{EngineResult, ExternalResult, StoreResult};

/// Read/write access to the authoritative gazetteer. Reads are safe for
/// concurrent workers; the only write path is sentinel insertion (C8),
/// serialised per normalised reference number by a uniqueness constraint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GazetteerStore: Send + Sync {
    async fn lookup_by_key(&self, key: &str) -> StoreResult<Option<GazetteerEntry>>;

    async fn trigram_search(
        &self,
        canonical: &str,
        min_sim: f64,
        limit: usize,
    ) -> StoreResult<Vec<(GazetteerEntry, f64)>>;

    async fn spatial_search(
        &self,
        x: f64,
        y: f64,
        radius_metres: f64,
        limit: usize,
    ) -> StoreResult<Vec<(GazetteerEntry, f64)>>;

    /// Idempotent on `key`: a racing insert returns the existing row rather
    /// than erroring (SentinelConflict is resolved here, never surfaced).
    async fn insert_sentinel(
        &self,
        key: &str,
        canonical: &str,
        source_input_id: &str,
    ) -> StoreResult<GazetteerEntry>;
}

/// Nearest-neighbour search over candidate embeddings, backing the Semantic
/// strategy (S3).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(&self, key: &str, vector: &[f32]) -> StoreResult<()>;

    async fn search(&self, vector: &[f32], limit: usize) -> StoreResult<Vec<(String, f64)>>;
}

/// Embeds canonical address text into the fixed-dimensionality vector space
/// used by `VectorIndex`. Expected dimensionality is fixed per run.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> ExternalResult<Vec<f32>>;

    fn dimensionality(&self) -> usize;
}

/// Calls an external text rewriter on malformed canonical forms (C10).
/// Output is deterministic-ish and must be treated as a candidate, never as
/// truth — callers re-match and re-verify.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Rewriter: Send + Sync {
    async fn rewrite(&self, canonical: &str) -> ExternalResult<String>;
}

/// Batched access to input records and the write paths for match output.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InputStore: Send + Sync {
    async fn batch(&self, run_label: &str, size: usize) -> StoreResult<Vec<InputRecord>>;

    async fn write_result(&self, result: &MatchResult) -> StoreResult<()>;

    /// `attempts` are stamped with `run_label` at write time — `MatchAttempt`
    /// itself carries no run label, since it is produced and scored before
    /// the orchestrator decides which run it is being persisted under.
    async fn write_attempts(&self, run_label: &str, attempts: &[crate::domain::MatchAttempt]) -> StoreResult<()>;

    async fn write_correction(&self, note: &CorrectionNote) -> StoreResult<()>;
}

/// Enqueues a `review`-decided result for human adjudication. Top candidates
/// are passed so the review UI (out of scope here) has enough context
/// without re-querying the engine.
#[async_trait]
pub trait ReviewSink: Send + Sync {
    async fn enqueue(&self, input_id: &str, top_candidates: &[crate::domain::MatchAttempt]) -> EngineResult<()>;
}
