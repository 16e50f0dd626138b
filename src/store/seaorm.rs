//! Concrete `sea-orm` adapter. Trigram and spatial search are implemented by
//! scanning the gazetteer table and ranking in Rust with the same similarity
//! functions the Feature Computer uses (`features::similarity`), rather than
//! a backend-specific `pg_trgm`/PostGIS query — this keeps the adapter's
//! ranking semantics identical across SQLite/PostgreSQL/MySQL, the same
//! portability goal the donor's multi-backend migrations pursue. The
//! `idx_gazetteer_entries_canonical_trgm` / `idx_gazetteer_entries_xy`
//! indexes created by the initial migration still narrow what a production
//! deployment would push down to the database; this adapter just doesn't
//! rely on them for correctness.

use std::sync::Arc;

use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::domain::{
    AddressComponents, CorrectionAgent, CorrectionNote, Decision, GazetteerEntry, GazetteerStatus, InputRecord, MatchAttempt,
    MatchMethod, MatchResult,
};
use crate::entities::{correction_note, gazetteer_entry, input_record, match_attempt, match_result, prelude::*};
use crate::errors::{StoreError, StoreResult};
use crate::features::similarity;
use crate::ports::{GazetteerStore, InputStore};
use crate::repositories::retry_wrapper::RetryingStore;
use crate::utils::database_retry::RetryConfig;

/// `sea-orm`-backed store for the gazetteer and input tables, wrapped with a
/// read/write-appropriate retry policy per call site.
#[derive(Clone)]
pub struct SeaOrmStore {
    connection: Arc<DatabaseConnection>,
    retry: RetryingStore,
}

impl SeaOrmStore {
    pub fn new(connection: DatabaseConnection) -> Self {
        Self {
            connection: Arc::new(connection),
            retry: RetryingStore::default(),
        }
    }

    pub fn connection(&self) -> &Arc<DatabaseConnection> {
        &self.connection
    }
}

fn to_store_err(err: sea_orm::DbErr) -> StoreError {
    StoreError::QueryFailed(err.to_string())
}

fn components_to_json(components: &AddressComponents) -> String {
    serde_json::to_string(components).unwrap_or_else(|_| "{}".to_string())
}

fn components_from_json(raw: &str) -> AddressComponents {
    serde_json::from_str(raw).unwrap_or_default()
}

fn status_to_str(status: GazetteerStatus) -> &'static str {
    match status {
        GazetteerStatus::Live => "live",
        GazetteerStatus::Provisional => "provisional",
        GazetteerStatus::Historic => "historic",
    }
}

fn status_from_str(raw: &str) -> GazetteerStatus {
    match raw {
        "live" => GazetteerStatus::Live,
        "provisional" => GazetteerStatus::Provisional,
        _ => GazetteerStatus::Historic,
    }
}

fn decision_to_str(decision: Decision) -> &'static str {
    match decision {
        Decision::AutoAccept => "autoAccept",
        Decision::Review => "review",
        Decision::Reject => "reject",
    }
}

fn agent_to_str(agent: CorrectionAgent) -> &'static str {
    match agent {
        CorrectionAgent::Speller => "speller",
        CorrectionAgent::Rewriter => "rewriter",
        CorrectionAgent::Consensus => "consensus",
    }
}

fn gazetteer_from_model(model: gazetteer_entry::Model) -> GazetteerEntry {
    GazetteerEntry {
        gazetteer_key: model.gazetteer_key,
        canonical: model.canonical,
        components: components_from_json(&model.components),
        x: model.x,
        y: model.y,
        lon: model.lon,
        lat: model.lat,
        status: status_from_str(&model.status),
        blpu_family: model.blpu_family.and_then(|s| s.chars().next()),
        street_ref: model.street_ref,
        is_historic: model.is_historic,
        source_input_id: model.source_input_id,
        embedding: model.embedding.and_then(|raw| serde_json::from_str(&raw).ok()),
    }
}

fn gazetteer_to_active_model(entry: &GazetteerEntry) -> gazetteer_entry::ActiveModel {
    gazetteer_entry::ActiveModel {
        gazetteer_key: Set(entry.gazetteer_key.clone()),
        canonical: Set(entry.canonical.clone()),
        components: Set(components_to_json(&entry.components)),
        x: Set(entry.x),
        y: Set(entry.y),
        lon: Set(entry.lon),
        lat: Set(entry.lat),
        status: Set(status_to_str(entry.status).to_string()),
        blpu_family: Set(entry.blpu_family.map(|c| c.to_string())),
        street_ref: Set(entry.street_ref.clone()),
        is_historic: Set(entry.is_historic),
        source_input_id: Set(entry.source_input_id.clone()),
        embedding: Set(entry.embedding.as_ref().and_then(|v| serde_json::to_string(v).ok())),
    }
}

fn input_from_model(model: input_record::Model) -> InputRecord {
    InputRecord {
        input_id: model.input_id,
        raw_text: model.raw_text,
        family: model.family,
        external_ref: model.external_ref,
        raw_reference_number: model.raw_reference_number,
        raw_x: model.raw_x,
        raw_y: model.raw_y,
        doc_date: model.doc_date,
        canonical: model.canonical,
        postcode: model.postcode,
        tokens: serde_json::from_str(&model.tokens).unwrap_or_default(),
        components: components_from_json(&model.components),
        low_quality_canonical: model.low_quality_canonical,
        descriptors: serde_json::from_str(&model.descriptors).unwrap_or_default(),
        correction_trail: serde_json::from_str(&model.correction_trail).unwrap_or_default(),
    }
}

#[async_trait::async_trait]
impl GazetteerStore for SeaOrmStore {
    async fn lookup_by_key(&self, key: &str) -> StoreResult<Option<GazetteerEntry>> {
        let connection = self.connection.clone();
        let key = key.to_string();
        self.retry
            .for_reads(|| {
                let connection = connection.clone();
                let key = key.clone();
                async move {
                    GazetteerEntries::find_by_id(key)
                        .one(&*connection)
                        .await
                        .map(|maybe_model| maybe_model.map(gazetteer_from_model))
                        .map_err(to_store_err)
                }
            })
            .await
    }

    async fn trigram_search(&self, canonical: &str, min_sim: f64, limit: usize) -> StoreResult<Vec<(GazetteerEntry, f64)>> {
        let connection = self.connection.clone();
        let canonical = canonical.to_string();
        self.retry
            .for_reads(|| {
                let connection = connection.clone();
                let canonical = canonical.clone();
                async move {
                    let models = GazetteerEntries::find().all(&*connection).await.map_err(to_store_err)?;
                    let mut scored: Vec<(GazetteerEntry, f64)> = models
                        .into_iter()
                        .map(gazetteer_from_model)
                        .map(|entry| {
                            let sim = similarity::trigram_similarity(&canonical, &entry.canonical);
                            (entry, sim)
                        })
                        .filter(|(_, sim)| *sim >= min_sim)
                        .collect();
                    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
                    scored.truncate(limit);
                    Ok(scored)
                }
            })
            .await
    }

    async fn spatial_search(&self, x: f64, y: f64, radius_metres: f64, limit: usize) -> StoreResult<Vec<(GazetteerEntry, f64)>> {
        let connection = self.connection.clone();
        self.retry
            .for_reads(|| {
                let connection = connection.clone();
                async move {
                    let models = GazetteerEntries::find().all(&*connection).await.map_err(to_store_err)?;
                    let mut scored: Vec<(GazetteerEntry, f64)> = models
                        .into_iter()
                        .map(gazetteer_from_model)
                        .filter_map(|entry| {
                            let (ex, ey) = (entry.x?, entry.y?);
                            let distance = ((ex - x).powi(2) + (ey - y).powi(2)).sqrt();
                            Some((entry, distance))
                        })
                        .filter(|(_, distance)| *distance <= radius_metres)
                        .collect();
                    scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
                    scored.truncate(limit);
                    Ok(scored)
                }
            })
            .await
    }

    async fn insert_sentinel(&self, key: &str, canonical: &str, source_input_id: &str) -> StoreResult<GazetteerEntry> {
        let connection = self.connection.clone();
        let key = key.to_string();
        let canonical = canonical.to_string();
        let source_input_id = source_input_id.to_string();
        self.retry
            .for_writes(|| {
                let connection = connection.clone();
                let key = key.clone();
                let canonical = canonical.clone();
                let source_input_id = source_input_id.clone();
                async move {
                    if let Some(existing) = GazetteerEntries::find_by_id(key.clone())
                        .one(&*connection)
                        .await
                        .map_err(to_store_err)?
                    {
                        return Ok(gazetteer_from_model(existing));
                    }

                    let sentinel = GazetteerEntry::sentinel(key.clone(), canonical, source_input_id);
                    let active_model = gazetteer_to_active_model(&sentinel);
                    match active_model.insert(&*connection).await {
                        Ok(model) => Ok(gazetteer_from_model(model)),
                        Err(_) => {
                            // Lost the race: another worker inserted the same
                            // key first. Idempotent per SPEC_FULL.md §4.2 —
                            // return the row that won, not an error.
                            GazetteerEntries::find_by_id(key.clone())
                                .one(&*connection)
                                .await
                                .map_err(to_store_err)?
                                .map(gazetteer_from_model)
                                .ok_or_else(|| StoreError::SentinelConflict(key))
                        }
                    }
                }
            })
            .await
    }
}

#[async_trait::async_trait]
impl InputStore for SeaOrmStore {
    /// Pulls the next `size` inputs not yet matched under `run_label`, by
    /// anti-joining against `match_result` — a result row for `(input_id,
    /// run_label)` means that input already has a decision for this run and
    /// is excluded. This is what lets repeated calls advance through the
    /// dataset rather than returning the same rows forever.
    async fn batch(&self, run_label: &str, size: usize) -> StoreResult<Vec<InputRecord>> {
        let connection = self.connection.clone();
        let run_label = run_label.to_string();
        self.retry
            .for_reads(|| {
                let connection = connection.clone();
                let run_label = run_label.clone();
                async move {
                    use sea_orm::QuerySelect;
                    let processed: Vec<String> = MatchResults::find()
                        .filter(match_result::Column::RunLabel.eq(run_label.clone()))
                        .all(&*connection)
                        .await
                        .map_err(to_store_err)?
                        .into_iter()
                        .map(|model| model.input_id)
                        .collect();

                    let mut query = InputRecords::find();
                    if !processed.is_empty() {
                        query = query.filter(input_record::Column::InputId.is_not_in(processed));
                    }
                    query
                        .limit(size as u64)
                        .all(&*connection)
                        .await
                        .map(|models| models.into_iter().map(input_from_model).collect())
                        .map_err(to_store_err)
                }
            })
            .await
    }

    async fn write_result(&self, result: &MatchResult) -> StoreResult<()> {
        let connection = self.connection.clone();
        let result = result.clone();
        self.retry
            .for_writes(|| {
                let connection = connection.clone();
                let result = result.clone();
                async move {
                    let existing = MatchResults::find()
                        .filter(match_result::Column::InputId.eq(result.input_id.clone()))
                        .filter(match_result::Column::RunLabel.eq(result.run_label.clone()))
                        .one(&*connection)
                        .await
                        .map_err(to_store_err)?;

                    let active_model = match_result::ActiveModel {
                        input_id: Set(result.input_id.clone()),
                        run_label: Set(result.run_label.clone()),
                        decision: Set(decision_to_str(result.decision).to_string()),
                        gazetteer_key: Set(result.gazetteer_key.clone()),
                        method: Set(result.method.map(|m| m.to_string())),
                        score: Set(result.score),
                        reason: Set(result.reason.clone()),
                        ts: Set(result.ts),
                    };

                    if existing.is_some() {
                        active_model.update(&*connection).await.map_err(to_store_err)?;
                    } else {
                        active_model.insert(&*connection).await.map_err(to_store_err)?;
                    }
                    Ok(())
                }
            })
            .await
    }

    async fn write_attempts(&self, run_label: &str, attempts: &[MatchAttempt]) -> StoreResult<()> {
        let connection = self.connection.clone();
        let attempts = attempts.to_vec();
        let run_label = run_label.to_string();
        self.retry
            .for_writes(|| {
                let connection = connection.clone();
                let attempts = attempts.clone();
                let run_label = run_label.clone();
                async move {
                    for attempt in &attempts {
                        let active_model = match_attempt::ActiveModel {
                            attempt_id: sea_orm::NotSet,
                            run_label: Set(run_label.clone()),
                            input_id: Set(attempt.input_id.clone()),
                            gazetteer_key: Set(attempt.gazetteer_key.clone()),
                            method: Set(attempt.method.to_string()),
                            score: Set(attempt.score),
                            tie_rank: Set(attempt.tie_rank as i32),
                            features: Set(serde_json::to_string(&attempt.features).unwrap_or_default()),
                        };
                        active_model.insert(&*connection).await.map_err(to_store_err)?;
                    }
                    Ok(())
                }
            })
            .await
    }

    async fn write_correction(&self, note: &CorrectionNote) -> StoreResult<()> {
        let connection = self.connection.clone();
        let note = note.clone();
        self.retry
            .for_writes(|| {
                let connection = connection.clone();
                let note = note.clone();
                async move {
                    let active_model = correction_note::ActiveModel {
                        note_id: sea_orm::NotSet,
                        input_id: Set(note.input_id.clone()),
                        agent: Set(agent_to_str(note.agent).to_string()),
                        before_canonical: Set(note.before_canonical.clone()),
                        after_canonical: Set(note.after_canonical.clone()),
                        confidence: Set(note.confidence),
                        validation: Set(note.validation.to_string()),
                        ts: Set(note.ts),
                    };
                    active_model.insert(&*connection).await.map_err(to_store_err)?;
                    Ok(())
                }
            })
            .await
    }
}

#[allow(dead_code)]
fn _method_from_str(raw: &str) -> Option<MatchMethod> {
    use std::str::FromStr;
    MatchMethod::from_str(raw).ok()
}
