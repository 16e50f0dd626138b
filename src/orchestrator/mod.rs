//! C11: Orchestrator. Drives batches of inputs through tier sequencing
//! (C8 short-circuit, then C4-C7, then C9 group consensus, then C10
//! rewriter gate), using a bounded worker pool and atomic per-batch commit
//! with retry (SPEC_FULL.md §4.8, §5).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::candidates;
use crate::canonical;
use crate::config::Config;
use crate::consensus::{self, GroupMember};
use crate::decision;
use crate::domain::{CorrectionNote, InputRecord, MatchAttempt, MatchResult};
use crate::errors::{EngineResult, MatchError};
use crate::features;
use crate::historic_reference::{self, Resolution};
use crate::observability::{AppObservability, RunSummary};
use crate::ports::{Embedder, GazetteerStore, InputStore, ReviewSink, Rewriter, VectorIndex};
use crate::repositories::RetryingStore;
use crate::rewriter_gate;
use crate::scoring;

/// The per-input outcome of C8/C4-C7, ready for persistence and for C9/C10
/// to revise.
struct InputOutcome {
    input: InputRecord,
    attempts: Vec<MatchAttempt>,
    result: MatchResult,
    correction: Option<CorrectionNote>,
}

/// Wires together the store and external-service ports with the pure
/// matching core. One `Orchestrator` drives exactly one run (one
/// `run_label`); re-tuned weights or thresholds mean a new `Config` and a
/// new `Orchestrator`, never a live mutation (SPEC_FULL.md §9 "Global
/// mutable state").
pub struct Orchestrator {
    gazetteer: Arc<dyn GazetteerStore>,
    inputs: Arc<dyn InputStore>,
    vector_index: Option<Arc<dyn VectorIndex>>,
    embedder: Option<Arc<dyn Embedder>>,
    rewriter: Option<Arc<dyn Rewriter>>,
    review_sink: Option<Arc<dyn ReviewSink>>,
    retry: RetryingStore,
    config: Config,
    observability: Arc<AppObservability>,
}

impl Orchestrator {
    pub fn new(
        gazetteer: Arc<dyn GazetteerStore>,
        inputs: Arc<dyn InputStore>,
        vector_index: Option<Arc<dyn VectorIndex>>,
        embedder: Option<Arc<dyn Embedder>>,
        rewriter: Option<Arc<dyn Rewriter>>,
        review_sink: Option<Arc<dyn ReviewSink>>,
        config: Config,
        observability: Arc<AppObservability>,
    ) -> Self {
        Self {
            gazetteer,
            inputs,
            vector_index,
            embedder,
            rewriter,
            review_sink,
            retry: RetryingStore::default(),
            config,
            observability,
        }
    }

    /// Drive `run_label` to completion: repeatedly pull a batch, process it
    /// at `pool.resolved_workers()` concurrency, commit it atomically, and
    /// stop when a batch comes back empty or `cancellation` fires. Returns
    /// the accumulated run summary either way — a cancelled run is not an
    /// error, it is a partial result.
    pub async fn run(&self, run_label: &str, cancellation: CancellationToken) -> EngineResult<RunSummary> {
        let start = Instant::now();
        let mut summary = RunSummary { run_label: run_label.to_string(), ..Default::default() };

        loop {
            if cancellation.is_cancelled() {
                info!(run_label, "run cancelled between batches");
                break;
            }

            let batch_start = Instant::now();
            let batch = self.inputs.batch(run_label, self.config.pool.batch_size).await?;
            if batch.is_empty() {
                break;
            }

            let outcomes = self.process_batch(&batch, run_label, &cancellation).await;
            self.observability.record_tier_duration("batch", batch_start.elapsed().as_secs_f64());

            match self.commit_batch(run_label, outcomes).await {
                Ok(committed) => {
                    let finalized = self.apply_rewriter_gate(run_label, committed).await;
                    self.finalize_outcomes(&finalized).await;
                    self.fold_summary(&mut summary, &finalized);
                }
                Err(error) => {
                    warn!(run_label, error = %error, "batch commit exhausted retries, skipping batch");
                    summary.batches_failed += 1;
                    self.observability.batches_failed.add(1, &[]);
                }
            }
        }

        summary.elapsed_seconds = start.elapsed().as_secs_f64();
        summary.log();
        Ok(summary)
    }

    /// Process every input in `batch` at bounded concurrency
    /// (`pool.resolved_workers()`), checking `cancellation` before each
    /// input starts so a cancellation mid-batch stops launching new work
    /// without aborting work already in flight.
    async fn process_batch(
        &self,
        batch: &[InputRecord],
        run_label: &str,
        cancellation: &CancellationToken,
    ) -> Vec<InputOutcome> {
        let workers = self.config.pool.resolved_workers();
        stream::iter(batch.iter().cloned())
            .map(|input| {
                let cancellation = cancellation.clone();
                async move {
                    if cancellation.is_cancelled() {
                        return None;
                    }
                    match self.process_one(input, run_label).await {
                        Ok(outcome) => Some(outcome),
                        Err(error) => {
                            warn!(run_label, error = %error, "input dropped after pipeline error");
                            None
                        }
                    }
                }
            })
            .buffer_unordered(workers.max(1))
            .filter_map(|outcome| async move { outcome })
            .collect::<Vec<_>>()
            .await
    }

    /// C8, then C4-C7, for one input. C9 (group consensus) and C10 (rewriter
    /// gate) run later over the whole batch, after this outcome is committed
    /// — both are residual tiers that only see inputs still unresolved once
    /// their predecessor has run, per SPEC_FULL.md §4.8 Responsibility 1
    /// ("C8 → (C4+C5+C6+C7) → residual into C9 → residual into C10"). Never
    /// returns an error for a tier that can legitimately produce "no match"
    /// — only for genuinely fatal conditions (`MatchError::ExternalFatal`,
    /// unresolved store errors) is an `Err` propagated, per SPEC_FULL.md §7.
    async fn process_one(&self, mut input: InputRecord, run_label: &str) -> EngineResult<InputOutcome> {
        let tier_start = Instant::now();
        self.canonicalize_if_needed(&mut input);

        let (attempts, result) = match historic_reference::resolve(&input, self.gazetteer.as_ref()).await? {
            Resolution::Resolved(attempt) => {
                if attempt.method == crate::domain::MatchMethod::ReferenceHistoric {
                    self.observability.sentinels_created.add(1, &[]);
                }
                decision::decide(&input.input_id, run_label, vec![attempt], &self.config.thresholds)
            }
            Resolution::NotApplicable => self.run_candidate_tiers(&input, run_label).await?,
        };
        self.observability.record_tier_duration("c4_c8", tier_start.elapsed().as_secs_f64());

        Ok(InputOutcome { input, attempts, result, correction: None })
    }

    fn canonicalize_if_needed(&self, input: &mut InputRecord) {
        if input.canonical.is_some() {
            return;
        }
        let out = canonical::canonicalize(&input.raw_text, &self.config.rules);
        input.canonical = Some(out.canonical);
        input.postcode = out.postcode;
        input.tokens = out.tokens;
        input.components = out.components;
        input.low_quality_canonical = out.low_quality_canonical;
        input.descriptors = out.descriptors;
    }

    /// C4 (generate) -> C5 (feature compute) -> C6 (score) -> C7 (decide).
    async fn run_candidate_tiers(
        &self,
        input: &InputRecord,
        run_label: &str,
    ) -> EngineResult<(Vec<MatchAttempt>, MatchResult)> {
        let bundles = candidates::generate(
            input,
            self.gazetteer.as_ref(),
            self.vector_index.as_deref(),
            self.embedder.as_deref(),
            &self.config.candidates,
        )
        .await?;

        let attempts: Vec<MatchAttempt> = bundles
            .iter()
            .map(|bundle| {
                let feature_map = features::compute(input, bundle, &self.config.candidates, &self.config.weights, &self.config.rules);
                let score = scoring::score(&feature_map, &self.config.weights);
                MatchAttempt {
                    input_id: input.input_id.clone(),
                    gazetteer_key: bundle.entry.gazetteer_key.clone(),
                    method: primary_method(bundle),
                    features: feature_map,
                    score,
                    tie_rank: 0,
                }
            })
            .collect();

        Ok(decision::decide(&input.input_id, run_label, attempts, &self.config.thresholds))
    }

    /// Persist every outcome in the batch, retrying the whole batch with
    /// the critical-path backoff schedule on a transient store failure
    /// (SPEC_FULL.md §5 "atomic batch commit"). Also runs C9 group
    /// consensus over the committed results before returning, since
    /// consensus needs siblings' final decisions.
    async fn commit_batch(&self, run_label: &str, outcomes: Vec<InputOutcome>) -> EngineResult<Vec<InputOutcome>> {
        let inputs = self.inputs.clone();
        let written = self
            .retry
            .for_critical(|| {
                let inputs = inputs.clone();
                let outcomes = &outcomes;
                async move {
                    for outcome in outcomes {
                        inputs.write_attempts(run_label, &outcome.attempts).await?;
                        inputs.write_result(&outcome.result).await?;
                        if let Some(note) = outcome.correction.as_ref() {
                            inputs.write_correction(note).await?;
                        }
                    }
                    Ok(())
                }
            })
            .await;

        match written {
            Ok(()) => Ok(self.run_consensus(run_label, outcomes).await),
            Err(error) => Err(MatchError::Store(error)),
        }
    }

    /// Group outcomes by `externalRef` and run C9 over each group with more
    /// than one member, persisting any propagations and folding them back
    /// into the returned outcomes so `fold_summary` sees the final counts.
    async fn run_consensus(&self, run_label: &str, mut outcomes: Vec<InputOutcome>) -> Vec<InputOutcome> {
        let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, outcome) in outcomes.iter().enumerate() {
            if let Some(external_ref) = outcome.input.external_ref.as_ref() {
                groups.entry(external_ref.clone()).or_default().push(index);
            }
        }

        for (_external_ref, indices) in groups {
            if indices.len() < 2 {
                continue;
            }
            let members: Vec<GroupMember<'_>> =
                indices.iter().map(|&i| GroupMember { input: &outcomes[i].input, result: &outcomes[i].result }).collect();

            let propagations = match consensus::correct_group(&members, run_label, &self.config.consensus, self.gazetteer.as_ref()).await {
                Ok(propagations) => propagations,
                Err(error) => {
                    warn!(run_label, error = %error, "consensus pass failed for group, leaving members unchanged");
                    continue;
                }
            };

            for propagation in propagations {
                if let Some(index) = indices.iter().find(|&&i| outcomes[i].input.input_id == propagation.result.input_id) {
                    if self.inputs.write_result(&propagation.result).await.is_ok()
                        && self.inputs.write_correction(&propagation.note).await.is_ok()
                    {
                        self.observability.consensus_propagations.add(1, &[]);
                        outcomes[*index].result = propagation.result;
                        outcomes[*index].correction = Some(propagation.note);
                    }
                }
            }
        }

        outcomes
    }

    /// C10, run once per outcome after C9 has had a chance to resolve it via
    /// a sibling — a group-consensus `AutoAccept` means there is nothing left
    /// for the rewriter gate to improve. Each acceptance is persisted
    /// immediately; a failed gate attempt leaves the outcome untouched
    /// rather than failing the run (SPEC_FULL.md §7).
    async fn apply_rewriter_gate(&self, run_label: &str, mut outcomes: Vec<InputOutcome>) -> Vec<InputOutcome> {
        let Some(rewriter) = self.rewriter.as_ref() else {
            return outcomes;
        };

        for outcome in outcomes.iter_mut() {
            let gate_start = Instant::now();
            let gate_result = rewriter_gate::attempt(
                &outcome.input,
                &outcome.result,
                &self.config,
                self.gazetteer.as_ref(),
                self.vector_index.as_deref(),
                self.embedder.as_deref(),
                rewriter.as_ref(),
                run_label,
            )
            .await;
            self.observability.record_tier_duration("c10_rewriter", gate_start.elapsed().as_secs_f64());

            match gate_result {
                Ok(rewriter_gate::GateOutcome::Accepted { result, note }) => {
                    if self.inputs.write_result(&result).await.is_ok() && self.inputs.write_correction(&note).await.is_ok() {
                        self.observability.rewriter_acceptances.add(1, &[]);
                        outcome.result = result;
                        outcome.correction = Some(note);
                    }
                }
                Ok(rewriter_gate::GateOutcome::Unchanged) => {}
                Err(error) => {
                    warn!(run_label, input_id = %outcome.input.input_id, error = %error, "rewriter gate failed, leaving result unchanged");
                }
            }
        }

        outcomes
    }

    /// Enqueue still-`Review` outcomes to the review sink and record final
    /// decision metrics, once C9 and C10 have both had their say.
    async fn finalize_outcomes(&self, outcomes: &[InputOutcome]) {
        for outcome in outcomes {
            if outcome.result.decision == crate::domain::Decision::Review {
                if let Some(sink) = self.review_sink.as_ref() {
                    let top = outcome.attempts.iter().take(3).cloned().collect::<Vec<_>>();
                    if let Err(error) = sink.enqueue(&outcome.input.input_id, &top).await {
                        warn!(input_id = %outcome.input.input_id, error = %error, "review sink enqueue failed");
                    }
                }
            }
            self.observability.record_decision(outcome.result.decision, outcome.result.method, outcome.result.score);
        }
    }

    fn fold_summary(&self, summary: &mut RunSummary, outcomes: &[InputOutcome]) {
        for outcome in outcomes {
            summary.total_inputs += 1;
            match outcome.result.decision {
                crate::domain::Decision::AutoAccept => summary.auto_accept += 1,
                crate::domain::Decision::Review => summary.review += 1,
                crate::domain::Decision::Reject => summary.reject += 1,
            }
            if let Some(note) = outcome.correction.as_ref() {
                match note.agent {
                    crate::domain::CorrectionAgent::Consensus => summary.consensus_propagations += 1,
                    crate::domain::CorrectionAgent::Rewriter => summary.rewriter_acceptances += 1,
                    crate::domain::CorrectionAgent::Speller => {}
                }
            }
        }
        summary.sentinels_created += outcomes
            .iter()
            .filter(|o| o.attempts.iter().any(|a| a.method == crate::domain::MatchMethod::ReferenceHistoric))
            .count();
    }
}

/// The method credited to a candidate when multiple strategies produced it:
/// prefer the strongest signal (SPEC_FULL.md §4.3 precedence: exact >
/// fuzzy > semantic > spatial-only).
fn primary_method(bundle: &candidates::CandidateBundle) -> crate::domain::MatchMethod {
    use crate::domain::MatchMethod;
    use candidates::Strategy;

    if bundle.strategies.contains(&Strategy::CanonicalExact) {
        MatchMethod::CanonicalExact
    } else if bundle.strategies.contains(&Strategy::TrigramFuzzy) {
        MatchMethod::FuzzyLexical
    } else if bundle.strategies.contains(&Strategy::Semantic) {
        MatchMethod::Semantic
    } else {
        MatchMethod::Spatial
    }
}
