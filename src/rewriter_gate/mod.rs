//! C10: Rewriter Gate (optional). Invokes an external text rewriter on
//! low-confidence inputs matching known malformed patterns, re-matches, and
//! conservatively accepts (SPEC_FULL.md §4.7). Any failure leaves the
//! original result unchanged — this gate never degrades a result.

use regex::RegexSet;
use serde_json::json;

use crate::canonical;
use crate::candidates;
use crate::config::Config;
use crate::domain::{CorrectionAgent, CorrectionNote, GazetteerEntry, InputRecord, MatchMethod, MatchResult};
use crate::errors::{EngineResult, VerifierSignal};
use crate::features::{self, similarity};
use crate::ports::{Embedder, GazetteerStore, Rewriter, VectorIndex};
use crate::scoring;

/// Outcome of attempting the rewriter gate on one low-confidence input.
pub enum GateOutcome {
    /// The gate did not trigger (score above threshold, or no pattern
    /// matched) or the rewrite was rejected by a guard; the caller should
    /// keep the original result.
    Unchanged,
    /// The rewrite was accepted; contains the replacement result and its
    /// audit note.
    Accepted { result: MatchResult, note: CorrectionNote },
}

/// Compile the configured trigger patterns into a `RegexSet` once per
/// config value. Patterns are data-driven (SPEC_FULL.md §6
/// `rewriter.patterns[]`); an invalid pattern is dropped rather than
/// panicking the orchestrator.
fn compile_patterns(patterns: &[String]) -> RegexSet {
    RegexSet::new(patterns).unwrap_or_else(|_| RegexSet::empty())
}

/// Attempt the rewriter gate for `input`, whose best current result is
/// `current_result` with feature map `current_features` (for the
/// `sameHouseNum` guard). Returns `Unchanged` unless every acceptance
/// condition in SPEC_FULL.md §4.7 holds.
#[allow(clippy::too_many_arguments)]
pub async fn attempt(
    input: &InputRecord,
    current_result: &MatchResult,
    config: &Config,
    store: &dyn GazetteerStore,
    vector_index: Option<&dyn VectorIndex>,
    embedder: Option<&dyn Embedder>,
    rewriter: &dyn Rewriter,
    run_label: &str,
) -> EngineResult<GateOutcome> {
    if !config.rewriter.enabled || current_result.score > config.rewriter.trigger_score_max {
        return Ok(GateOutcome::Unchanged);
    }

    let canonical = input.canonical.as_deref().unwrap_or_default();
    let patterns = compile_patterns(&config.rewriter.patterns);
    if patterns.patterns().is_empty() || !patterns.is_match(canonical) {
        return Ok(GateOutcome::Unchanged);
    }

    let rewritten_text = match rewriter.rewrite(canonical).await {
        Ok(text) => text,
        Err(_) => return Ok(GateOutcome::Unchanged),
    };

    let rewritten = canonical::canonicalize(&rewritten_text, &config.rules);
    let mut rewritten_input = input.clone();
    rewritten_input.canonical = Some(rewritten.canonical.clone());
    rewritten_input.components = rewritten.components.clone();
    rewritten_input.tokens = rewritten.tokens.clone();

    let bundles = candidates::generate(&rewritten_input, store, vector_index, embedder, &config.candidates).await?;
    let Some((best_entry, best_score, best_features)) = best_candidate(&rewritten_input, &bundles, config) else {
        return Ok(GateOutcome::Unchanged);
    };

    if best_score < config.rewriter.accept_score_min {
        return Ok(GateOutcome::Unchanged);
    }

    let both_sides_lack_house_number =
        rewritten_input.components.house_number.is_none() && best_entry.components.house_number.is_none();
    let same_house_num_ok = both_sides_lack_house_number
        || best_features.get(features::keys::HOUSE_NUM_MATCH).copied() == Some(1.0);
    if !same_house_num_ok {
        return Ok(GateOutcome::Unchanged);
    }

    let verifier = verify_same_address(canonical, &rewritten.canonical, &input.components, &rewritten.components);
    if !verifier.is_same() {
        return Ok(GateOutcome::Unchanged);
    }

    let result = MatchResult::auto_accept(
        input.input_id.clone(),
        run_label,
        best_entry.gazetteer_key.clone(),
        MatchMethod::RewriterAssisted,
        best_score,
        "rewriter gate accepted re-match",
    );
    let note = CorrectionNote::new(
        input.input_id.clone(),
        canonical,
        &rewritten.canonical,
        CorrectionAgent::Rewriter,
        best_score,
        json!({ "verifier": "same" }),
    );

    Ok(GateOutcome::Accepted { result, note })
}

fn best_candidate<'a>(
    rewritten_input: &InputRecord,
    bundles: &'a [candidates::CandidateBundle],
    config: &Config,
) -> Option<(&'a GazetteerEntry, f64, std::collections::HashMap<String, f64>)> {
    bundles
        .iter()
        .map(|bundle| {
            let features = features::compute(rewritten_input, bundle, &config.candidates, &config.weights, &config.rules);
            let score = scoring::score(&features, &config.weights);
            (&bundle.entry, score, features)
        })
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}

fn verify_same_address(
    before_canonical: &str,
    after_canonical: &str,
    before_components: &crate::domain::AddressComponents,
    after_components: &crate::domain::AddressComponents,
) -> VerifierSignal {
    if features::house_num_match(before_components, after_components) < 0.0 {
        return VerifierSignal::Different;
    }
    if similarity::trigram_similarity(before_canonical, after_canonical) >= 0.5 {
        VerifierSignal::Same
    } else {
        VerifierSignal::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pattern_list_compiles_to_empty_set() {
        let set = compile_patterns(&[]);
        assert!(set.patterns().is_empty());
    }

    #[test]
    fn compile_patterns_handles_valid_pattern() {
        let set = compile_patterns(&[r"^\d+\s+ESTATE".to_string()]);
        assert!(set.is_match("12 ESTATE ROAD"));
    }
}
