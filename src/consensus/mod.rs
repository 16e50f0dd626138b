//! C9: Group Consensus Corrector. Propagates a "golden" answer within an
//! external-reference group to unmatched siblings, subject to per-pair
//! verification (SPEC_FULL.md §4.6).

use serde_json::json;

use crate::config::ConsensusConfig;
use crate::domain::{CorrectionAgent, CorrectionNote, Decision, InputRecord, MatchMethod, MatchResult};
use crate::errors::{EngineResult, VerifierSignal};
use crate::features::{self, similarity};
use crate::phonetic;
use crate::ports::GazetteerStore;

/// One member of an external-reference group: its input record and its
/// match result from the per-input pipeline (C4-C7).
pub struct GroupMember<'a> {
    pub input: &'a InputRecord,
    pub result: &'a MatchResult,
}

/// A proposed promotion for one unmatched sibling, plus the audit note to
/// append.
pub struct Propagation {
    pub result: MatchResult,
    pub note: CorrectionNote,
}

/// Run consensus propagation for one external-reference group. Returns one
/// `Propagation` per sibling the golden key was successfully proposed to;
/// an empty vector means no propagation happened (group out of size range,
/// no golden key, or every sibling failed verification).
pub async fn correct_group(
    members: &[GroupMember<'_>],
    run_label: &str,
    config: &ConsensusConfig,
    store: &dyn GazetteerStore,
) -> EngineResult<Vec<Propagation>> {
    if members.len() < config.min_group || members.len() > config.max_group {
        return Ok(Vec::new());
    }

    let Some(golden_key) = find_golden_key(members, config.golden_min_siblings) else {
        return Ok(Vec::new());
    };

    let Some(golden_entry) = store.lookup_by_key(&golden_key).await? else {
        return Ok(Vec::new());
    };

    let mut propagations = Vec::new();
    for member in members {
        if member.result.decision == Decision::AutoAccept {
            continue;
        }

        let canonical = member.input.canonical.as_deref().unwrap_or_default();
        let signal = verify(canonical, &golden_entry.canonical, &member.input.components, &golden_entry.components, config);
        if !signal.is_same() {
            continue;
        }

        let confidence = confidence_for(canonical, &golden_entry.canonical, config);
        let result = MatchResult::auto_accept(
            member.input.input_id.clone(),
            run_label,
            golden_key.clone(),
            MatchMethod::Consensus,
            confidence,
            format!("consensus propagation from group golden key {golden_key}"),
        );
        let note = CorrectionNote::new(
            member.input.input_id.clone(),
            canonical,
            &golden_entry.canonical,
            CorrectionAgent::Consensus,
            confidence,
            json!({ "goldenKey": golden_key, "verifier": "same" }),
        );
        propagations.push(Propagation { result, note });
    }

    Ok(propagations)
}

/// The golden key: a `gazetteerKey` at least `golden_min_siblings` members
/// have already `autoAccept`ed to, with at least one unmatched sibling
/// remaining (the contract requires both; an all-accepted or all-unmatched
/// group has nothing to propagate).
fn find_golden_key(members: &[GroupMember<'_>], golden_min_siblings: usize) -> Option<String> {
    use std::collections::HashMap;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for member in members {
        if member.result.decision == Decision::AutoAccept {
            if let Some(key) = member.result.gazetteer_key.as_deref() {
                *counts.entry(key).or_insert(0) += 1;
            }
        }
    }

    let has_unmatched = members.iter().any(|m| m.result.decision != Decision::AutoAccept);
    if !has_unmatched {
        return None;
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count >= golden_min_siblings)
        .max_by_key(|(_, count)| *count)
        .map(|(key, _)| key.to_string())
}

fn verify(
    sibling_canonical: &str,
    golden_canonical: &str,
    sibling_components: &crate::domain::AddressComponents,
    golden_components: &crate::domain::AddressComponents,
    config: &ConsensusConfig,
) -> VerifierSignal {
    if features::house_num_match(sibling_components, golden_components) < 0.0 {
        return VerifierSignal::Different;
    }

    let sibling_tokens: Vec<String> = sibling_canonical.split_whitespace().map(str::to_string).collect();
    let golden_tokens: Vec<String> = golden_canonical.split_whitespace().map(str::to_string).collect();
    let phonetic_overlap = phonetic::shared_code_count(&sibling_tokens, &golden_tokens) > 0;
    let trigram_sim = similarity::trigram_similarity(sibling_canonical, golden_canonical);

    if phonetic_overlap || trigram_sim >= config.min_trigram_sim {
        VerifierSignal::Same
    } else {
        VerifierSignal::Unknown
    }
}

fn confidence_for(sibling_canonical: &str, golden_canonical: &str, config: &ConsensusConfig) -> f64 {
    let trigram_sim = similarity::trigram_similarity(sibling_canonical, golden_canonical);
    let span = (config.confidence_high - config.confidence_low).max(0.0);
    let strength = ((trigram_sim - config.min_trigram_sim) / (1.0 - config.min_trigram_sim).max(f64::EPSILON)).clamp(0.0, 1.0);
    config.confidence_low + span * strength
}
