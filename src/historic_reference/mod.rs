//! C8: Historic-Reference Resolver. Short-circuits an input whose raw
//! reference number is present (or absent) in the gazetteer, bypassing the
//! candidate-generation tiers entirely (SPEC_FULL.md §4.2).

use std::collections::HashMap;

use crate::domain::{GazetteerEntry, InputRecord, MatchAttempt, MatchMethod};
use crate::errors::EngineResult;
use crate::features::keys;
use crate::ports::GazetteerStore;

/// Outcome of attempting the reference short-circuit for one input.
pub enum Resolution {
    /// No raw reference number on the input; proceed to the normal tiers.
    NotApplicable,
    /// Reference found (or created as a sentinel); pipeline short-circuits.
    Resolved(MatchAttempt),
}

/// Normalise a raw reference number: trim whitespace and strip a trailing
/// `.00` decimal-suffix data defect.
pub fn normalise_reference(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed.strip_suffix(".00").unwrap_or(trimmed).to_string()
}

/// Resolve the reference short-circuit for `input`. Looks up the normalised
/// reference; on a miss, inserts an idempotent sentinel entry so repeated
/// runs (or racing workers) never create more than one sentinel per
/// normalised reference number.
pub async fn resolve(input: &InputRecord, store: &dyn GazetteerStore) -> EngineResult<Resolution> {
    let Some(raw_ref) = input.raw_reference_number.as_deref() else {
        return Ok(Resolution::NotApplicable);
    };

    let normalised = normalise_reference(raw_ref);
    if normalised.is_empty() {
        return Ok(Resolution::NotApplicable);
    }

    if let Some(entry) = store.lookup_by_key(&normalised).await? {
        return Ok(Resolution::Resolved(reference_attempt(input, &entry, MatchMethod::ReferenceExact)));
    }

    let canonical = input.canonical.clone().unwrap_or_else(|| input.raw_text.clone());
    let sentinel = store.insert_sentinel(&normalised, &canonical, &input.input_id).await?;
    Ok(Resolution::Resolved(reference_attempt(input, &sentinel, MatchMethod::ReferenceHistoric)))
}

fn reference_attempt(input: &InputRecord, entry: &GazetteerEntry, method: MatchMethod) -> MatchAttempt {
    let mut features = HashMap::new();
    features.insert(keys::LEGACY_REFERENCE_VALID.to_string(), 1.0);
    MatchAttempt {
        input_id: input.input_id.clone(),
        gazetteer_key: entry.gazetteer_key.clone(),
        method,
        features,
        score: 1.0,
        tie_rank: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_suffix_is_stripped() {
        assert_eq!(normalise_reference("1710022145.00"), "1710022145");
    }

    #[test]
    fn whitespace_is_trimmed() {
        assert_eq!(normalise_reference("  1710022145  "), "1710022145");
    }

    #[test]
    fn unaffected_reference_passes_through() {
        assert_eq!(normalise_reference("9999999999"), "9999999999");
    }

    #[test]
    fn not_applicable_without_raw_reference_number() {
        use crate::ports::MockGazetteerStore;
        let store = MockGazetteerStore::new();
        let input = InputRecord::new("IN1", "12 High Street", "council_tax");
        let resolution = tokio_test::block_on(resolve(&input, &store)).expect("resolve");
        assert!(matches!(resolution, Resolution::NotApplicable));
    }
}
