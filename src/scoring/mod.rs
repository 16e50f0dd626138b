//! C6: Scorer. Maps a feature vector to a scalar in `[0,1]` using the
//! configured weight set, with the additive penalty terms and the
//! house-number conflict gate (SPEC_FULL.md §4.4).

use std::collections::HashMap;

use crate::config::WeightsConfig;
use crate::features::keys;

/// Compute the final score for one feature map, per the formula in
/// SPEC_FULL.md §4.4, clamped to `[0,1]`.
pub fn score(features: &HashMap<String, f64>, weights: &WeightsConfig) -> f64 {
    let get = |key: &str| features.get(key).copied().unwrap_or(0.0);

    let trigram_sim = get(keys::TRIGRAM_SIM);
    let embed_cos = get(keys::EMBED_COS);
    let locality_overlap = get(keys::LOCALITY_OVERLAP);
    let street_overlap = get(keys::STREET_OVERLAP);
    let same_house_num = get(keys::SAME_HOUSE_NUM) != 0.0;
    let same_house_alpha = get(keys::SAME_HOUSE_ALPHA) != 0.0;
    let usrn_match = get(keys::USRN_MATCH) != 0.0;
    let status_live = get(keys::STATUS_LIVE) != 0.0;
    let legacy_reference_valid = get(keys::LEGACY_REFERENCE_VALID) != 0.0;
    let spatial_boost = get(keys::SPATIAL_BOOST);
    let descriptor_mismatch = get(keys::DESCRIPTOR_MISMATCH) != 0.0;
    let phonetic_hits = get(keys::PHONETIC_HITS);
    let house_num_match = get(keys::HOUSE_NUM_MATCH);
    let unit_match = get(keys::UNIT_MATCH);

    let mut raw = weights.w_trg * trigram_sim
        + weights.w_emb * embed_cos
        + weights.w_loc * locality_overlap
        + weights.w_str * street_overlap
        + if same_house_num { weights.w_hn } else { 0.0 }
        + if same_house_alpha { weights.w_ha } else { 0.0 }
        + if usrn_match { weights.w_usrn } else { 0.0 }
        + if status_live { weights.w_live } else { 0.0 }
        + if legacy_reference_valid { weights.w_leg } else { 0.0 }
        + spatial_boost
        - if descriptor_mismatch { weights.w_dp.abs() } else { 0.0 }
        - if phonetic_hits == 0.0 && trigram_sim < 0.85 { weights.w_phon.abs() } else { 0.0 }
        - if house_num_match < 0.0 { weights.w_hnc.abs() } else { 0.0 }
        - if unit_match < 0.0 { weights.w_unit.abs() } else { 0.0 };

    // House-number conflict gate: a hard guard against renumbered-street
    // false positives, applied in addition to the additive penalty above.
    if house_num_match < 0.0 && raw > weights.house_num_conflict_score_floor {
        raw *= weights.house_num_conflict_multiplier;
    }

    raw.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_features() -> HashMap<String, f64> {
        let mut f = HashMap::new();
        f.insert(keys::TRIGRAM_SIM.to_string(), 1.0);
        f.insert(keys::EMBED_COS.to_string(), 1.0);
        f.insert(keys::LOCALITY_OVERLAP.to_string(), 1.0);
        f.insert(keys::STREET_OVERLAP.to_string(), 1.0);
        f.insert(keys::SAME_HOUSE_NUM.to_string(), 1.0);
        f.insert(keys::SAME_HOUSE_ALPHA.to_string(), 1.0);
        f.insert(keys::HOUSE_NUM_MATCH.to_string(), 1.0);
        f.insert(keys::UNIT_MATCH.to_string(), 0.0);
        f.insert(keys::PHONETIC_HITS.to_string(), 2.0);
        f.insert(keys::SPATIAL_BOOST.to_string(), 0.0);
        f.insert(keys::USRN_MATCH.to_string(), 1.0);
        f.insert(keys::STATUS_LIVE.to_string(), 1.0);
        f.insert(keys::DESCRIPTOR_MISMATCH.to_string(), 0.0);
        f.insert(keys::LEGACY_REFERENCE_VALID.to_string(), 0.0);
        f
    }

    #[test]
    fn perfect_match_scores_near_one() {
        let weights = WeightsConfig::default();
        let s = score(&base_features(), &weights);
        assert!(s > 0.95, "expected near-1 score, got {s}");
    }

    #[test]
    fn house_number_conflict_collapses_score() {
        let weights = WeightsConfig::default();
        let mut features = base_features();
        features.insert(keys::HOUSE_NUM_MATCH.to_string(), -1.0);
        features.insert(keys::SAME_HOUSE_NUM.to_string(), 0.0);
        let s = score(&features, &weights);
        assert!(s <= 0.10, "expected gated score <= 0.10, got {s}");
    }

    #[test]
    fn score_is_always_clamped() {
        let weights = WeightsConfig::default();
        let mut features = base_features();
        features.insert(keys::SPATIAL_BOOST.to_string(), 10.0);
        assert!(score(&features, &weights) <= 1.0);
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        fn arb_features() -> impl Strategy<Value = HashMap<String, f64>> {
            (
                0.0f64..=1.0,
                0.0f64..=1.0,
                0.0f64..=1.0,
                0.0f64..=1.0,
                prop_oneof![Just(0.0), Just(1.0)],
                prop_oneof![Just(0.0), Just(1.0)],
                prop_oneof![Just(0.0), Just(1.0)],
                prop_oneof![Just(0.0), Just(1.0)],
                prop_oneof![Just(0.0), Just(1.0)],
                0.0f64..=0.5,
                prop_oneof![Just(0.0), Just(1.0)],
                0.0f64..=3.0,
                prop_oneof![Just(-1.0), Just(0.0), Just(0.5), Just(1.0)],
                prop_oneof![Just(-1.0), Just(0.0), Just(1.0)],
            )
                .prop_map(|(trg, emb, loc, street, hn, ha, usrn, live, leg, spatial, dp, phon, hnm, unit)| {
                    let mut f = HashMap::new();
                    f.insert(keys::TRIGRAM_SIM.to_string(), trg);
                    f.insert(keys::EMBED_COS.to_string(), emb);
                    f.insert(keys::LOCALITY_OVERLAP.to_string(), loc);
                    f.insert(keys::STREET_OVERLAP.to_string(), street);
                    f.insert(keys::SAME_HOUSE_NUM.to_string(), hn);
                    f.insert(keys::SAME_HOUSE_ALPHA.to_string(), ha);
                    f.insert(keys::USRN_MATCH.to_string(), usrn);
                    f.insert(keys::STATUS_LIVE.to_string(), live);
                    f.insert(keys::LEGACY_REFERENCE_VALID.to_string(), leg);
                    f.insert(keys::SPATIAL_BOOST.to_string(), spatial);
                    f.insert(keys::DESCRIPTOR_MISMATCH.to_string(), dp);
                    f.insert(keys::PHONETIC_HITS.to_string(), phon);
                    f.insert(keys::HOUSE_NUM_MATCH.to_string(), hnm);
                    f.insert(keys::UNIT_MATCH.to_string(), unit);
                    f
                })
        }

        /// Independently re-derives the score straight from the raw feature
        /// map, mirroring SPEC_FULL.md §4.4 without calling `score` — this is
        /// what explainability requires: the persisted feature map is enough
        /// to reconstruct the persisted score.
        fn reconstruct(features: &HashMap<String, f64>, weights: &WeightsConfig) -> f64 {
            let get = |key: &str| features.get(key).copied().unwrap_or(0.0);
            let mut raw = weights.w_trg * get(keys::TRIGRAM_SIM)
                + weights.w_emb * get(keys::EMBED_COS)
                + weights.w_loc * get(keys::LOCALITY_OVERLAP)
                + weights.w_str * get(keys::STREET_OVERLAP)
                + if get(keys::SAME_HOUSE_NUM) != 0.0 { weights.w_hn } else { 0.0 }
                + if get(keys::SAME_HOUSE_ALPHA) != 0.0 { weights.w_ha } else { 0.0 }
                + if get(keys::USRN_MATCH) != 0.0 { weights.w_usrn } else { 0.0 }
                + if get(keys::STATUS_LIVE) != 0.0 { weights.w_live } else { 0.0 }
                + if get(keys::LEGACY_REFERENCE_VALID) != 0.0 { weights.w_leg } else { 0.0 }
                + get(keys::SPATIAL_BOOST)
                - if get(keys::DESCRIPTOR_MISMATCH) != 0.0 { weights.w_dp.abs() } else { 0.0 }
                - if get(keys::PHONETIC_HITS) == 0.0 && get(keys::TRIGRAM_SIM) < 0.85 { weights.w_phon.abs() } else { 0.0 }
                - if get(keys::HOUSE_NUM_MATCH) < 0.0 { weights.w_hnc.abs() } else { 0.0 }
                - if get(keys::UNIT_MATCH) < 0.0 { weights.w_unit.abs() } else { 0.0 };
            if get(keys::HOUSE_NUM_MATCH) < 0.0 && raw > weights.house_num_conflict_score_floor {
                raw *= weights.house_num_conflict_multiplier;
            }
            raw.clamp(0.0, 1.0)
        }

        proptest! {
            /// P9: the persisted feature map reconstructs the persisted score
            /// to within 1e-6.
            #[test]
            fn score_is_reconstructible_from_its_feature_map(features in arb_features()) {
                let weights = WeightsConfig::default();
                let computed = score(&features, &weights);
                let reconstructed = reconstruct(&features, &weights);
                prop_assert!((computed - reconstructed).abs() < 1e-6, "score {} vs reconstructed {}", computed, reconstructed);
            }
        }
    }
}
