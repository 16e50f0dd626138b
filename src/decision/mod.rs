//! C7: Decider. Applies tiered thresholds, winner-margin, and structural
//! gates to a ranked candidate list to pick a decision (SPEC_FULL.md §4.5).

use std::cmp::Ordering;

use crate::config::ThresholdsConfig;
use crate::domain::{Decision, MatchAttempt, MatchResult};
use crate::features::keys;

/// Rank `attempts` by score (with the documented secondary ordering), assign
/// dense tie ranks, and apply the tiered decision algorithm. Returns the
/// decision plus the attempts in their final ranked order (tie ranks set),
/// ready for persistence.
pub fn decide(
    input_id: &str,
    run_label: &str,
    mut attempts: Vec<MatchAttempt>,
    thresholds: &ThresholdsConfig,
) -> (MatchResult, Vec<MatchAttempt>) {
    attempts.sort_by(|a, b| compare_candidates(a, b));
    for (i, attempt) in attempts.iter_mut().enumerate() {
        attempt.tie_rank = (i + 1) as u32;
    }

    let Some(top) = attempts.first() else {
        return (MatchResult::reject(input_id, run_label, "no candidates survived generation"), attempts);
    };

    if top.score < thresholds.min_keep {
        return (
            MatchResult::reject(input_id, run_label, format!("top score {:.4} below minKeep", top.score)),
            attempts,
        );
    }

    let margin = attempts.get(1).map(|second| top.score - second.score).unwrap_or(1.0);

    let top = attempts[0].clone();

    if top.score >= thresholds.high_accept && margin >= thresholds.winner_margin {
        let result = MatchResult::auto_accept(
            input_id,
            run_label,
            top.gazetteer_key.clone(),
            top.method,
            top.score,
            format!("high-tier accept, margin {margin:.4}"),
        );
        return (result, attempts);
    }

    let same_house_num = top.feature(keys::SAME_HOUSE_NUM) == 1.0;
    let locality_overlap_ok = top.feature(keys::LOCALITY_OVERLAP) >= thresholds.medium_locality_overlap_floor;
    if top.score >= thresholds.medium_accept
        && same_house_num
        && locality_overlap_ok
        && margin >= thresholds.winner_margin + thresholds.medium_margin_bonus
    {
        let result = MatchResult::auto_accept(
            input_id,
            run_label,
            top.gazetteer_key.clone(),
            top.method,
            top.score,
            format!("medium-tier accept, margin {margin:.4}"),
        );
        return (result, attempts);
    }

    if top.score >= thresholds.review_floor {
        return (MatchResult::review(input_id, run_label, top.score, "score above reviewFloor, below accept tiers"), attempts);
    }

    (MatchResult::reject(input_id, run_label, format!("top score {:.4} below reviewFloor", top.score)), attempts)
}

/// Primary: score descending. Secondary ordering for ties (SPEC_FULL.md
/// §4.5): (a) higher `houseNumMatch`; (b) `statusLive` > provisional >
/// historic; (c) shorter `spatialDistance` when present; (d) higher
/// `trigramSim`.
fn compare_candidates(a: &MatchAttempt, b: &MatchAttempt) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.feature(keys::HOUSE_NUM_MATCH).partial_cmp(&a.feature(keys::HOUSE_NUM_MATCH)).unwrap_or(Ordering::Equal))
        .then_with(|| b.feature(keys::STATUS_RANK).partial_cmp(&a.feature(keys::STATUS_RANK)).unwrap_or(Ordering::Equal))
        .then_with(|| spatial_distance_ordering(a, b))
        .then_with(|| b.feature(keys::TRIGRAM_SIM).partial_cmp(&a.feature(keys::TRIGRAM_SIM)).unwrap_or(Ordering::Equal))
}

fn spatial_distance_ordering(a: &MatchAttempt, b: &MatchAttempt) -> Ordering {
    match (a.features.get(keys::SPATIAL_DISTANCE), b.features.get(keys::SPATIAL_DISTANCE)) {
        (Some(da), Some(db)) => da.partial_cmp(db).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MatchMethod;
    use std::collections::HashMap;

    fn attempt(key: &str, score: f64, same_house_num: bool, locality_overlap: f64) -> MatchAttempt {
        let mut features = HashMap::new();
        features.insert(keys::SAME_HOUSE_NUM.to_string(), if same_house_num { 1.0 } else { 0.0 });
        features.insert(keys::HOUSE_NUM_MATCH.to_string(), if same_house_num { 1.0 } else { 0.0 });
        features.insert(keys::LOCALITY_OVERLAP.to_string(), locality_overlap);
        features.insert(keys::TRIGRAM_SIM.to_string(), score);
        MatchAttempt {
            input_id: "IN1".to_string(),
            gazetteer_key: key.to_string(),
            method: MatchMethod::FuzzyLexical,
            features,
            score,
            tie_rank: 0,
        }
    }

    #[test]
    fn high_tier_accept_with_sufficient_margin() {
        let thresholds = ThresholdsConfig::default();
        let attempts = vec![attempt("K1", 0.95, true, 1.0), attempt("K2", 0.80, true, 1.0)];
        let (result, _) = decide("IN1", "run-1", attempts, &thresholds);
        assert!(result.is_auto_accept());
        assert_eq!(result.gazetteer_key.as_deref(), Some("K1"));
    }

    #[test]
    fn high_tier_blocked_by_insufficient_margin() {
        let thresholds = ThresholdsConfig::default();
        let attempts = vec![attempt("K1", 0.95, true, 1.0), attempt("K2", 0.94, true, 1.0)];
        let (result, _) = decide("IN1", "run-1", attempts, &thresholds);
        assert_eq!(result.decision, Decision::Review);
    }

    #[test]
    fn empty_candidate_list_rejects() {
        let thresholds = ThresholdsConfig::default();
        let (result, _) = decide("IN1", "run-1", Vec::new(), &thresholds);
        assert_eq!(result.decision, Decision::Reject);
    }

    #[test]
    fn below_min_keep_rejects_even_as_sole_candidate() {
        let thresholds = ThresholdsConfig::default();
        let attempts = vec![attempt("K1", 0.5, true, 1.0)];
        let (result, _) = decide("IN1", "run-1", attempts, &thresholds);
        assert_eq!(result.decision, Decision::Reject);
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            /// P7: whenever `decide` auto-accepts, the winning margin meets the
            /// threshold its own tier requires (winnerMargin for the high tier,
            /// winnerMargin + medium-tier bonus for the medium tier).
            #[test]
            fn auto_accept_always_satisfies_its_tier_margin(
                top_score in 0.0f64..=1.0,
                gap in 0.0f64..=1.0,
                same_house_num in any::<bool>(),
                locality_overlap in 0.0f64..=1.0,
            ) {
                let thresholds = ThresholdsConfig::default();
                let second_score = (top_score - gap).max(0.0);
                let attempts = vec![
                    attempt("K1", top_score, same_house_num, locality_overlap),
                    attempt("K2", second_score, same_house_num, locality_overlap),
                ];
                let (result, ranked) = decide("IN1", "run-1", attempts, &thresholds);
                if result.is_auto_accept() {
                    let margin = ranked[0].score - ranked[1].score;
                    let required = if ranked[0].score >= thresholds.high_accept {
                        thresholds.winner_margin
                    } else {
                        thresholds.winner_margin + thresholds.medium_margin_bonus
                    };
                    prop_assert!(margin >= required - 1e-9, "auto-accept with margin {} below required {}", margin, required);
                }
            }
        }
    }
}
