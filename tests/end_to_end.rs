//! End-to-end scenarios against the pure matching core, using an in-memory
//! `GazetteerStore` in place of a real database — the scenarios only
//! exercise the store's documented contract, so any conforming
//! implementation (in-memory here, `SeaOrmStore` in production) must behave
//! identically.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rstest::rstest;

use llpg_matcher::candidates;
use llpg_matcher::config::{CandidatesConfig, Config, ConsensusConfig, RulesConfig, ThresholdsConfig, WeightsConfig};
use llpg_matcher::consensus::{self, GroupMember};
use llpg_matcher::decision;
use llpg_matcher::domain::{AddressComponents, Decision, GazetteerEntry, GazetteerStatus, InputRecord, MatchAttempt, MatchMethod, MatchResult};
use llpg_matcher::errors::StoreResult;
use llpg_matcher::features;
use llpg_matcher::historic_reference::{self, Resolution};
use llpg_matcher::ports::GazetteerStore;

/// A trivial in-memory `GazetteerStore` backing the literal scenarios in
/// SPEC_FULL.md §8: keyed lookup, naive trigram ranking, no spatial data.
#[derive(Default)]
struct InMemoryStore {
    entries: Mutex<HashMap<String, GazetteerEntry>>,
}

impl InMemoryStore {
    fn with_entries(entries: Vec<GazetteerEntry>) -> Self {
        let map = entries.into_iter().map(|e| (e.gazetteer_key.clone(), e)).collect();
        Self { entries: Mutex::new(map) }
    }
}

#[async_trait]
impl GazetteerStore for InMemoryStore {
    async fn lookup_by_key(&self, key: &str) -> StoreResult<Option<GazetteerEntry>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn trigram_search(&self, canonical: &str, min_sim: f64, limit: usize) -> StoreResult<Vec<(GazetteerEntry, f64)>> {
        let mut hits: Vec<(GazetteerEntry, f64)> = self
            .entries
            .lock()
            .unwrap()
            .values()
            .map(|e| (e.clone(), features::similarity::trigram_similarity(canonical, &e.canonical)))
            .filter(|(_, sim)| *sim >= min_sim)
            .collect();
        hits.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        hits.truncate(limit);
        Ok(hits)
    }

    async fn spatial_search(&self, _x: f64, _y: f64, _radius_metres: f64, _limit: usize) -> StoreResult<Vec<(GazetteerEntry, f64)>> {
        Ok(Vec::new())
    }

    async fn insert_sentinel(&self, key: &str, canonical: &str, source_input_id: &str) -> StoreResult<GazetteerEntry> {
        let mut entries = self.entries.lock().unwrap();
        if let Some(existing) = entries.get(key) {
            return Ok(existing.clone());
        }
        let sentinel = GazetteerEntry::sentinel(key, canonical, source_input_id);
        entries.insert(key.to_string(), sentinel.clone());
        Ok(sentinel)
    }
}

fn live_entry(key: &str, canonical: &str, house_number: Option<&str>) -> GazetteerEntry {
    GazetteerEntry {
        gazetteer_key: key.to_string(),
        canonical: canonical.to_string(),
        components: AddressComponents { house_number: house_number.map(str::to_string), ..Default::default() },
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

fn input(raw: &str, rules: &RulesConfig) -> InputRecord {
    let mut record = InputRecord::new("IN1", raw, "council_tax");
    let out = llpg_matcher::canonical::canonicalize(raw, rules);
    record.canonical = Some(out.canonical);
    record.postcode = out.postcode;
    record.tokens = out.tokens;
    record.components = out.components;
    record.low_quality_canonical = out.low_quality_canonical;
    record.descriptors = out.descriptors;
    record
}

async fn run_candidate_tiers(
    record: &InputRecord,
    store: &dyn GazetteerStore,
    candidates_cfg: &CandidatesConfig,
    weights: &WeightsConfig,
    rules: &RulesConfig,
    thresholds: &ThresholdsConfig,
) -> (MatchResult, Vec<MatchAttempt>) {
    let bundles = candidates::generate(record, store, None, None, candidates_cfg).await.expect("candidate generation");
    let attempts: Vec<MatchAttempt> = bundles
        .iter()
        .map(|bundle| {
            let feature_map = features::compute(record, bundle, candidates_cfg, weights, rules);
            let computed_score = llpg_matcher::scoring::score(&feature_map, weights);
            MatchAttempt {
                input_id: record.input_id.clone(),
                gazetteer_key: bundle.entry.gazetteer_key.clone(),
                method: MatchMethod::FuzzyLexical,
                features: feature_map,
                score: computed_score,
                tie_rank: 0,
            }
        })
        .collect();
    decision::decide(&record.input_id, "run-1", attempts, thresholds)
}

#[rstest]
#[case::clean_case("1710022145", None)]
#[case::decimal_suffix_normalisation("1710022145.00", Some("1710022145.00"))]
#[tokio::test]
async fn scenario_1_and_2_reference_short_circuit(#[case] raw_reference: &str, #[case] miss_key: Option<&str>) {
    let rules = RulesConfig::default();
    let mut record = input("12 High Street Petersfield GU32 2AB", &rules);
    record.raw_reference_number = Some(raw_reference.to_string());
    let store = InMemoryStore::with_entries(vec![live_entry("1710022145", "SOMEWHERE ELSE", None)]);

    let resolution = historic_reference::resolve(&record, &store).await.expect("resolve");
    let Resolution::Resolved(attempt) = resolution else { panic!("expected short-circuit") };
    assert_eq!(attempt.gazetteer_key, "1710022145");
    assert_eq!(attempt.method, MatchMethod::ReferenceExact);
    assert_eq!(attempt.score, 1.0);

    if let Some(key) = miss_key {
        assert!(store.lookup_by_key(key).await.unwrap().is_none(), "no sentinel created for the raw suffixed key");
    }

    let (result, _) = decision::decide("IN1", "run-1", vec![attempt], &ThresholdsConfig::default());
    assert!(result.is_auto_accept());
    assert_eq!(result.gazetteer_key.as_deref(), Some("1710022145"));
}

#[tokio::test]
async fn scenario_3_historic_reference_creates_sentinel_once() {
    let rules = RulesConfig::default();
    let mut record = input("derelict site, no known address", &rules);
    record.raw_reference_number = Some("9999999999".to_string());
    let store = InMemoryStore::default();

    let resolution = historic_reference::resolve(&record, &store).await.expect("resolve");
    let Resolution::Resolved(attempt) = resolution else { panic!("expected short-circuit") };
    assert_eq!(attempt.gazetteer_key, "9999999999");
    assert_eq!(attempt.method, MatchMethod::ReferenceHistoric);

    let (result, _) = decision::decide("IN1", "run-1", vec![attempt], &ThresholdsConfig::default());
    assert!(result.is_auto_accept());
    assert_eq!(result.gazetteer_key.as_deref(), Some("9999999999"));

    // Re-resolving must not create a second sentinel (P4).
    let second = historic_reference::resolve(&record, &store).await.expect("resolve again");
    let Resolution::Resolved(second_attempt) = second else { panic!("expected short-circuit") };
    assert_eq!(second_attempt.method, MatchMethod::ReferenceExact, "second lookup finds the already-created sentinel");
    assert_eq!(store.entries.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn scenario_4_canonical_exact_auto_accepts() {
    let rules = RulesConfig::default();
    let record = input("12 High Street, Petersfield GU32 2AB", &rules);
    let canonical = record.canonical.clone().unwrap();
    let store = InMemoryStore::with_entries(vec![live_entry("K1", &canonical, Some("12"))]);

    let (result, attempts) =
        run_candidate_tiers(&record, &store, &CandidatesConfig::default(), &WeightsConfig::default(), &rules, &ThresholdsConfig::default()).await;

    assert!(result.is_auto_accept(), "expected autoAccept, got {:?} (attempts: {})", result.decision, attempts.len());
    assert_eq!(result.gazetteer_key.as_deref(), Some("K1"));
    assert!(result.score >= ThresholdsConfig::default().high_accept);
}

#[rstest]
#[case::house_number_guard("168 Station Road Liss", vec![live_entry("K1", "147 STATION ROAD LISS", Some("147"))])]
#[case::unit_guard("Unit 10, Mill Lane, Alton", vec![{
    let mut entry = live_entry("K1", "UNIT 7 4 MILL LANE ALTON", Some("4"));
    entry.components.unit = Some("7".to_string());
    entry
}])]
#[tokio::test]
async fn scenario_5_and_6_guards_reject(#[case] raw: &str, #[case] entries: Vec<GazetteerEntry>) {
    let rules = RulesConfig::default();
    let record = input(raw, &rules);
    let store = InMemoryStore::with_entries(entries);

    let (result, _) =
        run_candidate_tiers(&record, &store, &CandidatesConfig::default(), &WeightsConfig::default(), &rules, &ThresholdsConfig::default()).await;

    assert_eq!(result.decision, Decision::Reject, "guard conflict must never auto-accept");
}

#[tokio::test]
async fn scenario_7_consensus_propagates_reject_to_golden_key() {
    let rules = RulesConfig::default();
    let store = InMemoryStore::with_entries(vec![live_entry("K1", "12 HIGH STREET PETERSFIELD", Some("12"))]);

    let mut sibling_a = input("12 High Street Petersfield", &rules);
    sibling_a.external_ref = Some("G1".to_string());
    let result_a = MatchResult::auto_accept("IN-A", "run-1", "K1", MatchMethod::CanonicalExact, 0.97, "exact match");

    let mut sibling_b = input("12 High Street Petersfield", &rules);
    sibling_b.external_ref = Some("G1".to_string());
    let result_b = MatchResult::auto_accept("IN-B", "run-1", "K1", MatchMethod::CanonicalExact, 0.96, "exact match");

    let mut sibling_reject = input("12 High Streete Petersfeild", &rules);
    sibling_reject.external_ref = Some("G1".to_string());
    let result_reject = MatchResult::reject("IN-C", "run-1", "below reviewFloor");

    let mut sibling_review = input("unrelated address entirely", &rules);
    sibling_review.external_ref = Some("G1".to_string());
    let result_review = MatchResult::review("IN-D", "run-1", 0.5, "ambiguous");

    let members = vec![
        GroupMember { input: &sibling_a, result: &result_a },
        GroupMember { input: &sibling_b, result: &result_b },
        GroupMember { input: &sibling_reject, result: &result_reject },
        GroupMember { input: &sibling_review, result: &result_review },
    ];

    let propagations = consensus::correct_group(&members, "run-1", &ConsensusConfig::default(), &store).await.expect("consensus pass");

    let promoted = propagations.iter().find(|p| p.result.input_id == "IN-C").expect("the reject sibling is promoted");
    assert!(promoted.result.is_auto_accept());
    assert_eq!(promoted.result.gazetteer_key.as_deref(), Some("K1"));
    assert_eq!(promoted.result.method, Some(MatchMethod::Consensus));
    assert_eq!(promoted.note.agent, llpg_matcher::domain::CorrectionAgent::Consensus);
}

#[test]
fn config_is_complete() {
    // Guards against a config struct that dropped a field on a rename.
    let config = Config::default();
    assert!(config.thresholds.high_accept > config.thresholds.medium_accept);
    assert!(config.thresholds.medium_accept > config.thresholds.review_floor);
}
