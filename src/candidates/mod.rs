//! C4: Candidate Generator. Produces a bounded, deduplicated union of
//! gazetteer candidates from four independent strategies (S1-S4), leaving
//! ranking to the Scorer/Decider.

use std::collections::HashMap;

use crate::config::CandidatesConfig;
use crate::domain::{AddressComponents, GazetteerEntry, InputRecord};
use crate::errors::EngineResult;
use crate::phonetic;
use crate::ports::{Embedder, GazetteerStore, VectorIndex};

/// One of the four independent generator strategies. A closed variant set
/// (SPEC_FULL.md §9 "Dynamic dispatch") — the core knows each by name so the
/// Scorer can credit it and the audit trail can attribute a method tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    CanonicalExact,
    TrigramFuzzy,
    Semantic,
    Spatial,
}

/// A deduplicated candidate, annotated with every strategy that produced it
/// and the per-strategy score each contributed (SPEC_FULL.md §4.3 "union the
/// method tags and take the max per-strategy score as a feature").
#[derive(Debug, Clone)]
pub struct CandidateBundle {
    pub entry: GazetteerEntry,
    pub strategies: Vec<Strategy>,
    pub trigram_sim: Option<f64>,
    pub embed_cos: Option<f64>,
    pub spatial_distance_metres: Option<f64>,
}

impl CandidateBundle {
    fn new(entry: GazetteerEntry, strategy: Strategy) -> Self {
        Self {
            entry,
            strategies: vec![strategy],
            trigram_sim: None,
            embed_cos: None,
            spatial_distance_metres: None,
        }
    }

    fn merge_strategy(&mut self, strategy: Strategy) {
        if !self.strategies.contains(&strategy) {
            self.strategies.push(strategy);
        }
    }
}

/// Run all four strategies against `input` and return the deduplicated
/// union, capped at `config.max_candidates`. `vector_index`/`embedder` are
/// optional: if either is absent, S3 is skipped (the feature map will record
/// `embedCos = 0`, matching the `ExternalTransient`-drop contract of §7).
pub async fn generate(
    input: &InputRecord,
    store: &dyn GazetteerStore,
    vector_index: Option<&dyn VectorIndex>,
    embedder: Option<&dyn Embedder>,
    config: &CandidatesConfig,
) -> EngineResult<Vec<CandidateBundle>> {
    let canonical = input.canonical.as_deref().unwrap_or_default();
    if canonical.is_empty() {
        return Ok(Vec::new());
    }

    let mut merged: HashMap<String, CandidateBundle> = HashMap::new();

    for (entry, sim) in s1_canonical_exact(canonical, store).await? {
        upsert(&mut merged, entry, Strategy::CanonicalExact, Some(sim), None, None);
    }

    for (entry, sim) in s2_trigram_fuzzy(input, canonical, store, config).await? {
        upsert(&mut merged, entry, Strategy::TrigramFuzzy, Some(sim), None, None);
    }

    if let (Some(vector_index), Some(embedder)) = (vector_index, embedder) {
        for entry in s3_semantic(input, canonical, store, vector_index, embedder, config).await? {
            upsert(&mut merged, entry, Strategy::Semantic, None, None, None);
        }
    }

    if input.has_raw_coordinates() {
        for (entry, dist) in s4_spatial(input, store, config).await? {
            upsert(&mut merged, entry, Strategy::Spatial, None, None, Some(dist));
        }
    }

    let mut candidates: Vec<CandidateBundle> = merged.into_values().collect();
    candidates.truncate(config.max_candidates);
    Ok(candidates)
}

fn upsert(
    merged: &mut HashMap<String, CandidateBundle>,
    entry: GazetteerEntry,
    strategy: Strategy,
    trigram_sim: Option<f64>,
    embed_cos: Option<f64>,
    spatial_distance_metres: Option<f64>,
) {
    merged
        .entry(entry.gazetteer_key.clone())
        .and_modify(|bundle| {
            bundle.merge_strategy(strategy);
            if let Some(sim) = trigram_sim {
                bundle.trigram_sim = Some(bundle.trigram_sim.map_or(sim, |existing| existing.max(sim)));
            }
            if let Some(cos) = embed_cos {
                bundle.embed_cos = Some(bundle.embed_cos.map_or(cos, |existing| existing.max(cos)));
            }
            if let Some(dist) = spatial_distance_metres {
                bundle.spatial_distance_metres =
                    Some(bundle.spatial_distance_metres.map_or(dist, |existing| existing.min(dist)));
            }
        })
        .or_insert_with(|| {
            let mut bundle = CandidateBundle::new(entry, strategy);
            bundle.trigram_sim = trigram_sim;
            bundle.embed_cos = embed_cos;
            bundle.spatial_distance_metres = spatial_distance_metres;
            bundle
        });
}

/// S1: exact equality on canonical form. The store has no dedicated equality
/// index, so this is expressed as a trigram search pinned at similarity 1.0,
/// then defensively filtered to exact string matches.
async fn s1_canonical_exact(
    canonical: &str,
    store: &dyn GazetteerStore,
) -> EngineResult<Vec<(GazetteerEntry, f64)>> {
    let hits = store.trigram_search(canonical, 1.0, 5).await?;
    Ok(hits.into_iter().filter(|(entry, _)| entry.canonical == canonical).map(|(e, _)| (e, 1.0)).collect())
}

/// S2: trigram-index lookup with locality, house-number, and phonetic
/// pre-filters (SPEC_FULL.md §4.3).
async fn s2_trigram_fuzzy(
    input: &InputRecord,
    canonical: &str,
    store: &dyn GazetteerStore,
    config: &CandidatesConfig,
) -> EngineResult<Vec<(GazetteerEntry, f64)>> {
    let hits = store.trigram_search(canonical, config.min_trigram_sim, config.top_k_trigram).await?;

    let input_locality_tokens = locality_tokens(&input.components);
    let input_phonetic = phonetic::encode_tokens(&road_locality_tokens(&input.components, &input.tokens));

    let filtered = hits
        .into_iter()
        .filter(|(entry, _)| locality_overlap_ok(&input_locality_tokens, &locality_tokens(&entry.components)))
        .filter(|(entry, _)| house_number_agreement_ok(&input.components, &entry.components))
        .filter(|(entry, sim)| {
            *sim >= config.trigram_phonetic_bypass_sim || {
                let candidate_tokens = road_locality_tokens(&entry.components, &[]);
                let candidate_phonetic = phonetic::encode_tokens(&candidate_tokens);
                input_phonetic.iter().any(|code| candidate_phonetic.contains(code))
            }
        })
        .collect();
    Ok(filtered)
}

/// S3: embed the canonical form and query the vector index for nearest
/// neighbours by cosine, retaining only locality-consistent hits.
async fn s3_semantic(
    input: &InputRecord,
    canonical: &str,
    store: &dyn GazetteerStore,
    vector_index: &dyn VectorIndex,
    embedder: &dyn Embedder,
    config: &CandidatesConfig,
) -> EngineResult<Vec<GazetteerEntry>> {
    let vector = embedder.embed(canonical).await?;
    let hits = vector_index.search(&vector, config.top_k_semantic).await?;

    let input_locality_tokens = locality_tokens(&input.components);
    let mut entries = Vec::with_capacity(hits.len());
    for (key, _cosine) in hits {
        if let Some(entry) = store.lookup_by_key(&key).await? {
            if locality_overlap_ok(&input_locality_tokens, &locality_tokens(&entry.components)) {
                entries.push(entry);
            }
        }
    }
    Ok(entries)
}

/// S4: spatial-index query within a radius, nearest-K kept.
async fn s4_spatial(
    input: &InputRecord,
    store: &dyn GazetteerStore,
    config: &CandidatesConfig,
) -> EngineResult<Vec<(GazetteerEntry, f64)>> {
    let (x, y) = (input.raw_x.unwrap(), input.raw_y.unwrap());
    let hits = store.spatial_search(x, y, config.radius_metres, config.top_k_spatial).await?;
    Ok(hits)
}

fn locality_tokens(components: &AddressComponents) -> Vec<String> {
    [components.locality.as_deref(), components.town.as_deref()]
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect()
}

fn road_locality_tokens(components: &AddressComponents, fallback_tokens: &[String]) -> Vec<String> {
    let mut tokens: Vec<String> = [components.road.as_deref(), components.locality.as_deref()]
        .into_iter()
        .flatten()
        .flat_map(|s| s.split_whitespace().map(str::to_string))
        .collect();
    if tokens.is_empty() {
        tokens = fallback_tokens.to_vec();
    }
    tokens
}

/// If the input carries locality/town tokens, require at least one shared
/// token with the candidate; inputs with no locality information pass
/// through unfiltered (nothing to compare against).
fn locality_overlap_ok(input_tokens: &[String], candidate_tokens: &[String]) -> bool {
    if input_tokens.is_empty() {
        return true;
    }
    input_tokens.iter().any(|t| candidate_tokens.contains(t))
}

/// Drop candidates whose house number flatly conflicts with the input's,
/// beyond the ±2 renumbering tolerance the Feature Computer itself
/// recognises. When either side lacks a house number there is nothing to
/// conflict on, so the candidate passes through to full scoring.
fn house_number_agreement_ok(input: &AddressComponents, candidate: &AddressComponents) -> bool {
    match (&input.house_number, &candidate.house_number) {
        (Some(a), Some(b)) => match (a.parse::<i64>(), b.parse::<i64>()) {
            (Ok(a), Ok(b)) => (a - b).abs() <= 2,
            _ => a == b,
        },
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CandidatesConfig;
    use crate::domain::GazetteerStatus;
    use crate::ports::{MockEmbedder, MockGazetteerStore, MockVectorIndex};

    fn mock_entry(key: &str, canonical: &str) -> GazetteerEntry {
        GazetteerEntry {
            gazetteer_key: key.to_string(),
            canonical: canonical.to_string(),
            components: AddressComponents::default(),
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

    /// Unit-level test against mocked store/embedder/vector-index adapters
    /// (SPEC_FULL.md §10.5) rather than an in-memory fake: verifies `generate`
    /// credits S1 (exact) and S3 (semantic) independently and merges them by
    /// `gazetteerKey`.
    #[tokio::test]
    async fn mocked_adapters_merge_exact_and_semantic_strategies() {
        let mut store = MockGazetteerStore::new();
        store.expect_trigram_search().returning(|canonical: &str, min_sim: f64, _limit: usize| {
            if min_sim >= 1.0 {
                Ok(vec![(mock_entry("K1", canonical), 1.0)])
            } else {
                Ok(Vec::new())
            }
        });
        store.expect_lookup_by_key().returning(|key: &str| Ok(Some(mock_entry(key, "12 HIGH STREET"))));
        store.expect_spatial_search().returning(|_, _, _, _| Ok(Vec::new()));

        let mut embedder = MockEmbedder::new();
        embedder.expect_embed().returning(|_: &str| Ok(vec![0.1, 0.2]));

        let mut vector_index = MockVectorIndex::new();
        vector_index.expect_search().returning(|_, _| Ok(vec![("K2".to_string(), 0.9)]));

        let mut input = InputRecord::new("IN1", "12 High Street", "council_tax");
        input.canonical = Some("12 HIGH STREET".to_string());

        let config = CandidatesConfig::default();
        let bundles = generate(&input, &store, Some(&vector_index), Some(&embedder), &config).await.expect("generate");

        assert!(
            bundles.iter().any(|b| b.entry.gazetteer_key == "K1" && b.strategies.contains(&Strategy::CanonicalExact)),
            "S1 exact-match candidate missing"
        );
        assert!(
            bundles.iter().any(|b| b.entry.gazetteer_key == "K2" && b.strategies.contains(&Strategy::Semantic)),
            "S3 semantic candidate missing"
        );
    }

    #[test]
    fn locality_overlap_passes_with_no_input_locality() {
        assert!(locality_overlap_ok(&[], &["LISS".to_string()]));
    }

    #[test]
    fn locality_overlap_requires_shared_token() {
        let input = vec!["LISS".to_string()];
        assert!(locality_overlap_ok(&input, &["LISS".to_string(), "HAMPSHIRE".to_string()]));
        assert!(!locality_overlap_ok(&input, &["ALTON".to_string()]));
    }

    #[test]
    fn house_number_tolerance_allows_renumbering() {
        let mut input = AddressComponents::default();
        input.house_number = Some("12".to_string());
        let mut candidate = AddressComponents::default();
        candidate.house_number = Some("14".to_string());
        assert!(house_number_agreement_ok(&input, &candidate));
        candidate.house_number = Some("168".to_string());
        input.house_number = Some("147".to_string());
        assert!(!house_number_agreement_ok(&input, &candidate));
    }
}
