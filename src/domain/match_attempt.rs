use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The strategy or tier that produced a `MatchAttempt`. The core knows these
/// by name — this is a closed variant set, not an open plugin system, so the
/// Scorer can credit each method correctly and the audit trail can attribute
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum MatchMethod {
    ReferenceExact,
    ReferenceHistoric,
    CanonicalExact,
    ComponentStrict,
    ComponentValidated,
    FuzzyLexical,
    Semantic,
    Spatial,
    Consensus,
    RewriterAssisted,
}

/// A candidate gazetteer entry considered for an input, with its computed
/// feature map and score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchAttempt {
    pub input_id: String,
    pub gazetteer_key: String,
    pub method: MatchMethod,
    pub features: HashMap<String, f64>,
    pub score: f64,
    /// Dense rank 1..N within this attempt's candidate set, 1 = best.
    pub tie_rank: u32,
}

impl MatchAttempt {
    pub fn feature(&self, name: &str) -> f64 {
        self.features.get(name).copied().unwrap_or(0.0)
    }
}
