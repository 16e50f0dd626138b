//! Layered configuration for the matching engine.
//!
//! Loaded from a TOML file with environment-variable overrides (`LLPG_*`),
//! following the donor project's `figment` convention. Rule tables, weights,
//! and thresholds are loaded once at orchestrator start and are immutable
//! for the run (SPEC_FULL.md §9 "Global mutable state").

use std::collections::HashMap;

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};

pub mod defaults;
pub mod duration_serde;

use crate::errors::ConfigError;
use defaults::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
    #[serde(default)]
    pub candidates: CandidatesConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub consensus: ConsensusConfig,
    #[serde(default)]
    pub rewriter: RewriterConfig,
    #[serde(default)]
    pub pool: PoolConfig,
}

impl Config {
    /// Load configuration from `path` (TOML) layered under environment
    /// variables prefixed `LLPG_` (e.g. `LLPG_DATABASE.URL`), mirroring the
    /// donor's figment `Toml` + `Env` provider stack.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("LLPG_").split("__"))
            .extract()
            .map_err(ConfigError::from)
    }

    /// Build a config with no TOML source, just defaults plus env overrides.
    /// Useful for tests and for `cargo run` without a config file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Figment::new()
            .merge(Env::prefixed("LLPG_").split("__"))
            .join(figment::providers::Serialized::defaults(Config::default()))
            .extract()
            .map_err(ConfigError::from)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            observability: ObservabilityConfig::default(),
            weights: WeightsConfig::default(),
            thresholds: ThresholdsConfig::default(),
            candidates: CandidatesConfig::default(),
            rules: RulesConfig::default(),
            consensus: ConsensusConfig::default(),
            rewriter: RewriterConfig::default(),
            pool: PoolConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_open: u32,
    #[serde(default = "default_min_connections")]
    pub max_idle: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_open: default_max_connections(),
            max_idle: default_min_connections(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// OTLP collector endpoint; metrics/traces stay local-only when unset.
    pub otlp_endpoint: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            otlp_endpoint: None,
        }
    }
}

/// Per-feature scorer weights (SPEC_FULL.md §4.4). The core treats these as
/// opaque coefficients; re-tuning means a new run with a new config and a
/// new run label, never a live mutation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeightsConfig {
    pub w_trg: f64,
    pub w_emb: f64,
    pub w_loc: f64,
    pub w_str: f64,
    pub w_hn: f64,
    pub w_ha: f64,
    pub w_usrn: f64,
    pub w_live: f64,
    pub w_leg: f64,
    pub max_spatial: f64,
    pub w_dp: f64,
    pub w_phon: f64,
    pub w_hnc: f64,
    pub w_unit: f64,
    #[serde(default = "default_house_num_conflict_score_floor")]
    pub house_num_conflict_score_floor: f64,
    #[serde(default = "default_house_num_conflict_multiplier")]
    pub house_num_conflict_multiplier: f64,
}

fn default_house_num_conflict_score_floor() -> f64 {
    DEFAULT_HOUSE_NUM_CONFLICT_SCORE_FLOOR
}

fn default_house_num_conflict_multiplier() -> f64 {
    DEFAULT_HOUSE_NUM_CONFLICT_MULTIPLIER
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            w_trg: DEFAULT_W_TRG,
            w_emb: DEFAULT_W_EMB,
            w_loc: DEFAULT_W_LOC,
            w_str: DEFAULT_W_STR,
            w_hn: DEFAULT_W_HN,
            w_ha: DEFAULT_W_HA,
            w_usrn: DEFAULT_W_USRN,
            w_live: DEFAULT_W_LIVE,
            w_leg: DEFAULT_W_LEG,
            max_spatial: DEFAULT_MAX_SPATIAL,
            w_dp: DEFAULT_W_DP,
            w_phon: DEFAULT_W_PHON,
            w_hnc: DEFAULT_W_HNC,
            w_unit: DEFAULT_W_UNIT,
            house_num_conflict_score_floor: DEFAULT_HOUSE_NUM_CONFLICT_SCORE_FLOOR,
            house_num_conflict_multiplier: DEFAULT_HOUSE_NUM_CONFLICT_MULTIPLIER,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    pub high_accept: f64,
    pub medium_accept: f64,
    pub review_floor: f64,
    pub min_keep: f64,
    pub winner_margin: f64,
    #[serde(default = "default_medium_margin_bonus")]
    pub medium_margin_bonus: f64,
    #[serde(default = "default_medium_locality_overlap_floor")]
    pub medium_locality_overlap_floor: f64,
}

fn default_medium_margin_bonus() -> f64 {
    DEFAULT_MEDIUM_MARGIN_BONUS
}

fn default_medium_locality_overlap_floor() -> f64 {
    DEFAULT_MEDIUM_LOCALITY_OVERLAP_FLOOR
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            high_accept: DEFAULT_HIGH_ACCEPT,
            medium_accept: DEFAULT_MEDIUM_ACCEPT,
            review_floor: DEFAULT_REVIEW_FLOOR,
            min_keep: DEFAULT_MIN_KEEP,
            winner_margin: DEFAULT_WINNER_MARGIN,
            medium_margin_bonus: DEFAULT_MEDIUM_MARGIN_BONUS,
            medium_locality_overlap_floor: DEFAULT_MEDIUM_LOCALITY_OVERLAP_FLOOR,
        }
    }
}

/// Spatial-boost decay shape. Both are implemented; linear is the default
/// per SPEC_FULL.md §9 Open Questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpatialDecay {
    Linear,
    Exponential,
}

impl Default for SpatialDecay {
    fn default() -> Self {
        Self::Linear
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatesConfig {
    pub max_candidates: usize,
    pub top_k_trigram: usize,
    pub top_k_semantic: usize,
    pub top_k_spatial: usize,
    pub radius_metres: f64,
    pub min_trigram_sim: f64,
    #[serde(default)]
    pub spatial_decay: SpatialDecay,
    #[serde(default = "default_spatial_linear_cap")]
    pub spatial_linear_cap_metres: f64,
    #[serde(default = "default_spatial_exponential_scale")]
    pub spatial_exponential_scale_metres: f64,
    #[serde(default = "default_trigram_phonetic_bypass_sim")]
    pub trigram_phonetic_bypass_sim: f64,
}

fn default_spatial_linear_cap() -> f64 {
    DEFAULT_SPATIAL_LINEAR_CAP_METRES
}

fn default_spatial_exponential_scale() -> f64 {
    DEFAULT_SPATIAL_EXPONENTIAL_SCALE_METRES
}

fn default_trigram_phonetic_bypass_sim() -> f64 {
    DEFAULT_TRIGRAM_PHONETIC_BYPASS_SIM
}

impl Default for CandidatesConfig {
    fn default() -> Self {
        Self {
            max_candidates: DEFAULT_MAX_CANDIDATES,
            top_k_trigram: DEFAULT_TOP_K_TRIGRAM,
            top_k_semantic: DEFAULT_TOP_K_SEMANTIC,
            top_k_spatial: DEFAULT_TOP_K_SPATIAL,
            radius_metres: DEFAULT_RADIUS_METRES,
            min_trigram_sim: DEFAULT_MIN_TRIGRAM_SIM,
            spatial_decay: SpatialDecay::default(),
            spatial_linear_cap_metres: DEFAULT_SPATIAL_LINEAR_CAP_METRES,
            spatial_exponential_scale_metres: DEFAULT_SPATIAL_EXPONENTIAL_SCALE_METRES,
            trigram_phonetic_bypass_sim: DEFAULT_TRIGRAM_PHONETIC_BYPASS_SIM,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Canonicaliser token-expansion table (`RD` -> `ROAD`, etc.).
    #[serde(default = "default_abbreviations_map")]
    pub abbreviations: HashMap<String, String>,
    #[serde(default = "default_descriptor_phrases")]
    pub descriptor_phrases: Vec<String>,
    /// Compatible property-class family pairs; anything absent is
    /// incompatible (safe default, see SPEC_FULL.md §9).
    #[serde(default = "default_blpu_compat")]
    pub blpu_compat: Vec<(char, char)>,
}

fn default_abbreviations_map() -> HashMap<String, String> {
    default_abbreviations().into_iter().collect()
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            abbreviations: default_abbreviations_map(),
            descriptor_phrases: default_descriptor_phrases(),
            blpu_compat: default_blpu_compat(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConsensusConfig {
    pub min_group: usize,
    pub max_group: usize,
    pub golden_min_siblings: usize,
    #[serde(default = "default_consensus_min_trigram_sim")]
    pub min_trigram_sim: f64,
    #[serde(default = "default_consensus_confidence_low")]
    pub confidence_low: f64,
    #[serde(default = "default_consensus_confidence_high")]
    pub confidence_high: f64,
}

fn default_consensus_min_trigram_sim() -> f64 {
    DEFAULT_CONSENSUS_MIN_TRIGRAM_SIM
}
fn default_consensus_confidence_low() -> f64 {
    DEFAULT_CONSENSUS_CONFIDENCE_LOW
}
fn default_consensus_confidence_high() -> f64 {
    DEFAULT_CONSENSUS_CONFIDENCE_HIGH
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            min_group: DEFAULT_CONSENSUS_MIN_GROUP,
            max_group: DEFAULT_CONSENSUS_MAX_GROUP,
            golden_min_siblings: DEFAULT_CONSENSUS_GOLDEN_MIN_SIBLINGS,
            min_trigram_sim: DEFAULT_CONSENSUS_MIN_TRIGRAM_SIM,
            confidence_low: DEFAULT_CONSENSUS_CONFIDENCE_LOW,
            confidence_high: DEFAULT_CONSENSUS_CONFIDENCE_HIGH,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriterConfig {
    pub enabled: bool,
    pub trigger_score_max: f64,
    #[serde(default = "default_rewriter_accept_score_min")]
    pub accept_score_min: f64,
    #[serde(default = "default_rewriter_patterns")]
    pub patterns: Vec<String>,
}

fn default_rewriter_accept_score_min() -> f64 {
    DEFAULT_REWRITER_ACCEPT_SCORE_MIN
}

impl Default for RewriterConfig {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_REWRITER_ENABLED,
            trigger_score_max: DEFAULT_REWRITER_TRIGGER_SCORE_MAX,
            accept_score_min: DEFAULT_REWRITER_ACCEPT_SCORE_MIN,
            patterns: default_rewriter_patterns(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Worker count; 0 means "use available parallelism".
    pub workers: usize,
    pub batch_size: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}
fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_POOL_WORKERS,
            batch_size: DEFAULT_BATCH_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl PoolConfig {
    pub fn resolved_workers(&self) -> usize {
        if self.workers == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.workers
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).expect("serialise");
        let reparsed: Config = toml::from_str(&toml_str).expect("deserialise");
        assert_eq!(reparsed.thresholds.high_accept, config.thresholds.high_accept);
        assert_eq!(reparsed.weights.w_trg, config.weights.w_trg);
    }

    #[test]
    fn blpu_compat_defaults_are_conservative() {
        let rules = RulesConfig::default();
        assert!(rules.blpu_compat.contains(&('R', 'R')));
        assert!(!rules.blpu_compat.iter().any(|(a, b)| *a == 'X' || *b == 'X'));
    }

    #[test]
    fn spatial_decay_defaults_to_linear() {
        assert_eq!(CandidatesConfig::default().spatial_decay, SpatialDecay::Linear);
    }
}
