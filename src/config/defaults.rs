//! Configuration default values.
//!
//! Centralises every default so tuning a run means touching one file (or,
//! at runtime, one TOML override) rather than hunting through the engine.

// Database defaults
pub const DEFAULT_DATABASE_URL: &str = "sqlite://./llpg-matcher.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 20;
pub const DEFAULT_MIN_CONNECTIONS: u32 = 10;

// Scorer weight defaults (SPEC_FULL.md §4.4 — the single chosen weight set).
pub const DEFAULT_W_TRG: f64 = 0.45;
pub const DEFAULT_W_EMB: f64 = 0.45;
pub const DEFAULT_W_LOC: f64 = 0.05;
pub const DEFAULT_W_STR: f64 = 0.05;
pub const DEFAULT_W_HN: f64 = 0.08;
pub const DEFAULT_W_HA: f64 = 0.02;
pub const DEFAULT_W_USRN: f64 = 0.04;
pub const DEFAULT_W_LIVE: f64 = 0.03;
pub const DEFAULT_W_LEG: f64 = 0.20;
pub const DEFAULT_MAX_SPATIAL: f64 = 0.10;
pub const DEFAULT_W_DP: f64 = 0.05;
pub const DEFAULT_W_PHON: f64 = 0.03;
pub const DEFAULT_W_HNC: f64 = 0.15;
pub const DEFAULT_W_UNIT: f64 = 0.15;

// House-number conflict gate.
pub const DEFAULT_HOUSE_NUM_CONFLICT_SCORE_FLOOR: f64 = 0.50;
pub const DEFAULT_HOUSE_NUM_CONFLICT_MULTIPLIER: f64 = 0.10;

// Spatial decay.
pub const DEFAULT_SPATIAL_LINEAR_CAP_METRES: f64 = 2000.0;
pub const DEFAULT_SPATIAL_EXPONENTIAL_SCALE_METRES: f64 = 300.0;

// Decider thresholds.
pub const DEFAULT_HIGH_ACCEPT: f64 = 0.92;
pub const DEFAULT_MEDIUM_ACCEPT: f64 = 0.88;
pub const DEFAULT_REVIEW_FLOOR: f64 = 0.80;
pub const DEFAULT_MIN_KEEP: f64 = 0.70;
pub const DEFAULT_WINNER_MARGIN: f64 = 0.03;
pub const DEFAULT_MEDIUM_MARGIN_BONUS: f64 = 0.02;
pub const DEFAULT_MEDIUM_LOCALITY_OVERLAP_FLOOR: f64 = 0.5;

// Candidate generator caps.
pub const DEFAULT_MAX_CANDIDATES: usize = 50;
pub const DEFAULT_TOP_K_TRIGRAM: usize = 200;
pub const DEFAULT_TOP_K_SEMANTIC: usize = 50;
pub const DEFAULT_TOP_K_SPATIAL: usize = 20;
pub const DEFAULT_RADIUS_METRES: f64 = 2000.0;
pub const DEFAULT_MIN_TRIGRAM_SIM: f64 = 0.80;
pub const DEFAULT_TRIGRAM_PHONETIC_BYPASS_SIM: f64 = 0.85;

// Group Consensus Corrector.
pub const DEFAULT_CONSENSUS_MIN_GROUP: usize = 2;
pub const DEFAULT_CONSENSUS_MAX_GROUP: usize = 30;
pub const DEFAULT_CONSENSUS_GOLDEN_MIN_SIBLINGS: usize = 2;
pub const DEFAULT_CONSENSUS_MIN_TRIGRAM_SIM: f64 = 0.6;
pub const DEFAULT_CONSENSUS_CONFIDENCE_LOW: f64 = 0.85;
pub const DEFAULT_CONSENSUS_CONFIDENCE_HIGH: f64 = 0.95;

// Rewriter Gate.
pub const DEFAULT_REWRITER_ENABLED: bool = false;
pub const DEFAULT_REWRITER_TRIGGER_SCORE_MAX: f64 = 0.4;
pub const DEFAULT_REWRITER_ACCEPT_SCORE_MIN: f64 = 0.70;

// Concurrency / batching.
pub const DEFAULT_BATCH_SIZE: usize = 750;
pub const DEFAULT_POOL_WORKERS: usize = 0; // 0 => number of available cores
pub const DEFAULT_QUEUE_CAPACITY: usize = 4;
pub const DEFAULT_MAX_RETRIES: u32 = 5;

// Observability.
pub const DEFAULT_SERVICE_NAME: &str = "llpg-matcher";

pub fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

pub fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

pub fn default_min_connections() -> u32 {
    DEFAULT_MIN_CONNECTIONS
}

pub fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

/// The canonicaliser's data-driven token-expansion table (SPEC_FULL.md §4.1
/// rule 4). Returned as owned pairs so `rules.abbreviations[]` can be
/// overridden wholesale from TOML without touching code.
pub fn default_abbreviations() -> Vec<(String, String)> {
    [
        ("RD", "ROAD"),
        ("ST", "STREET"),
        ("AVE", "AVENUE"),
        ("GDNS", "GARDENS"),
        ("CT", "COURT"),
        ("DR", "DRIVE"),
        ("LN", "LANE"),
        ("PL", "PLACE"),
        ("SQ", "SQUARE"),
        ("CRES", "CRESCENT"),
        ("TER", "TERRACE"),
        ("CL", "CLOSE"),
        ("PK", "PARK"),
        ("EST", "ESTATE"),
        ("IND EST", "INDUSTRIAL ESTATE"),
        ("HANTS", "HAMPSHIRE"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Descriptor phrases that materially change what an address denotes
/// (SPEC_FULL.md §4.1 rule 7).
pub fn default_descriptor_phrases() -> Vec<String> {
    [
        "LAND AT",
        "LAND ADJACENT",
        "REAR OF",
        "ADJACENT TO",
        "PLOT",
        "SITE OF",
        "PART OF",
        "GARAGE AT",
        "PARKING SPACE",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Safe default property-class compatibility allow-list. Pairs are
/// unordered; any family pair absent from this table is treated as
/// incompatible (§9 Open Questions: unknown combinations are unsafe).
pub fn default_blpu_compat() -> Vec<(char, char)> {
    vec![
        ('R', 'R'), // residential / residential
        ('C', 'C'), // commercial / commercial
        ('R', 'C'), // mixed-use residential/commercial parcels
        ('L', 'L'), // land / land
        ('U', 'U'), // unclassified / unclassified
    ]
}

pub fn default_rewriter_patterns() -> Vec<String> {
    vec![
        r"^\d+\s+.*\b(ESTATE|IND EST|INDUSTRIAL ESTATE)\b".to_string(),
        r"^\d+[A-Z]?\s*,?\s*\d".to_string(),
    ]
}
