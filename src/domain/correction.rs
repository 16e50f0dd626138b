use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The component responsible for a correction: the symmetric-delete spell
/// corrector, the external rewriter, or the group consensus corrector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CorrectionAgent {
    Speller,
    Rewriter,
    Consensus,
}

/// Append-only audit record of a rewrite or consensus override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionNote {
    pub input_id: String,
    pub before_canonical: String,
    pub after_canonical: String,
    pub agent: CorrectionAgent,
    pub confidence: f64,
    pub validation: Value,
    pub ts: DateTime<Utc>,
}

impl CorrectionNote {
    pub fn new(
        input_id: impl Into<String>,
        before_canonical: impl Into<String>,
        after_canonical: impl Into<String>,
        agent: CorrectionAgent,
        confidence: f64,
        validation: Value,
    ) -> Self {
        Self {
            input_id: input_id.into(),
            before_canonical: before_canonical.into(),
            after_canonical: after_canonical.into(),
            agent,
            confidence,
            validation,
            ts: Utc::now(),
        }
    }
}
