use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::match_attempt::MatchMethod;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Decision {
    AutoAccept,
    Review,
    Reject,
}

/// The final decision for an input within a run.
///
/// Invariant: `autoAccept` requires `gazetteer_key` to be `Some` and a score
/// that satisfies either the high-tier or medium-tier acceptance rule; the
/// Decider is the only place that constructs an `AutoAccept` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub input_id: String,
    pub decision: Decision,
    pub gazetteer_key: Option<String>,
    pub method: Option<MatchMethod>,
    pub score: f64,
    pub reason: String,
    pub run_label: String,
    pub ts: DateTime<Utc>,
}

impl MatchResult {
    pub fn reject(input_id: impl Into<String>, run_label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            input_id: input_id.into(),
            decision: Decision::Reject,
            gazetteer_key: None,
            method: None,
            score: 0.0,
            reason: reason.into(),
            run_label: run_label.into(),
            ts: Utc::now(),
        }
    }

    pub fn review(
        input_id: impl Into<String>,
        run_label: impl Into<String>,
        score: f64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            input_id: input_id.into(),
            decision: Decision::Review,
            gazetteer_key: None,
            method: None,
            score,
            reason: reason.into(),
            run_label: run_label.into(),
            ts: Utc::now(),
        }
    }

    pub fn auto_accept(
        input_id: impl Into<String>,
        run_label: impl Into<String>,
        gazetteer_key: impl Into<String>,
        method: MatchMethod,
        score: f64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            input_id: input_id.into(),
            decision: Decision::AutoAccept,
            gazetteer_key: Some(gazetteer_key.into()),
            method: Some(method),
            score,
            reason: reason.into(),
            run_label: run_label.into(),
            ts: Utc::now(),
        }
    }

    pub fn is_auto_accept(&self) -> bool {
        self.decision == Decision::AutoAccept
    }
}
