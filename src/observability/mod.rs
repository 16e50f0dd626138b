//! Structured logging and metrics for the matching engine, mirroring the
//! donor's `AppObservability` instrument-building pattern but scoped to the
//! run-summary metrics named in SPEC_FULL.md §4.8 responsibility 5 and §10.3:
//! per-method decision counts, score distribution, tier timing, DB query
//! counts/durations, batch retry counts, and external-call latency/failure.

use anyhow::Result;
use opentelemetry::{
    KeyValue,
    global,
    metrics::{Counter, Histogram, Meter, MeterProvider},
};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use tracing::info;

use crate::domain::{Decision, MatchMethod};

/// Pre-built metric instruments for one matching run. Constructed once at
/// orchestrator start (SPEC_FULL.md §9 "Global mutable state" applies to the
/// instrument set too — it is never rebuilt mid-run).
#[derive(Clone)]
pub struct AppObservability {
    pub meter: Meter,

    pub decisions_total: Counter<u64>,
    pub score_distribution: Histogram<f64>,
    pub tier_duration: Histogram<f64>,

    pub db_queries: Counter<u64>,
    pub db_query_duration: Histogram<f64>,
    pub batch_retries: Counter<u64>,
    pub batches_failed: Counter<u64>,

    pub external_call_duration: Histogram<f64>,
    pub external_call_failures: Counter<u64>,

    pub sentinels_created: Counter<u64>,
    pub consensus_propagations: Counter<u64>,
    pub rewriter_acceptances: Counter<u64>,
}

impl AppObservability {
    /// Initialise observability based on the configured service name. When
    /// `otlp_endpoint` is set, logs that OTLP export would be wired there;
    /// metrics are always recorded locally on the returned instruments
    /// regardless of exporter configuration.
    pub fn new(service_name: &str, otlp_endpoint: Option<&str>) -> Result<Self> {
        let provider = SdkMeterProvider::builder().build();
        global::set_meter_provider(provider.clone());
        let meter = provider.meter(service_name.to_string());

        match otlp_endpoint {
            Some(endpoint) => info!("observability configured: OTLP export to {}", endpoint),
            None => info!("observability configured: local instruments only (no OTLP endpoint set)"),
        }

        Ok(Self::build_with_instruments(meter))
    }

    fn build_with_instruments(meter: Meter) -> Self {
        let decisions_total = meter
            .u64_counter("llpg_decisions_total")
            .with_description("Match decisions by decision and method")
            .build();
        let score_distribution = meter
            .f64_histogram("llpg_match_score")
            .with_description("Final score of every MatchResult")
            .build();
        let tier_duration = meter
            .f64_histogram("llpg_tier_duration_seconds")
            .with_description("Wall-clock time spent per pipeline tier")
            .build();

        let db_queries = meter
            .u64_counter("llpg_db_queries_total")
            .with_description("Store queries issued")
            .build();
        let db_query_duration = meter
            .f64_histogram("llpg_db_query_duration_seconds")
            .with_description("Store query duration")
            .build();
        let batch_retries = meter
            .u64_counter("llpg_batch_retries_total")
            .with_description("Batch commit retries after a transient failure")
            .build();
        let batches_failed = meter
            .u64_counter("llpg_batches_failed_total")
            .with_description("Batches that exhausted their retry budget")
            .build();

        let external_call_duration = meter
            .f64_histogram("llpg_external_call_duration_seconds")
            .with_description("Embedder/Rewriter call latency")
            .build();
        let external_call_failures = meter
            .u64_counter("llpg_external_call_failures_total")
            .with_description("Embedder/Rewriter calls that failed after retries")
            .build();

        let sentinels_created = meter
            .u64_counter("llpg_sentinels_created_total")
            .with_description("Historic-reference sentinel entries inserted")
            .build();
        let consensus_propagations = meter
            .u64_counter("llpg_consensus_propagations_total")
            .with_description("Group consensus auto-accepts")
            .build();
        let rewriter_acceptances = meter
            .u64_counter("llpg_rewriter_acceptances_total")
            .with_description("Rewriter gate acceptances")
            .build();

        Self {
            meter,
            decisions_total,
            score_distribution,
            tier_duration,
            db_queries,
            db_query_duration,
            batch_retries,
            batches_failed,
            external_call_duration,
            external_call_failures,
            sentinels_created,
            consensus_propagations,
            rewriter_acceptances,
        }
    }

    /// Record one `MatchResult`'s outcome against the decision/method/score
    /// instruments. Called once per input at the end of its pipeline pass.
    pub fn record_decision(&self, decision: Decision, method: Option<MatchMethod>, score: f64) {
        let decision_label = match decision {
            Decision::AutoAccept => "autoAccept",
            Decision::Review => "review",
            Decision::Reject => "reject",
        };
        let method_label = method.map(|m| m.to_string()).unwrap_or_else(|| "none".to_string());
        let attributes = [KeyValue::new("decision", decision_label), KeyValue::new("method", method_label)];
        self.decisions_total.add(1, &attributes);
        self.score_distribution.record(score, &attributes);
    }

    pub fn record_tier_duration(&self, tier: &'static str, seconds: f64) {
        self.tier_duration.record(seconds, &[KeyValue::new("tier", tier)]);
    }

    pub fn record_db_query(&self, operation: &'static str, seconds: f64) {
        self.db_queries.add(1, &[KeyValue::new("operation", operation)]);
        self.db_query_duration.record(seconds, &[KeyValue::new("operation", operation)]);
    }

    pub fn record_external_call(&self, service: &'static str, seconds: f64, failed: bool) {
        self.external_call_duration.record(seconds, &[KeyValue::new("service", service)]);
        if failed {
            self.external_call_failures.add(1, &[KeyValue::new("service", service)]);
        }
    }
}

/// Summary of one orchestrator run, both logged structurally and mirrored
/// onto the instruments above (SPEC_FULL.md §4.8 responsibility 5).
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub run_label: String,
    pub total_inputs: usize,
    pub auto_accept: usize,
    pub review: usize,
    pub reject: usize,
    pub sentinels_created: usize,
    pub consensus_propagations: usize,
    pub rewriter_acceptances: usize,
    pub batches_failed: usize,
    pub elapsed_seconds: f64,
}

impl RunSummary {
    pub fn auto_accept_fraction(&self) -> f64 {
        if self.total_inputs == 0 {
            0.0
        } else {
            self.auto_accept as f64 / self.total_inputs as f64
        }
    }

    pub fn log(&self) {
        info!(
            run_label = %self.run_label,
            total_inputs = self.total_inputs,
            auto_accept = self.auto_accept,
            review = self.review,
            reject = self.reject,
            auto_accept_fraction = self.auto_accept_fraction(),
            sentinels_created = self.sentinels_created,
            consensus_propagations = self.consensus_propagations,
            rewriter_acceptances = self.rewriter_acceptances,
            batches_failed = self.batches_failed,
            elapsed_seconds = self.elapsed_seconds,
            "run summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_accept_fraction_handles_empty_run() {
        let summary = RunSummary::default();
        assert_eq!(summary.auto_accept_fraction(), 0.0);
    }

    #[test]
    fn auto_accept_fraction_computes_ratio() {
        let summary = RunSummary { total_inputs: 4, auto_accept: 3, ..Default::default() };
        assert!((summary.auto_accept_fraction() - 0.75).abs() < 1e-9);
    }
}
