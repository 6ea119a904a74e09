//! Metrics for the policy weather analyzer
//!
//! Recording goes through the `metrics` facade, so calls are no-ops until a
//! recorder is installed with [`init`]. Names follow Prometheus conventions.

use std::fmt;
use std::sync::OnceLock;
use tracing::info;

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Sources metrics
    SourcesRequestsSuccess,
    SourcesRequestsFailed,
    SourcesRequestDuration,
    SourcesCandidatesReturned,

    // Normalize metrics
    NormalizeCandidatesRejected,
    NormalizeCandidatesAccepted,
    NormalizeBatchesProcessed,

    // Reconcile metrics
    ReconcileRuns,
    ReconcileEventsReturned,
    ReconcileDuplicatesRemoved,
    ReconcileRequestsRejected,

    // Store metrics
    StoreWritesSuccess,
    StoreWritesError,

    // Extraction metrics
    ExtractRequestsSuccess,
    ExtractRequestsError,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::SourcesRequestsSuccess => "pw_sources_requests_success_total",
            MetricName::SourcesRequestsFailed => "pw_sources_requests_failed_total",
            MetricName::SourcesRequestDuration => "pw_sources_request_duration_seconds",
            MetricName::SourcesCandidatesReturned => "pw_sources_candidates_returned_total",

            MetricName::NormalizeCandidatesRejected => "pw_normalize_candidates_rejected_total",
            MetricName::NormalizeCandidatesAccepted => "pw_normalize_candidates_accepted_total",
            MetricName::NormalizeBatchesProcessed => "pw_normalize_batches_processed_total",

            MetricName::ReconcileRuns => "pw_reconcile_runs_total",
            MetricName::ReconcileEventsReturned => "pw_reconcile_events_returned",
            MetricName::ReconcileDuplicatesRemoved => "pw_reconcile_duplicates_removed_total",
            MetricName::ReconcileRequestsRejected => "pw_reconcile_requests_rejected_total",

            MetricName::StoreWritesSuccess => "pw_store_writes_success_total",
            MetricName::StoreWritesError => "pw_store_writes_error_total",

            MetricName::ExtractRequestsSuccess => "pw_extract_requests_success_total",
            MetricName::ExtractRequestsError => "pw_extract_requests_error_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static METRICS_HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Safe to call more than once.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }
    let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    METRICS_HANDLE.set(handle).ok();
    info!("Metrics system initialized");
    Ok(())
}

/// Current metrics in Prometheus exposition format, if initialized.
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

// ============================================================================
// Sources Metrics
// ============================================================================

pub mod sources {
    use super::MetricName;

    pub fn request_success(source: &'static str, candidates: usize) {
        ::metrics::counter!(MetricName::SourcesRequestsSuccess.as_str(), "source" => source).increment(1);
        ::metrics::counter!(MetricName::SourcesCandidatesReturned.as_str(), "source" => source)
            .increment(candidates as u64);
    }

    pub fn failed(source: &'static str) {
        ::metrics::counter!(MetricName::SourcesRequestsFailed.as_str(), "source" => source).increment(1);
    }

    pub fn duration(source: &'static str, secs: f64) {
        ::metrics::histogram!(MetricName::SourcesRequestDuration.as_str(), "source" => source).record(secs);
    }
}

// ============================================================================
// Normalize Metrics
// ============================================================================

pub mod normalize {
    use super::MetricName;

    pub fn candidate_rejected(source: &'static str, rule: &'static str) {
        ::metrics::counter!(
            MetricName::NormalizeCandidatesRejected.as_str(),
            "source" => source,
            "rule" => rule
        )
        .increment(1);
    }

    pub fn batch_processed(source: &'static str, total: usize, accepted: usize) {
        ::metrics::counter!(MetricName::NormalizeBatchesProcessed.as_str(), "source" => source).increment(1);
        ::metrics::counter!(MetricName::NormalizeCandidatesAccepted.as_str(), "source" => source)
            .increment(accepted.min(total) as u64);
    }
}

// ============================================================================
// Reconcile Metrics
// ============================================================================

pub mod reconcile {
    use super::MetricName;

    pub fn completed(events: usize, duplicates_removed: usize) {
        ::metrics::counter!(MetricName::ReconcileRuns.as_str()).increment(1);
        ::metrics::histogram!(MetricName::ReconcileEventsReturned.as_str()).record(events as f64);
        ::metrics::counter!(MetricName::ReconcileDuplicatesRemoved.as_str()).increment(duplicates_removed as u64);
    }

    pub fn rejected_request() {
        ::metrics::counter!(MetricName::ReconcileRequestsRejected.as_str()).increment(1);
    }
}

// ============================================================================
// Store Metrics
// ============================================================================

pub mod store {
    use super::MetricName;

    pub fn write_success() {
        ::metrics::counter!(MetricName::StoreWritesSuccess.as_str()).increment(1);
    }

    pub fn write_error() {
        ::metrics::counter!(MetricName::StoreWritesError.as_str()).increment(1);
    }
}

// ============================================================================
// Extraction Metrics
// ============================================================================

pub mod extract {
    use super::MetricName;

    pub fn success(kind: &'static str) {
        ::metrics::counter!(MetricName::ExtractRequestsSuccess.as_str(), "kind" => kind).increment(1);
    }

    pub fn error(kind: &'static str) {
        ::metrics::counter!(MetricName::ExtractRequestsError.as_str(), "kind" => kind).increment(1);
    }
}
