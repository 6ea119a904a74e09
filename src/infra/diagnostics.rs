use tracing::warn;

use crate::app::ports::DiagnosticSink;
use crate::domain::{RawEventCandidate, SourceKind};
use crate::error::SourceError;
use crate::observability::metrics;
use crate::pipeline::processing::normalize::RejectReason;

/// Diagnostic sink that reports through `tracing` and the metrics facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn candidate_rejected(&self, source: SourceKind, reason: &RejectReason, candidate: &RawEventCandidate) {
        metrics::normalize::candidate_rejected(source.as_str(), reason.rule());
        warn!(
            source = %source,
            rule = reason.rule(),
            candidate = %candidate,
            "Dropped weather event candidate: {}",
            reason
        );
    }

    fn source_failed(&self, source: SourceKind, error: &SourceError) {
        metrics::sources::failed(source.as_str());
        warn!(source = %source, "Event source contributed no events: {}", error);
    }

    fn invalid_request(&self, missing_fields: &[&'static str]) {
        metrics::reconcile::rejected_request();
        warn!("Missing required parameters: {}", missing_fields.join(", "));
    }
}
