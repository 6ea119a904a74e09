use async_trait::async_trait;

use crate::domain::{PolicyDetails, RawEventCandidate, SearchRequest, SourceKind, WeatherEvent};
use crate::error::SourceError;
use crate::pipeline::processing::normalize::RejectReason;

/// A provider of candidate weather events for a location and date range.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    async fn search(
        &self,
        location: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<RawEventCandidate>, SourceError>;
}

/// What a declaration-page image is being read for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionKind {
    Coverages,
    Deductibles,
}

impl ExtractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionKind::Coverages => "coverages",
            ExtractionKind::Deductibles => "deductibles",
        }
    }
}

/// Turns one document image into the policy fields it shows.
#[async_trait]
pub trait CoverageExtractor: Send + Sync {
    async fn extract(&self, image_data_url: &str, kind: ExtractionKind) -> anyhow::Result<PolicyDetails>;
}

/// Best-effort sink for reconciled events.
#[async_trait]
pub trait EventStorePort: Send + Sync {
    async fn save_event(&self, request: &SearchRequest, event: &WeatherEvent) -> anyhow::Result<()>;
}

/// Observability hook for problems the reconciliation absorbs.
pub trait DiagnosticSink: Send + Sync {
    fn candidate_rejected(&self, source: SourceKind, reason: &RejectReason, candidate: &RawEventCandidate);

    fn source_failed(&self, source: SourceKind, error: &SourceError);

    fn invalid_request(&self, missing_fields: &[&'static str]);
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Captures diagnostics so tests can assert on them.
    #[derive(Default)]
    pub struct RecordingDiagnostics {
        pub rejected: Mutex<Vec<(SourceKind, RejectReason)>>,
        pub failed: Mutex<Vec<(SourceKind, SourceError)>>,
        pub invalid: Mutex<Vec<Vec<&'static str>>>,
    }

    impl RecordingDiagnostics {
        pub fn rejected_rules(&self) -> Vec<(SourceKind, &'static str)> {
            self.rejected
                .lock()
                .unwrap()
                .iter()
                .map(|(source, reason)| (*source, reason.rule()))
                .collect()
        }

        pub fn failed_sources(&self) -> Vec<SourceKind> {
            self.failed.lock().unwrap().iter().map(|(source, _)| *source).collect()
        }
    }

    impl DiagnosticSink for RecordingDiagnostics {
        fn candidate_rejected(&self, source: SourceKind, reason: &RejectReason, _candidate: &RawEventCandidate) {
            self.rejected.lock().unwrap().push((source, reason.clone()));
        }

        fn source_failed(&self, source: SourceKind, error: &SourceError) {
            self.failed.lock().unwrap().push((source, error.clone()));
        }

        fn invalid_request(&self, missing_fields: &[&'static str]) {
            self.invalid.lock().unwrap().push(missing_fields.to_vec());
        }
    }
}
