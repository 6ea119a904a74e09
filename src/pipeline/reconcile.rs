use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::app::ports::DiagnosticSink;
use crate::domain::{RawEventCandidate, SearchRequest, SourceKind, WeatherEvent};
use crate::error::SourceError;
use crate::infra::diagnostics::TracingDiagnostics;
use crate::observability::metrics;
use crate::pipeline::processing::{dedupe, sort_most_recent_first, Normalizer};

/// What one event source produced: raw candidates, or why it produced none.
pub type SourceOutcome = Result<Vec<RawEventCandidate>, SourceError>;

/// Final answer handed to the presentation layer.
///
/// `success: false` only when the reconciliation could not run at all; an
/// empty `events` list with `success: true` means nothing was found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileResult {
    pub success: bool,
    pub events: Vec<WeatherEvent>,
}

impl ReconcileResult {
    pub fn failed() -> Self {
        Self {
            success: false,
            events: Vec::new(),
        }
    }
}

/// Combines historical and search results into one clean event list.
///
/// Stateless: every call is a pure function of its two outcomes apart from
/// diagnostics. Source failures degrade to an empty contribution.
#[derive(Clone)]
pub struct Reconciler {
    normalizer: Normalizer,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(Arc::new(TracingDiagnostics))
    }
}

impl Reconciler {
    pub fn new(diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            normalizer: Normalizer::new(diagnostics.clone()),
            diagnostics,
        }
    }

    /// Check the invocation parameters; reports missing ones as a diagnostic.
    pub fn accepts(&self, request: &SearchRequest) -> bool {
        let missing = request.missing_fields();
        if missing.is_empty() {
            true
        } else {
            self.diagnostics.invalid_request(&missing);
            false
        }
    }

    /// Reconcile on behalf of a request, failing only if the request itself
    /// is unusable.
    pub fn reconcile_request(
        &self,
        request: &SearchRequest,
        historical: SourceOutcome,
        search: SourceOutcome,
    ) -> ReconcileResult {
        if !self.accepts(request) {
            return ReconcileResult::failed();
        }
        self.reconcile(historical, search)
    }

    /// Normalize each source, deduplicate with historical records taking
    /// priority, and order most recent first.
    pub fn reconcile(&self, historical: SourceOutcome, search: SourceOutcome) -> ReconcileResult {
        let historical_events = self.contribution(SourceKind::Historical, historical);
        let search_events = self.contribution(SourceKind::Search, search);

        let candidate_count = historical_events.len() + search_events.len();
        let deduplicated = dedupe([historical_events, search_events]);
        let dropped = candidate_count - deduplicated.len();
        if dropped > 0 {
            debug!("Dropped {} duplicate events", dropped);
        }

        let events = sort_most_recent_first(deduplicated);

        metrics::reconcile::completed(events.len(), dropped);
        info!("Reconciled {} events ({} duplicates removed)", events.len(), dropped);

        ReconcileResult { success: true, events }
    }

    fn contribution(&self, source: SourceKind, outcome: SourceOutcome) -> Vec<WeatherEvent> {
        match outcome {
            Ok(candidates) => {
                let events = self.normalizer.normalize_all(source, &candidates);
                metrics::normalize::batch_processed(source.as_str(), candidates.len(), events.len());
                debug!(
                    "{} source: {}/{} candidates passed normalization",
                    source,
                    events.len(),
                    candidates.len()
                );
                events
            }
            Err(error) => {
                self.diagnostics.source_failed(source, &error);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::testing::RecordingDiagnostics;
    use crate::domain::EventType;
    use serde_json::json;

    fn reconciler() -> (Reconciler, Arc<RecordingDiagnostics>) {
        let diagnostics = Arc::new(RecordingDiagnostics::default());
        (Reconciler::new(diagnostics.clone()), diagnostics)
    }

    #[test]
    fn test_historical_wins_shared_key() {
        let (reconciler, _) = reconciler();
        let result = reconciler.reconcile(
            Ok(vec![json!({"date": "2024-04-09", "type": "hail", "details": "1in hail", "source": "NOAA"})]),
            Ok(vec![json!({"date": "2024-04-09", "type": "hail", "details": "golf ball hail", "source": "AI"})]),
        );

        assert!(result.success);
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.events[0].details(), "1in hail");
        assert_eq!(result.events[0].source(), Some("NOAA"));
    }

    #[test]
    fn test_search_only_event_passes_through() {
        let (reconciler, _) = reconciler();
        let result = reconciler.reconcile(
            Ok(vec![]),
            Ok(vec![json!({"date": "2023-07-22", "type": "wind", "details": "45mph gust"})]),
        );

        assert!(result.success);
        assert_eq!(result.events.len(), 1);
        let event = &result.events[0];
        assert_eq!(event.date().to_string(), "2023-07-22");
        assert_eq!(event.event_type(), EventType::Wind);
        assert_eq!(event.details(), "45mph gust");
        assert_eq!(event.source(), None);
    }

    #[test]
    fn test_invalid_candidates_are_dropped() {
        let (reconciler, diagnostics) = reconciler();
        let result = reconciler.reconcile(
            Ok(vec![json!({"date": "2024-13-40", "type": "hail", "details": "x"})]),
            Ok(vec![json!({"date": "2024-04-09", "type": "hurricane", "details": "x"})]),
        );

        assert!(result.success);
        assert!(result.events.is_empty());
        assert_eq!(
            diagnostics.rejected_rules(),
            vec![
                (SourceKind::Historical, "invalid_calendar_date"),
                (SourceKind::Search, "unsupported_type"),
            ]
        );
    }

    #[test]
    fn test_disjoint_sources_merge_and_sort() {
        let (reconciler, _) = reconciler();
        let result = reconciler.reconcile(
            Ok(vec![
                json!({"date": "2023-05-10", "type": "hail", "details": "a"}),
                json!({"date": "2024-03-02", "type": "hail", "details": "b"}),
            ]),
            Ok(vec![json!({"date": "2023-11-19", "type": "hail", "details": "c"})]),
        );

        let dates: Vec<_> = result.events.iter().map(|e| e.date().to_string()).collect();
        assert_eq!(dates, vec!["2024-03-02", "2023-11-19", "2023-05-10"]);
    }

    #[test]
    fn test_search_failure_keeps_historical_events() {
        let (reconciler, diagnostics) = reconciler();
        let result = reconciler.reconcile(
            Ok(vec![
                json!({"date": "2024-04-09", "type": "hail", "details": "a"}),
                json!({"date": "2024-04-10", "type": "wind", "details": "b"}),
                json!({"date": "2024-04-11", "type": "hail", "details": "c"}),
            ]),
            Err(SourceError::Timeout(30)),
        );

        assert!(result.success);
        assert_eq!(result.events.len(), 3);
        assert_eq!(diagnostics.failed_sources(), vec![SourceKind::Search]);
    }

    #[test]
    fn test_total_source_failure_is_still_success() {
        let (reconciler, diagnostics) = reconciler();
        let result = reconciler.reconcile(
            Err(SourceError::Transport("connection reset".into())),
            Err(SourceError::Timeout(30)),
        );

        assert_eq!(result, ReconcileResult { success: true, events: vec![] });
        assert_eq!(
            diagnostics.failed_sources(),
            vec![SourceKind::Historical, SourceKind::Search]
        );
    }

    #[test]
    fn test_same_date_different_types_both_kept() {
        let (reconciler, _) = reconciler();
        let result = reconciler.reconcile(
            Ok(vec![json!({"date": "2024-06-01", "type": "hail", "details": "hail"})]),
            Ok(vec![json!({"date": "2024-06-01", "type": "wind", "details": "wind"})]),
        );

        assert_eq!(result.events.len(), 2);
        assert_eq!(result.events[0].event_type(), EventType::Hail);
        assert_eq!(result.events[1].event_type(), EventType::Wind);
    }

    #[test]
    fn test_same_day_ties_keep_historical_first() {
        let (reconciler, _) = reconciler();
        let result = reconciler.reconcile(
            Ok(vec![json!({"date": "2024-06-01", "type": "wind", "details": "historical"})]),
            Ok(vec![
                json!({"date": "2024-06-01", "type": "hail", "details": "search"}),
                json!({"date": "2024-07-01", "type": "hail", "details": "newest"}),
            ]),
        );

        let details: Vec<_> = result.events.iter().map(|e| e.details()).collect();
        assert_eq!(details, vec!["newest", "historical", "search"]);
    }

    #[test]
    fn test_invalid_request_reports_failure() {
        let (reconciler, diagnostics) = reconciler();
        let request = SearchRequest::new("", "04/01/2024", "04/01/2025");

        let result = reconciler.reconcile_request(
            &request,
            Ok(vec![json!({"date": "2024-04-09", "type": "hail", "details": "a"})]),
            Ok(vec![]),
        );

        assert_eq!(result, ReconcileResult::failed());
        assert_eq!(*diagnostics.invalid.lock().unwrap(), vec![vec!["location"]]);
    }

    #[test]
    fn test_result_wire_shape() {
        let (reconciler, _) = reconciler();
        let result = reconciler.reconcile(
            Ok(vec![json!({"date": "2024-04-09", "type": "hail", "details": "1in hail", "source": "NOAA"})]),
            Err(SourceError::Status(500)),
        );

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "success": true,
                "events": [{"date": "2024-04-09", "type": "hail", "details": "1in hail", "source": "NOAA"}]
            })
        );
    }
}
