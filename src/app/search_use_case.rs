use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn, Instrument};

use crate::app::ports::{EventSource, EventStorePort};
use crate::domain::{SearchRequest, SourceKind, WeatherEvent};
use crate::error::SourceError;
use crate::observability::metrics;
use crate::pipeline::{ReconcileResult, Reconciler, SourceOutcome};

const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(45);
const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Use case for finding hail and wind events over a policy's location and
/// period.
///
/// Both sources are queried concurrently and settled independently: a slow
/// or failing source never cancels or blocks the other.
pub struct SearchWeatherEventsUseCase {
    historical: Arc<dyn EventSource>,
    search: Arc<dyn EventSource>,
    reconciler: Reconciler,
    store: Option<Arc<dyn EventStorePort>>,
    source_timeout: Duration,
    store_timeout: Duration,
}

impl SearchWeatherEventsUseCase {
    pub fn new(historical: Arc<dyn EventSource>, search: Arc<dyn EventSource>, reconciler: Reconciler) -> Self {
        Self {
            historical,
            search,
            reconciler,
            store: None,
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Persist reconciled events as a side channel.
    pub fn with_store(mut self, store: Arc<dyn EventStorePort>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = timeout;
        self
    }

    /// Upper bound on the whole persistence pass for one search.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub async fn execute(&self, request: &SearchRequest) -> ReconcileResult {
        let span = tracing::info_span!("search_weather_events", location = %request.location);
        async {
            if !self.reconciler.accepts(request) {
                return ReconcileResult::failed();
            }

            info!(
                "Searching weather events from {} to {}",
                request.effective_date, request.expiration_date
            );

            let (historical, search) = tokio::join!(
                self.fetch(SourceKind::Historical, self.historical.as_ref(), request),
                self.fetch(SourceKind::Search, self.search.as_ref(), request),
            );

            let result = self.reconciler.reconcile(historical, search);
            self.persist(request, &result.events).await;
            result
        }
        .instrument(span)
        .await
    }

    async fn fetch(&self, kind: SourceKind, source: &dyn EventSource, request: &SearchRequest) -> SourceOutcome {
        let started = Instant::now();
        let call = source.search(&request.location, &request.effective_date, &request.expiration_date);

        let outcome = match tokio::time::timeout(self.source_timeout, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(SourceError::Timeout(self.source_timeout.as_secs())),
        };

        metrics::sources::duration(kind.as_str(), started.elapsed().as_secs_f64());
        match &outcome {
            Ok(candidates) => {
                metrics::sources::request_success(kind.as_str(), candidates.len());
                info!(
                    "{} source ({}) returned {} candidates in {}ms",
                    kind,
                    source.name(),
                    candidates.len(),
                    started.elapsed().as_millis()
                );
            }
            Err(e) => {
                info!("{} source ({}) failed: {}", kind, source.name(), e);
            }
        }
        outcome
    }

    async fn persist(&self, request: &SearchRequest, events: &[WeatherEvent]) {
        let Some(store) = &self.store else {
            return;
        };

        let writes = async {
            for event in events {
                match store.save_event(request, event).await {
                    Ok(()) => metrics::store::write_success(),
                    Err(e) => {
                        metrics::store::write_error();
                        warn!("Failed to persist {} event on {}: {}", event.event_type(), event.date(), e);
                    }
                }
            }
        };

        if tokio::time::timeout(self.store_timeout, writes).await.is_err() {
            metrics::store::write_error();
            warn!(
                "Event store did not finish within {}s; remaining writes abandoned",
                self.store_timeout.as_secs()
            );
        }
    }
}
