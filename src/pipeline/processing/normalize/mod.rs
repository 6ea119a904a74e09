use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use thiserror::Error;

use crate::app::ports::DiagnosticSink;
use crate::domain::{EventType, RawEventCandidate, SourceKind, WeatherEvent};

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("static date pattern compiles"));

/// The validation rule a raw candidate failed.
///
/// Rules are checked in declaration order; the first failure is reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("candidate is not an object")]
    NotAnObject,

    #[error("date is missing or empty")]
    MissingDate,

    #[error("date '{0}' is not in YYYY-MM-DD form")]
    MalformedDate(String),

    #[error("date '{0}' is not a real calendar date")]
    InvalidCalendarDate(String),

    #[error("type is missing")]
    MissingType,

    #[error("type '{0}' is neither hail nor wind")]
    UnsupportedType(String),

    #[error("details are missing or blank")]
    MissingDetails,
}

impl RejectReason {
    /// Stable label used for metrics and structured logs.
    pub fn rule(&self) -> &'static str {
        match self {
            RejectReason::NotAnObject => "not_an_object",
            RejectReason::MissingDate => "missing_date",
            RejectReason::MalformedDate(_) => "malformed_date",
            RejectReason::InvalidCalendarDate(_) => "invalid_calendar_date",
            RejectReason::MissingType => "missing_type",
            RejectReason::UnsupportedType(_) => "unsupported_type",
            RejectReason::MissingDetails => "missing_details",
        }
    }
}

/// Validate one raw candidate and coerce it into a canonical event.
pub fn validate(candidate: &RawEventCandidate) -> Result<WeatherEvent, RejectReason> {
    let fields = candidate.as_object().ok_or(RejectReason::NotAnObject)?;

    let raw_date = fields
        .get("date")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or(RejectReason::MissingDate)?;
    if !ISO_DATE.is_match(raw_date) {
        return Err(RejectReason::MalformedDate(raw_date.to_string()));
    }
    let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
        .map_err(|_| RejectReason::InvalidCalendarDate(raw_date.to_string()))?;

    let raw_type = fields
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or(RejectReason::MissingType)?;
    let event_type = EventType::parse_normalized(raw_type)
        .ok_or_else(|| RejectReason::UnsupportedType(raw_type.to_string()))?;

    let details = fields
        .get("details")
        .and_then(|v| v.as_str())
        .unwrap_or_default();

    let optional = |key: &str| {
        fields
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Ok(WeatherEvent::new(date, event_type, details)?.with_source(optional("source"), optional("sourceUrl")))
}

/// Turns raw candidates into canonical events, dropping the malformed ones.
///
/// Malformed input is expected from generative upstreams, so a rejection is
/// reported to the diagnostic sink and never surfaces as an error.
#[derive(Clone)]
pub struct Normalizer {
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl Normalizer {
    pub fn new(diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self { diagnostics }
    }

    pub fn normalize(&self, source: SourceKind, candidate: &RawEventCandidate) -> Option<WeatherEvent> {
        match validate(candidate) {
            Ok(event) => Some(event),
            Err(reason) => {
                self.diagnostics.candidate_rejected(source, &reason, candidate);
                None
            }
        }
    }

    /// Normalize a whole source batch, preserving input order of survivors.
    pub fn normalize_all(&self, source: SourceKind, candidates: &[RawEventCandidate]) -> Vec<WeatherEvent> {
        candidates
            .iter()
            .filter_map(|candidate| self.normalize(source, candidate))
            .collect()
    }
}
