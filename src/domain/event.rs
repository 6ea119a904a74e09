use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pipeline::processing::normalize::{self, RejectReason};

/// Raw event data as returned from an event source, before normalization.
///
/// Sources produce these from loosely structured upstream responses, so any
/// field may be missing or hold the wrong type.
pub type RawEventCandidate = serde_json::Value;

/// The two kinds of weather event the analyzer reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Hail,
    Wind,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Hail => "hail",
            EventType::Wind => "wind",
        }
    }

    /// Case-insensitive parse; anything other than `hail` or `wind` is rejected.
    pub fn parse_normalized(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "hail" => Some(EventType::Hail),
            "wind" => Some(EventType::Wind),
            _ => None,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A canonical weather event that has passed normalization.
///
/// Fields are private: an event can only be obtained through validation
/// (the normalizer, [`WeatherEvent::new`], or deserialization, which runs the
/// same rules) and is never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEventCandidate")]
pub struct WeatherEvent {
    date: NaiveDate,
    #[serde(rename = "type")]
    event_type: EventType,
    details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(rename = "sourceUrl", skip_serializing_if = "Option::is_none")]
    source_url: Option<String>,
}

impl WeatherEvent {
    pub fn new(
        date: NaiveDate,
        event_type: EventType,
        details: impl Into<String>,
    ) -> Result<Self, RejectReason> {
        let details = details.into();
        if details.trim().is_empty() {
            return Err(RejectReason::MissingDetails);
        }
        Ok(Self {
            date,
            event_type,
            details,
            source: None,
            source_url: None,
        })
    }

    /// Attach origin information. Empty strings are treated as absent.
    pub fn with_source(mut self, source: Option<String>, source_url: Option<String>) -> Self {
        self.source = source.filter(|s| !s.is_empty());
        self.source_url = source_url.filter(|s| !s.is_empty());
        self
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn details(&self) -> &str {
        &self.details
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    /// The `(date, type)` pair identifying the physical event.
    pub fn dedup_key(&self) -> (NaiveDate, EventType) {
        (self.date, self.event_type)
    }

    /// Render back into the loosely typed shape sources produce.
    pub fn to_candidate(&self) -> RawEventCandidate {
        let mut map = serde_json::Map::new();
        map.insert("date".into(), self.date.format("%Y-%m-%d").to_string().into());
        map.insert("type".into(), self.event_type.as_str().into());
        map.insert("details".into(), self.details.clone().into());
        if let Some(source) = &self.source {
            map.insert("source".into(), source.clone().into());
        }
        if let Some(url) = &self.source_url {
            map.insert("sourceUrl".into(), url.clone().into());
        }
        serde_json::Value::Object(map)
    }
}

impl TryFrom<RawEventCandidate> for WeatherEvent {
    type Error = RejectReason;

    fn try_from(candidate: RawEventCandidate) -> Result<Self, Self::Error> {
        normalize::validate(&candidate)
    }
}

/// Which upstream collaborator a batch of candidates came from.
///
/// Priority is not carried here; it comes from the argument slot a batch is
/// passed in to `Reconciler::reconcile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Historical,
    Search,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Historical => "historical",
            SourceKind::Search => "search",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
