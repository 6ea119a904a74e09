use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use crate::app::ports::EventSource;
use crate::config::NoaaConfig;
use crate::constants::{
    CDO_HAIL_PRECIP_THRESHOLD, CDO_SOURCE, CDO_SOURCE_URL, CDO_WIND_SPEED_THRESHOLD, STORM_EVENTS_SOURCE,
    STORM_EVENTS_SOURCE_URL,
};
use crate::domain::RawEventCandidate;
use crate::error::{Result, SourceError};

static STATE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z]{2})\b").expect("static state pattern compiles"));

/// Street, city, and two-letter state pulled out of a free-text address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLocation {
    pub street: String,
    pub city: String,
    pub state: String,
}

/// Split an address like `"123 Main St, Dallas, TX 75201"` into parts.
///
/// The state is the first standalone two-capital-letter token. With at least
/// two comma-separated parts, the city is the second to last and the street
/// is the first; otherwise both are left empty.
pub fn parse_location(location: &str) -> ParsedLocation {
    let mut parsed = ParsedLocation::default();

    if let Some(caps) = STATE_CODE.captures(location) {
        parsed.state = caps[1].to_string();
    }

    let parts: Vec<&str> = location.split(',').map(str::trim).collect();
    if parts.len() >= 2 {
        if parsed.state.is_empty() {
            if let Some(caps) = STATE_CODE.captures(parts[parts.len() - 1]) {
                parsed.state = caps[1].to_string();
            }
        }
        parsed.city = parts[parts.len() - 2].to_string();
        parsed.street = parts[0].to_string();
    }

    debug!("Parsed location: {:?}", parsed);
    parsed
}

/// Parse a policy date as printed on declaration pages or entered by a user.
pub fn parse_policy_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let formats = ["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%Y/%m/%d", "%m/%d/%y"];
    for format in &formats {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }
    DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive())
}

/// Parse a Storm Events listing body into raw candidates.
///
/// The first line is a header. Remaining lines mentioning HAIL or WIND are
/// read as `date,eventType,magnitude,details...`.
pub fn parse_storm_events(body: &str, city: &str, state: &str) -> Vec<RawEventCandidate> {
    body.lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty() && (line.contains("HAIL") || line.contains("WIND")))
        .filter_map(|line| {
            let mut fields = line.split(',').map(str::trim);
            let raw_date = fields.next()?;
            let event_type = fields.next()?;
            let magnitude = fields.next().unwrap_or_default();
            let rest: Vec<&str> = fields.collect();

            let kind = if event_type.to_uppercase().contains("HAIL") { "hail" } else { "wind" };
            let magnitude = if magnitude.is_empty() {
                String::new()
            } else {
                format!("Magnitude: {}. ", magnitude)
            };
            let details = format!(
                "{} event in {}, {}. {}{}",
                event_type,
                city,
                state,
                magnitude,
                rest.join(" ")
            );

            // Unparseable dates pass through untouched; the normalizer rejects them.
            let date = parse_policy_date(raw_date)
                .or_else(|| NaiveDate::parse_from_str(raw_date, "%Y%m%d").ok())
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| raw_date.to_string());

            Some(json!({
                "date": date,
                "type": kind,
                "details": details.trim(),
                "source": STORM_EVENTS_SOURCE,
                "sourceUrl": STORM_EVENTS_SOURCE_URL,
            }))
        })
        .collect()
}

/// Parse a Climate Data Online `data` response into raw candidates.
///
/// Hail is a WT04 observation or heavy precipitation; wind is an average wind
/// speed above the severe threshold. Other observations are skipped.
pub fn parse_cdo_results(data: &Value, city: &str, state: &str) -> Vec<RawEventCandidate> {
    let Some(results) = data.get("results").and_then(Value::as_array) else {
        return Vec::new();
    };

    results
        .iter()
        .filter_map(|result| {
            let datatype = result.get("datatype").and_then(Value::as_str)?;
            let date = result.get("date").and_then(Value::as_str)?;
            let value = result.get("value").and_then(Value::as_f64).unwrap_or(0.0);

            let is_hail = datatype == "WT04" || (datatype == "PRCP" && value > CDO_HAIL_PRECIP_THRESHOLD);
            let is_wind = datatype == "AWND" && value > CDO_WIND_SPEED_THRESHOLD;
            if !is_hail && !is_wind {
                return None;
            }

            let details = if is_hail {
                format!("Hail recorded at {}, {}. Precipitation: {} inches", city, state, value)
            } else {
                format!("High winds recorded at {}, {}. Wind speed: {} mph", city, state, value)
            };

            Some(json!({
                "date": date.split('T').next().unwrap_or(date),
                "type": if is_hail { "hail" } else { "wind" },
                "details": details,
                "source": CDO_SOURCE,
                "sourceUrl": CDO_SOURCE_URL,
            }))
        })
        .collect()
}

/// Historical source backed by NOAA's Storm Events database, falling back to
/// the Climate Data Online web API when the listing is unavailable.
pub struct NoaaSource {
    client: reqwest::Client,
    config: NoaaConfig,
}

impl NoaaSource {
    pub fn new(config: NoaaConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }

    fn http_error(&self, err: reqwest::Error) -> SourceError {
        SourceError::from_http(err, self.config.timeout())
    }

    fn token(&self) -> &str {
        self.config.api_key.as_deref().unwrap_or_default()
    }

    async fn fetch_cdo(
        &self,
        location: &ParsedLocation,
        start: NaiveDate,
        end: NaiveDate,
    ) -> std::result::Result<Vec<RawEventCandidate>, SourceError> {
        let start = start.format("%Y-%m-%d").to_string();
        let end = end.format("%Y-%m-%d").to_string();
        let location_id = format!("CITY:US{}", location.state);

        let response = self
            .client
            .get(&self.config.cdo_url)
            .query(&[
                ("datasetid", "GHCND"),
                ("locationid", location_id.as_str()),
                ("startdate", start.as_str()),
                ("enddate", end.as_str()),
                ("datatypeid", "AWND,PRCP,WT03,WT04"),
                ("limit", "1000"),
            ])
            .header("token", self.token())
            .send()
            .await
            .map_err(|e| self.http_error(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("CDO API error: {}", status);
            return Err(SourceError::Status(status.as_u16()));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| SourceError::InvalidResponse(e.to_string()))?;
        Ok(parse_cdo_results(&data, &location.city, &location.state))
    }
}

#[async_trait]
impl EventSource for NoaaSource {
    fn name(&self) -> &'static str {
        "noaa"
    }

    #[instrument(skip(self), fields(source = "noaa"))]
    async fn search(
        &self,
        location: &str,
        start_date: &str,
        end_date: &str,
    ) -> std::result::Result<Vec<RawEventCandidate>, SourceError> {
        let (Some(start), Some(end)) = (parse_policy_date(start_date), parse_policy_date(end_date)) else {
            warn!("Could not parse policy period {} - {}", start_date, end_date);
            return Ok(Vec::new());
        };

        let parsed = parse_location(location);
        if parsed.city.is_empty() || parsed.state.is_empty() {
            warn!("Could not parse city and state from location: {}", location);
            return Ok(Vec::new());
        }

        if self.config.api_key.is_none() {
            debug!("NOAA API key not configured; requests are unauthenticated");
        }

        let begin = start.format("%Y%m%d").to_string();
        let finish = end.format("%Y%m%d").to_string();
        let storm_response = self
            .client
            .get(&self.config.storm_events_url)
            .query(&[
                ("beginDate", begin.as_str()),
                ("endDate", finish.as_str()),
                ("state", parsed.state.as_str()),
                ("eventType", "ALL"),
                ("county", parsed.city.as_str()),
            ])
            .header("token", self.token())
            .send()
            .await
            .map_err(|e| self.http_error(e))?;

        if !storm_response.status().is_success() {
            info!(
                "Storm Events API returned {}, trying CDO Web API",
                storm_response.status()
            );
            return self.fetch_cdo(&parsed, start, end).await;
        }

        let body = storm_response.text().await.map_err(|e| self.http_error(e))?;
        let events = parse_storm_events(&body, &parsed.city, &parsed.state);
        info!("Parsed {} Storm Events candidates", events.len());
        Ok(events)
    }
}
