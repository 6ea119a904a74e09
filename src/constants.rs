/// Upstream endpoints, labels, and environment keys shared across the codebase

// Environment variables holding secrets
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const NOAA_API_KEY_ENV: &str = "NOAA_API_KEY";

// OpenAI
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

// NOAA endpoints
pub const NOAA_STORM_EVENTS_URL: &str = "https://www.ncdc.noaa.gov/stormevents/listevents.jsp";
pub const NOAA_CDO_DATA_URL: &str = "https://www.ncdc.noaa.gov/cdo-web/api/v2/data";

// Source labels attached to historical events
pub const STORM_EVENTS_SOURCE: &str = "NOAA Storm Events Database";
pub const STORM_EVENTS_SOURCE_URL: &str = "https://www.ncdc.noaa.gov/stormevents/";
pub const CDO_SOURCE: &str = "NOAA National Weather Service";
pub const CDO_SOURCE_URL: &str = "https://www.ncdc.noaa.gov/cdo-web/";

// CDO thresholds: precipitation (inches) treated as hail, wind speed (mph) treated as severe
pub const CDO_HAIL_PRECIP_THRESHOLD: f64 = 0.5;
pub const CDO_WIND_SPEED_THRESHOLD: f64 = 20.0;
