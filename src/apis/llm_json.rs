//! Recovering JSON from language-model replies
//!
//! Models asked for "JSON only" still wrap answers in markdown fences or add
//! a sentence before the object. These helpers dig out the payload.

use serde_json::Value;

use crate::domain::RawEventCandidate;
use crate::error::{PolicyWeatherError, Result};

/// Remove markdown code fences (with or without a `json` tag).
pub fn strip_code_fences(text: &str) -> String {
    text.trim().replace("```json", "").replace("```", "").trim().to_string()
}

/// Extract the outermost JSON object from a model reply.
pub fn extract_json_object(text: &str) -> Result<Value> {
    let cleaned = strip_code_fences(text);
    let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}')) else {
        return Err(PolicyWeatherError::InvalidResponse(
            "No valid JSON object found in response".to_string(),
        ));
    };
    if end < start {
        return Err(PolicyWeatherError::InvalidResponse(
            "No valid JSON object found in response".to_string(),
        ));
    }

    serde_json::from_str(&cleaned[start..=end])
        .map_err(|e| PolicyWeatherError::InvalidResponse(format!("Invalid JSON structure in response: {}", e)))
}

/// Parse a list of raw event candidates.
///
/// Accepts either a bare JSON array or an object with an `events` array,
/// optionally fenced. Anything else is an invalid response.
pub fn parse_candidate_list(text: &str) -> Result<Vec<RawEventCandidate>> {
    let cleaned = strip_code_fences(text);
    if cleaned.starts_with('[') {
        let parsed: Value = serde_json::from_str(&cleaned)?;
        if let Value::Array(items) = parsed {
            return Ok(items);
        }
    }

    match extract_json_object(&cleaned)? {
        Value::Object(mut map) => match map.remove("events") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(PolicyWeatherError::InvalidResponse(
                "Response has no events array".to_string(),
            )),
        },
        _ => Err(PolicyWeatherError::InvalidResponse(
            "Response is not a JSON object".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extracts_fenced_object() {
        let reply = "```json\n{\"coverageA\": \"$350,000\"}\n```";
        assert_eq!(extract_json_object(reply).unwrap(), json!({"coverageA": "$350,000"}));
    }

    #[test]
    fn test_extracts_object_with_surrounding_prose() {
        let reply = "Here is the data you asked for:\n{\"deductible\": \"$1,000\", \"windstormDeductible\": \"2%\"}\nLet me know!";
        assert_eq!(
            extract_json_object(reply).unwrap(),
            json!({"deductible": "$1,000", "windstormDeductible": "2%"})
        );
    }

    #[test]
    fn test_reply_without_object_is_rejected() {
        assert!(matches!(
            extract_json_object("I could not read the document."),
            Err(PolicyWeatherError::InvalidResponse(_))
        ));
        assert!(matches!(
            extract_json_object("} backwards {"),
            Err(PolicyWeatherError::InvalidResponse(_))
        ));
        assert!(matches!(
            extract_json_object("{\"a\": }"),
            Err(PolicyWeatherError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_candidate_list_from_events_object() {
        let reply = "```json\n{\"events\": [{\"date\": \"2024-04-09\", \"type\": \"hail\"}]}\n```";
        let items = parse_candidate_list(reply).unwrap();
        assert_eq!(items, vec![json!({"date": "2024-04-09", "type": "hail"})]);
    }

    #[test]
    fn test_candidate_list_from_bare_array() {
        let items = parse_candidate_list("[{\"date\": \"2024-04-09\"}, 3]").unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_candidate_list_requires_events_array() {
        assert!(parse_candidate_list("{\"events\": \"none\"}").is_err());
        assert!(parse_candidate_list("{\"results\": []}").is_err());
        assert_eq!(parse_candidate_list("{\"events\": []}").unwrap(), Vec::<Value>::new());
    }
}
