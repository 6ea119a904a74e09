use crate::app::ports::ExtractionKind;

pub const WEATHER_SEARCH_SYSTEM_PROMPT: &str = "You are a weather research assistant specializing in finding historical hail and windstorm events.
Your task is to search for and report any hail or severe wind events that occurred at or near the specified location during the given time period.
Focus specifically on:
1. Hail events of any size
2. Windstorms, including severe gusts and sustained high winds
3. Any property damage caused by these events
4. Specific locations and precise dates

Use your knowledge to find accurate information from reliable sources.
You must return events in the exact format specified.
For each event found:
- Include the specific date in YYYY-MM-DD format
- For hail events, include hail sizes when available
- For wind events, include wind speeds when available
- Include any reported damage
- Be specific about locations
- Type must be either 'hail' or 'wind'
- Include source URLs when available
You must respond with properly formatted JSON only.";

pub fn weather_search_user_prompt(location: &str, start_date: &str, end_date: &str) -> String {
    format!(
        r#"Search for any hail or severe wind events that occurred at or near {location} between {start_date} and {end_date}.
Focus on finding:
- Hail events (any size)
- Severe wind events (gusts or sustained winds)
- Reports of property damage
- Local news coverage of these events

You must return the results in this exact JSON format:
{{
  "events": [
    {{
      "date": "YYYY-MM-DD",
      "type": "hail",
      "details": "Detailed description including sizes and damage",
      "source": "Source name",
      "sourceUrl": "https://example.com/event"
    }}
  ]
}}
The type field must be either "hail" or "wind". The date must be in YYYY-MM-DD format.
If no events are found, return an empty events array."#
    )
}

const COVERAGES_PROMPT: &str = r#"Extract coverage amounts and dates from insurance policy declaration pages.
Return ONLY a JSON object with this structure:
{
  "coverageA": "$XXX,XXX",
  "coverageB": "$XX,XXX",
  "coverageC": "$XX,XXX",
  "coverageD": "$XX,XXX",
  "effectiveDate": "MM/DD/YYYY",
  "expirationDate": "MM/DD/YYYY",
  "location": "Full property address"
}"#;

const DEDUCTIBLES_PROMPT: &str = r#"Look for these specific deductibles:
1. The "All Other Perils" (AOP) deductible
2. The "Wind/Hail" or "Named Storm" deductible (fixed amount or percentage)

Return ONLY a JSON object with this structure:
{
  "deductible": "$X,XXX",
  "windstormDeductible": "$X,XXX or X%"
}"#;

pub fn extraction_system_prompt(kind: ExtractionKind) -> &'static str {
    match kind {
        ExtractionKind::Coverages => COVERAGES_PROMPT,
        ExtractionKind::Deductibles => DEDUCTIBLES_PROMPT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_prompt_names_location_and_period() {
        let prompt = weather_search_user_prompt("Dallas, TX", "04/01/2024", "04/01/2025");
        assert!(prompt.contains("at or near Dallas, TX between 04/01/2024 and 04/01/2025"));
        assert!(prompt.contains("\"events\": ["));
    }
}
