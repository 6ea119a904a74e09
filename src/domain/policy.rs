use serde::{Deserialize, Serialize};

/// Placeholder shown for a policy field the extractor could not find.
pub const NOT_FOUND: &str = "Not found";

/// Coverage data read off a policy's declaration pages.
///
/// Every field is free text as printed on the document; nothing here is
/// validated beyond presence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDetails {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub coverage_a: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub coverage_b: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub coverage_c: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub coverage_d: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub deductible: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub windstorm_deductible: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl PolicyDetails {
    /// Build a weather search for this policy's location and period, if the
    /// document yielded all three.
    pub fn search_request(&self) -> Option<SearchRequest> {
        let present = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
        Some(SearchRequest {
            location: present(&self.location)?,
            effective_date: present(&self.effective_date)?,
            expiration_date: present(&self.expiration_date)?,
        })
    }

    /// Human-readable policy period, or the not-found placeholder.
    pub fn policy_period(&self) -> String {
        match (&self.effective_date, &self.expiration_date) {
            (Some(eff), Some(exp)) if !eff.is_empty() && !exp.is_empty() => format!("{} to {}", eff, exp),
            _ => NOT_FOUND.to_string(),
        }
    }

    /// Display value for an optional field.
    pub fn display(field: &Option<String>) -> &str {
        field.as_deref().filter(|s| !s.is_empty()).unwrap_or(NOT_FOUND)
    }
}

/// Accept strings, numbers, or null for free-text fields; model output is
/// not consistent about quoting dollar amounts.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Location and policy period handed to the event sources.
///
/// The reconciler treats these as opaque strings; only the sources interpret
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub location: String,
    pub effective_date: String,
    pub expiration_date: String,
}

impl SearchRequest {
    pub fn new(
        location: impl Into<String>,
        effective_date: impl Into<String>,
        expiration_date: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            effective_date: effective_date.into(),
            expiration_date: expiration_date.into(),
        }
    }

    /// Names of required parameters that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.location.trim().is_empty() {
            missing.push("location");
        }
        if self.effective_date.trim().is_empty() {
            missing.push("effectiveDate");
        }
        if self.expiration_date.trim().is_empty() {
            missing.push("expirationDate");
        }
        missing
    }
}
